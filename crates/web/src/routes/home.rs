//! Root page: renders whichever view the session routes to.
//!
//! The other form handlers re-render these templates when a submission needs
//! to be shown back with its values.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use sparepart_nexus_core::{Part, PartDraft, PartListing, Role, RouteState, SearchTerm};

use crate::error::clear_sentry_user;
use crate::filters;
use crate::gateway::Gateway;
use crate::middleware::{OptionalSession, clear_current_session, set_current_session};
use crate::models::{CurrentSession, Notice};
use crate::services::catalog;
use crate::services::inventory;
use crate::services::session_router::{Resolution, SessionChange, resolve};
use crate::state::AppState;

const MISSING_PART_NUMBER: &str = "N/A";
const UNKNOWN_SELLER: &str = "Unknown";
const UNCHOSEN_NAME_LABEL: &str = "Shop or Company Name";

// =============================================================================
// View Models
// =============================================================================

/// A part in the seller's own list.
#[derive(Debug, Clone)]
pub struct PartView {
    pub part_name: String,
    pub part_number: String,
    pub vehicle_model: String,
    pub quantity: u32,
    pub price: String,
}

impl From<Part> for PartView {
    fn from(part: Part) -> Self {
        Self {
            part_name: part.part_name,
            part_number: part
                .part_number
                .unwrap_or_else(|| MISSING_PART_NUMBER.to_string()),
            vehicle_model: part.vehicle_model,
            quantity: part.quantity,
            price: part.price.display(),
        }
    }
}

/// A part in the buyer's catalog, with the seller's shop name.
#[derive(Debug, Clone)]
pub struct ListingView {
    pub part: PartView,
    pub seller: String,
}

impl From<PartListing> for ListingView {
    fn from(listing: PartListing) -> Self {
        Self {
            seller: listing
                .seller_shop_name
                .unwrap_or_else(|| UNKNOWN_SELLER.to_string()),
            part: listing.part.into(),
        }
    }
}

/// A choice on the role picker.
#[derive(Debug, Clone)]
pub struct RoleOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in / sign-up form.
#[derive(Template, WebTemplate)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub nav_email: Option<String>,
    pub notices: Vec<Notice>,
}

/// Profile setup form.
#[derive(Template, WebTemplate)]
#[template(path = "profile_setup.html")]
pub struct ProfileSetupTemplate {
    pub nav_email: Option<String>,
    pub notices: Vec<Notice>,
    pub roles: Vec<RoleOption>,
    pub name_label: &'static str,
    pub display_name: String,
    pub error: Option<String>,
}

impl ProfileSetupTemplate {
    /// The form, pre-filled with `role` and `display_name`.
    ///
    /// Nothing is checked unless `role` names a known role.
    #[must_use]
    pub fn new(email: &str, role: &str, display_name: &str) -> Self {
        let selected = role.parse::<Role>().ok();
        Self {
            nav_email: Some(email.to_string()),
            notices: Vec::new(),
            roles: Role::ALL
                .iter()
                .map(|r| RoleOption {
                    value: r.as_str(),
                    label: r.label(),
                    selected: selected == Some(*r),
                })
                .collect(),
            name_label: selected.as_ref().map_or(UNCHOSEN_NAME_LABEL, Role::name_label),
            display_name: display_name.to_string(),
            error: None,
        }
    }
}

/// Retailer dashboard: add-part form and own listings.
#[derive(Template, WebTemplate)]
#[template(path = "retailer.html")]
pub struct RetailerTemplate {
    pub nav_email: Option<String>,
    pub notices: Vec<Notice>,
    pub shop_name: String,
    pub form: PartDraft,
    pub parts: Vec<PartView>,
}

/// Manufacturer dashboard: search and catalog.
#[derive(Template, WebTemplate)]
#[template(path = "manufacturer.html")]
pub struct ManufacturerTemplate {
    pub nav_email: Option<String>,
    pub notices: Vec<Notice>,
    pub company_name: String,
    pub query: String,
    pub listings: Vec<ListingView>,
}

/// Profile with a role this front end cannot serve.
#[derive(Template, WebTemplate)]
#[template(path = "unknown_role.html")]
pub struct UnknownRoleTemplate {
    pub nav_email: Option<String>,
    pub notices: Vec<Notice>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Query parameters for the root page.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    /// Manufacturer search term.
    #[serde(default)]
    pub q: String,
}

/// Display the root page.
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalSession(stored): OptionalSession,
    Query(query): Query<HomeQuery>,
) -> Response {
    let resolution = resolve(state.gateway(), stored).await;
    apply_session_change(&session, &resolution.change).await;
    let notices = Notice::take(&session).await.into_iter().collect();

    render(state.gateway(), resolution, notices, &query.q).await
}

/// Write a refreshed session back, or drop one the gateway no longer accepts.
async fn apply_session_change(session: &Session, change: &SessionChange) {
    match change {
        SessionChange::Unchanged => {}
        SessionChange::Replaced(current) => {
            if let Err(e) = set_current_session(session, current).await {
                warn!(error = %e, "Failed to store refreshed session");
            }
        }
        SessionChange::Cleared => {
            info!("Stored session no longer valid; signing out locally");
            if let Err(e) = clear_current_session(session).await {
                warn!(error = %e, "Failed to clear session");
            }
            clear_sentry_user();
        }
    }
}

async fn render(
    gateway: &dyn Gateway,
    resolution: Resolution,
    notices: Vec<Notice>,
    query: &str,
) -> Response {
    // `resolve` always settles, so a signed-out visitor is the only other case.
    let Some(current) = resolution.session else {
        return AuthTemplate {
            nav_email: None,
            notices,
        }
        .into_response();
    };

    match resolution.state {
        RouteState::Loading | RouteState::Unauthenticated => AuthTemplate {
            nav_email: None,
            notices,
        }
        .into_response(),
        RouteState::NoProfile => {
            let mut page = ProfileSetupTemplate::new(current.email.as_str(), "", "");
            page.notices = notices;
            page.into_response()
        }
        RouteState::Retailer { shop_name } => {
            retailer_page(gateway, &current, shop_name, PartDraft::default(), notices)
                .await
                .into_response()
        }
        RouteState::Manufacturer { company_name } => {
            manufacturer_page(gateway, &current, company_name, query, notices)
                .await
                .into_response()
        }
        RouteState::UnknownRole { role } => {
            warn!(user_id = %current.user_id, role = %role, "Profile has an unknown role");
            UnknownRoleTemplate {
                nav_email: Some(current.email.as_str().to_string()),
                notices,
            }
            .into_response()
        }
    }
}

/// Build the retailer dashboard, listing the seller's parts.
///
/// A listing failure shows an empty list and adds an error notice after any
/// that are already pending.
pub async fn retailer_page(
    gateway: &dyn Gateway,
    current: &CurrentSession,
    shop_name: String,
    form: PartDraft,
    mut notices: Vec<Notice>,
) -> RetailerTemplate {
    let parts = match inventory::list_own_parts(gateway, current).await {
        Ok(parts) => parts.into_iter().map(PartView::from).collect(),
        Err(e) => {
            warn!(error = %e, "Error fetching own parts");
            notices.push(Notice::error(format!("Error fetching parts: {e}")));
            Vec::new()
        }
    };

    RetailerTemplate {
        nav_email: Some(current.email.as_str().to_string()),
        notices,
        shop_name,
        form,
        parts,
    }
}

/// Build the manufacturer dashboard for `query`.
pub async fn manufacturer_page(
    gateway: &dyn Gateway,
    current: &CurrentSession,
    company_name: String,
    query: &str,
    mut notices: Vec<Notice>,
) -> ManufacturerTemplate {
    let term = SearchTerm::new(query);
    let listings = match catalog::search_parts(gateway, current, term.as_ref()).await {
        Ok(listings) => listings.into_iter().map(ListingView::from).collect(),
        Err(e) => {
            warn!(error = %e.0, "Catalog search failed");
            notices.push(Notice::error(e.to_string()));
            Vec::new()
        }
    };

    ManufacturerTemplate {
        nav_email: Some(current.email.as_str().to_string()),
        notices,
        company_name,
        query: term.map(|t| t.as_str().to_string()).unwrap_or_default(),
        listings,
    }
}
