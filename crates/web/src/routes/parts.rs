//! Add-part form handler.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use sparepart_nexus_core::{PartDraft, RouteState};

use crate::error::add_breadcrumb;
use crate::middleware::RequireSession;
use crate::models::Notice;
use crate::routes::home::retailer_page;
use crate::services::inventory::{AddPartError, add_part};
use crate::services::session_router::resolve;
use crate::state::AppState;

/// Insert the part, then show the refreshed list with a success notice.
///
/// On failure the dashboard is rendered directly so the form keeps what
/// was typed. Only retailers reach the insert.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireSession(current): RequireSession,
    Form(draft): Form<PartDraft>,
) -> Response {
    let resolution = resolve(state.gateway(), Some(current.clone())).await;
    let RouteState::Retailer { shop_name } = resolution.state else {
        return Redirect::to("/").into_response();
    };

    match add_part(state.gateway(), &current, &draft).await {
        Ok(()) => {
            add_breadcrumb(
                "parts",
                "Listed a part",
                Some(&[("part_name", draft.part_name.trim())]),
            );
            Notice::success("Part added successfully!")
                .flash(&session)
                .await;
            Redirect::to("/").into_response()
        }
        Err(e) => {
            if let AddPartError::Gateway(ref err) = e {
                tracing::warn!(error = %err, "Part insert failed");
            }
            retailer_page(
                state.gateway(),
                &current,
                shop_name,
                draft,
                vec![Notice::error(e.to_string())],
            )
            .await
            .into_response()
        }
    }
}
