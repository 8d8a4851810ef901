//! Profile setup form handler.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use sparepart_nexus_core::RouteState;

use crate::middleware::RequireSession;
use crate::routes::home::ProfileSetupTemplate;
use crate::services::profile::{ProfileSetupError, submit_profile};
use crate::services::session_router::route_after_setup;
use crate::state::AppState;

/// Profile setup form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub display_name: String,
}

/// Save the profile and look it up again, then go back to the root page,
/// which routes to the matching dashboard.
///
/// On failure the form is shown again with its values and the message.
pub async fn submit(
    State(state): State<AppState>,
    RequireSession(current): RequireSession,
    Form(form): Form<ProfileForm>,
) -> Response {
    match submit_profile(state.gateway(), &current, &form.role, &form.display_name).await {
        Ok(profile) => {
            let view = route_after_setup(state.gateway(), &current).await;
            if view == RouteState::NoProfile {
                // Saved but not readable back; the root page falls back to setup.
                tracing::warn!(user_id = %profile.id, "Saved profile did not load");
            } else {
                tracing::info!(user_id = %profile.id, view = ?view, "Profile setup complete");
            }
            Redirect::to("/").into_response()
        }
        Err(e) => {
            if let ProfileSetupError::Gateway(ref err) = e {
                tracing::warn!(error = %err, "Profile upsert failed");
            }
            let mut page =
                ProfileSetupTemplate::new(current.email.as_str(), &form.role, &form.display_name);
            page.error = Some(e.to_string());
            page.into_response()
        }
    }
}
