//! Authentication route handlers.
//!
//! Sign-in, sign-up and sign-out against the gateway's password auth. The
//! forms live on the root page; every handler redirects back to it.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;

use sparepart_nexus_core::Email;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::gateway::{AuthSession, SignUpOutcome};
use crate::middleware::{OptionalSession, clear_current_session, sign_in_session};
use crate::models::{CurrentSession, Notice};
use crate::state::AppState;

/// Sign-in and sign-up form data.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

/// Handle sign-in form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        Notice::error("Please enter a valid email address.")
            .flash(&session)
            .await;
        return Redirect::to("/").into_response();
    };
    let password = SecretString::from(form.password);

    match state.gateway().sign_in(&email, &password).await {
        Ok(auth) => start_session(&session, &auth).await,
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in failed");
            Notice::error(e.to_string()).flash(&session).await;
            Redirect::to("/").into_response()
        }
    }
}

/// Handle sign-up form submission.
///
/// When the project requires email confirmation, no session is created and
/// the user is told to check their inbox.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        Notice::error("Please enter a valid email address.")
            .flash(&session)
            .await;
        return Redirect::to("/").into_response();
    };
    let password = SecretString::from(form.password);

    match state.gateway().sign_up(&email, &password).await {
        Ok(SignUpOutcome::SignedIn(auth)) => start_session(&session, &auth).await,
        Ok(SignUpOutcome::ConfirmationRequired { email }) => {
            tracing::info!("Sign-up awaiting email confirmation");
            Notice::info(format!(
                "Check {} for a confirmation link, then sign in.",
                email.as_str()
            ))
            .flash(&session)
            .await;
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-up failed");
            Notice::error(e.to_string()).flash(&session).await;
            Redirect::to("/").into_response()
        }
    }
}

/// Handle sign-out.
///
/// The local session is dropped even if the gateway call fails.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalSession(current): OptionalSession,
) -> Response {
    if let Some(current) = current {
        if let Err(e) = state.gateway().sign_out(&current.access_token).await {
            tracing::warn!(error = %e, "Sign-out failed at the gateway");
            Notice::error("Error signing out").flash(&session).await;
        }
    }

    if let Err(e) = clear_current_session(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}

async fn start_session(session: &Session, auth: &AuthSession) -> Response {
    let current = CurrentSession::from(auth);

    if let Err(e) = sign_in_session(session, &current).await {
        tracing::error!("Failed to set session: {}", e);
        Notice::error("Could not start your session. Please try again.")
            .flash(session)
            .await;
        return Redirect::to("/").into_response();
    }

    set_sentry_user(&current.user_id, Some(current.email.as_str()));
    tracing::info!(user_id = %current.user_id, "Signed in");
    Redirect::to("/").into_response()
}
