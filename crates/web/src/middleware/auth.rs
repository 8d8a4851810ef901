//! Authentication extractors.
//!
//! Provides extractors for requiring a signed-in gateway session in route handlers.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::warn;

use crate::error::AppError;
use crate::models::{CurrentSession, session_keys};
use crate::services::session_router::{SessionCheck, check_session};
use crate::state::AppState;

/// Extractor that requires a signed-in session.
///
/// An expired access token is refreshed and the new tokens are written back
/// to the session. If nobody is signed in, or the refresh fails, the request
/// is redirected to the root page, which shows the sign-in form.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireSession(current): RequireSession,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", current.email)
/// }
/// ```
pub struct RequireSession(pub CurrentSession);

/// Error returned when a session is required but nobody is signed in.
pub enum AuthRejection {
    /// Back to the root page.
    RedirectToRoot,
    /// The session layer is missing.
    MissingSessionLayer,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToRoot => Redirect::to("/").into_response(),
            Self::MissingSessionLayer => {
                AppError::Internal("session layer not installed".to_string()).into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::MissingSessionLayer)?;

        let stored = stored_session(&session)
            .await
            .ok_or(AuthRejection::RedirectToRoot)?;

        match check_session(state.gateway(), stored).await {
            SessionCheck::Valid(current) => Ok(Self(current)),
            SessionCheck::Refreshed(current) => {
                if let Err(e) = set_current_session(&session, &current).await {
                    warn!(error = %e, "Failed to store refreshed session");
                }
                Ok(Self(current))
            }
            SessionCheck::Expired => {
                if let Err(e) = clear_current_session(&session).await {
                    warn!(error = %e, "Failed to clear expired session");
                }
                Err(AuthRejection::RedirectToRoot)
            }
        }
    }
}

/// Extractor that optionally gets the stored session, as-is.
///
/// Unlike `RequireSession`, this neither rejects nor refreshes. The root page
/// uses it and resolves the session itself.
pub struct OptionalSession(pub Option<CurrentSession>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = match parts.extensions.get::<Session>() {
            Some(session) => stored_session(session).await,
            None => None,
        };

        Ok(Self(current))
    }
}

async fn stored_session(session: &Session) -> Option<CurrentSession> {
    session
        .get::<CurrentSession>(session_keys::CURRENT_SESSION)
        .await
        .ok()
        .flatten()
}

/// Helper to store the signed-in session.
///
/// The session ID is cycled so a pre-sign-in cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_in_session(
    session: &Session,
    current: &CurrentSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    set_current_session(session, current).await
}

/// Helper to set the current session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_session(
    session: &Session,
    current: &CurrentSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_SESSION, current).await
}

/// Helper to clear the current session (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentSession>(session_keys::CURRENT_SESSION)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use sparepart_nexus_core::{Email, UserId};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::gateway::AccessToken;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn current() -> CurrentSession {
        CurrentSession {
            user_id: UserId::random(),
            email: Email::parse("seller@example.com").unwrap(),
            access_token: AccessToken::new("access".to_string()),
            refresh_token: AccessToken::new("refresh".to_string()),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_set_and_clear_session() {
        let session = session();
        let current = current();

        set_current_session(&session, &current).await.unwrap();
        assert_eq!(stored_session(&session).await, Some(current));

        clear_current_session(&session).await.unwrap();
        assert_eq!(stored_session(&session).await, None);
    }

    #[tokio::test]
    async fn test_sign_in_session_stores_current() {
        let session = session();
        let current = current();

        sign_in_session(&session, &current).await.unwrap();
        assert_eq!(stored_session(&session).await, Some(current));
    }
}
