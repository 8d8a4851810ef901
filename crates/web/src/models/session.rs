//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use sparepart_nexus_core::{Email, UserId};

use crate::gateway::{AccessToken, AuthSession};

/// Refresh this long before the gateway's stated expiry.
const EXPIRY_LEEWAY_SECONDS: i64 = 30;

/// Session-stored sign-in.
///
/// Holds the gateway tokens so data calls run as the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentSession {
    pub user_id: UserId,
    pub email: Email,
    pub access_token: AccessToken,
    pub refresh_token: AccessToken,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CurrentSession {
    /// Whether the access token is expired (or about to be) at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| at - Duration::seconds(EXPIRY_LEEWAY_SECONDS) <= now)
    }
}

impl From<&AuthSession> for CurrentSession {
    fn from(session: &AuthSession) -> Self {
        Self {
            user_id: session.user.id,
            email: session.user.email.clone(),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at,
        }
    }
}

/// Session keys.
pub mod session_keys {
    /// The signed-in user and their gateway tokens.
    pub const CURRENT_SESSION: &str = "current_session";

    /// One-shot notice shown on the next page render.
    pub const NOTICE: &str = "notice";
}
