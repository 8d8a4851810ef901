//! Hosted backend gateway: authentication plus the `profiles` and `parts` tables.
//!
//! # Architecture
//!
//! - The gateway is the source of truth. There is no local database and no cache.
//! - Every data call carries the signed-in user's access token so the
//!   backend's row-level security decides what the user may read and write.
//! - Rows are decoded into core domain types here, at the boundary. A row that
//!   does not fit the domain is a [`GatewayError::Decode`], not a panic.
//!
//! # Implementations
//!
//! - [`SupabaseGateway`] - reqwest client for GoTrue (`/auth/v1`) and
//!   PostgREST (`/rest/v1`)
//! - [`InMemoryGateway`] - process-local store used by tests and demo mode
//!
//! # Example
//!
//! ```rust,ignore
//! let gateway: Arc<dyn Gateway> = Arc::new(SupabaseGateway::new(&supabase_config)?);
//!
//! let session = gateway.sign_in(&email, &password).await?;
//! let parts = gateway
//!     .list_parts_by_seller(&session.access_token, session.user.id)
//!     .await?;
//! ```

mod events;
mod memory;
mod rows;
mod supabase;

pub use events::{AuthEvent, AuthEventKind, AuthEvents, AuthSubscription};
pub use memory::{GatewayOperation, InMemoryGateway};
pub use rows::{NewPartRow, ProfileRow};
pub use supabase::SupabaseGateway;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sparepart_nexus_core::{Email, Part, PartListing, Profile, SearchTerm, UserId};

/// Errors returned by a [`Gateway`].
///
/// `Display` is the gateway's own message, suitable for showing to the user
/// after a prefix such as "Error adding part: ".
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with an error body.
    #[error("{message}")]
    Api {
        status: u16,
        /// Machine-readable code (`PGRST116`, `42501`, `invalid_credentials`, ...).
        code: Option<String>,
        message: String,
    },

    /// A single-row select matched no rows.
    #[error("Record not found")]
    NotFound,

    /// The response did not match the expected shape.
    #[error("Unexpected response from gateway: {0}")]
    Decode(String),

    /// The client could not be built from configuration.
    #[error("Invalid gateway configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether this is the "no such row" signal.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// HTTP status, when the gateway sent one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::NotFound | Self::Decode(_) | Self::Config(_) => None,
        }
    }
}

/// Bearer token issued by the gateway.
///
/// `Debug` is redacted so tokens never reach logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// The authenticated user as the gateway reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Email,
}

/// A signed-in session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: AccessToken,
    /// Exchanged for a new access token once this one expires.
    pub refresh_token: AccessToken,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of a sign-up request.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The account is usable immediately.
    SignedIn(AuthSession),
    /// The project requires email confirmation before the first sign-in.
    ConfirmationRequired { email: Email },
}

/// Hosted auth and data backend.
///
/// Object-safe so the app can hold an `Arc<dyn Gateway>` and swap the
/// Supabase client for the in-memory store in tests.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Exchange email and password for a session.
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError>;

    /// Create an account.
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, GatewayError>;

    /// Exchange a refresh token for a fresh session.
    async fn refresh_session(&self, refresh_token: &AccessToken)
    -> Result<AuthSession, GatewayError>;

    /// Revoke the session behind `token`.
    async fn sign_out(&self, token: &AccessToken) -> Result<(), GatewayError>;

    /// The user behind `token`, or `None` if the token is no longer valid.
    async fn current_user(&self, token: &AccessToken) -> Result<Option<AuthUser>, GatewayError>;

    /// Subscribe to sign-in, sign-out, and refresh notifications.
    fn subscribe(&self) -> AuthSubscription;

    /// Insert or replace the profile row keyed by `profile.id`.
    async fn upsert_profile(
        &self,
        token: &AccessToken,
        profile: &ProfileRow,
    ) -> Result<(), GatewayError>;

    /// Fetch one profile. [`GatewayError::NotFound`] when there is no row.
    async fn fetch_profile(&self, token: &AccessToken, id: UserId)
    -> Result<Profile, GatewayError>;

    /// Insert one part row.
    async fn insert_part(&self, token: &AccessToken, part: &NewPartRow)
    -> Result<(), GatewayError>;

    /// Parts listed by `seller_id`, newest first.
    async fn list_parts_by_seller(
        &self,
        token: &AccessToken,
        seller_id: UserId,
    ) -> Result<Vec<Part>, GatewayError>;

    /// In-stock parts from every seller, newest first, optionally filtered.
    async fn search_parts(
        &self,
        token: &AccessToken,
        term: Option<&SearchTerm>,
    ) -> Result<Vec<PartListing>, GatewayError>;

    /// Cheap reachability check for the readiness probe.
    async fn ping(&self) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_gateway_message() {
        let err = GatewayError::Api {
            status: 403,
            code: Some("42501".to_string()),
            message: "new row violates row-level security policy".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "new row violates row-level security policy"
        );
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_not_found() {
        assert!(GatewayError::NotFound.is_not_found());
        assert!(!GatewayError::Decode("bad".to_string()).is_not_found());
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("eyJhbGciOiJIUzI1NiJ9.payload.sig".to_string());
        let debug = format!("{token:?}");
        assert!(!debug.contains("eyJ"));
        assert_eq!(token.as_str(), "eyJhbGciOiJIUzI1NiJ9.payload.sig");
    }
}
