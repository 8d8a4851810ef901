//! Supabase client over plain REST.
//!
//! GoTrue handles accounts and sessions (see [`auth`]); PostgREST serves the
//! `profiles` and `parts` tables. Every request carries the project's anon key
//! in the `apikey` header, and data requests add the user's bearer token.

mod auth;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use sparepart_nexus_core::{Email, Part, PartListing, Profile, SearchTerm, UserId};

use super::events::{AuthEventKind, AuthEvents, AuthSubscription};
use super::rows::{ListingRow, PartRow, decode_all, search_filter};
use super::{
    AccessToken, AuthSession, AuthUser, Gateway, GatewayError, NewPartRow, ProfileRow,
    SignUpOutcome,
};

/// PostgREST code for "single-row select matched zero rows".
const NO_ROWS_CODE: &str = "PGRST116";

/// Media type asking PostgREST for a single object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Columns selected for buyer search, with the seller's shop name embedded.
const LISTING_SELECT: &str = "*,profiles!parts_seller_id_fkey(shop_name)";

// =============================================================================
// SupabaseGateway
// =============================================================================

/// Gateway backed by a hosted Supabase project.
#[derive(Clone)]
pub struct SupabaseGateway {
    inner: Arc<SupabaseGatewayInner>,
}

struct SupabaseGatewayInner {
    client: reqwest::Client,
    /// Project origin without a trailing slash.
    base_url: String,
    events: AuthEvents,
}

impl SupabaseGateway {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the anon key is not a valid header
    /// value, or [`GatewayError::Http`] if the HTTP client fails to build.
    pub fn new(config: &crate::config::SupabaseConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| GatewayError::Config(format!("Invalid anon key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("sparepart-nexus/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseGatewayInner {
                client,
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
                events: AuthEvents::new(),
            }),
        })
    }

    fn rest_url(&self, path_and_query: &str) -> String {
        format!("{}/rest/v1/{path_and_query}", self.inner.base_url)
    }

    fn auth_url(&self, path_and_query: &str) -> String {
        format!("{}/auth/v1/{path_and_query}", self.inner.base_url)
    }
}

#[async_trait]
impl Gateway for SupabaseGateway {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        let session = self.password_grant(email, password).await?;
        self.inner
            .events
            .publish(AuthEventKind::SignedIn, Some(session.user.id));
        Ok(session)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, GatewayError> {
        let outcome = self.create_account(email, password).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.inner
                .events
                .publish(AuthEventKind::SignedUp, Some(session.user.id));
        }
        Ok(outcome)
    }

    #[instrument(skip_all)]
    async fn refresh_session(
        &self,
        refresh_token: &AccessToken,
    ) -> Result<AuthSession, GatewayError> {
        let session = self.refresh_grant(refresh_token).await?;
        self.inner
            .events
            .publish(AuthEventKind::TokenRefreshed, Some(session.user.id));
        Ok(session)
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, token: &AccessToken) -> Result<(), GatewayError> {
        let result = self.revoke(token).await;
        // The local session is gone either way.
        self.inner.events.publish(AuthEventKind::SignedOut, None);
        result
    }

    #[instrument(skip_all)]
    async fn current_user(&self, token: &AccessToken) -> Result<Option<AuthUser>, GatewayError> {
        self.fetch_user(token).await
    }

    fn subscribe(&self) -> AuthSubscription {
        self.inner.events.subscribe()
    }

    #[instrument(skip(self, token, profile), fields(user_id = %profile.id, role = %profile.role))]
    async fn upsert_profile(
        &self,
        token: &AccessToken,
        profile: &ProfileRow,
    ) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .post(self.rest_url("profiles"))
            .bearer_auth(token.as_str())
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(profile)
            .send()
            .await?;

        check(response).await?;
        debug!("Profile upserted");
        Ok(())
    }

    #[instrument(skip(self, token), fields(user_id = %id))]
    async fn fetch_profile(
        &self,
        token: &AccessToken,
        id: UserId,
    ) -> Result<Profile, GatewayError> {
        let url = self.rest_url(&format!(
            "profiles?select=id,role,shop_name,company_name&id=eq.{id}"
        ));
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(token.as_str())
            .header("Accept", SINGLE_OBJECT)
            .send()
            .await?;

        let row: ProfileRow = read_json(response).await?;
        row.try_into()
    }

    #[instrument(skip(self, token, part), fields(seller_id = %part.seller_id))]
    async fn insert_part(&self, token: &AccessToken, part: &NewPartRow) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .post(self.rest_url("parts"))
            .bearer_auth(token.as_str())
            .header("Prefer", "return=minimal")
            .json(part)
            .send()
            .await?;

        check(response).await?;
        debug!("Part inserted");
        Ok(())
    }

    #[instrument(skip(self, token), fields(seller_id = %seller_id))]
    async fn list_parts_by_seller(
        &self,
        token: &AccessToken,
        seller_id: UserId,
    ) -> Result<Vec<Part>, GatewayError> {
        let url = self.rest_url(&format!(
            "parts?select=*&seller_id=eq.{seller_id}&order=created_at.desc"
        ));
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let rows: Vec<PartRow> = read_json(response).await?;
        let parts = decode_all(rows)?;
        debug!(count = parts.len(), "Listed seller parts");
        Ok(parts)
    }

    #[instrument(skip(self, token), fields(term = term.map(SearchTerm::as_str)))]
    async fn search_parts(
        &self,
        token: &AccessToken,
        term: Option<&SearchTerm>,
    ) -> Result<Vec<PartListing>, GatewayError> {
        let response = self
            .inner
            .client
            .get(self.rest_url(&search_query(term)))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let rows: Vec<ListingRow> = read_json(response).await?;
        let listings = decode_all(rows)?;
        debug!(count = listings.len(), "Searched parts");
        Ok(listings)
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        let response = self.inner.client.get(self.auth_url("health")).send().await?;
        check(response).await?;
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Path and query for the buyer search.
fn search_query(term: Option<&SearchTerm>) -> String {
    let mut query = format!(
        "parts?select={}&quantity=gt.0&order=created_at.desc",
        urlencoding::encode(LISTING_SELECT)
    );
    if let Some(term) = term {
        query.push_str("&or=");
        query.push_str(&urlencoding::encode(&search_filter(term.as_str())));
    }
    query
}

/// Pass a successful response through; turn anything else into an error.
async fn check(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status, &body))
}

/// Check the status, then decode the JSON body.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let body = check(response).await?.text().await?;
    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Build an error from a GoTrue or PostgREST error body.
///
/// GoTrue uses `msg` / `error_description` and a string `error_code`;
/// PostgREST uses `message` and a string `code`.
fn error_from_body(status: StatusCode, body: &str) -> GatewayError {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    let code = text("error_code")
        .or_else(|| text("code"))
        .or_else(|| text("error"));
    if code.as_deref() == Some(NO_ROWS_CODE) {
        return GatewayError::NotFound;
    }

    let message = text("message")
        .or_else(|| text("msg"))
        .or_else(|| text("error_description"))
        .or_else(|| text("error"))
        .or_else(|| {
            let body = body.trim();
            (!body.is_empty() && value.is_null()).then(|| body.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    GatewayError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}
