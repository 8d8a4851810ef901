//! Process-local gateway.
//!
//! Behaves like the hosted backend closely enough to drive the whole app:
//! password accounts, opaque bearer tokens, the `profiles` and `parts`
//! tables, and the ownership rules row-level security enforces (a user may
//! only write their own profile and list parts as themselves). Used by the
//! integration tests and by `SPAREPART_GATEWAY=memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use uuid::Uuid;

use sparepart_nexus_core::{Email, Part, PartId, PartListing, Profile, SearchTerm, UserId};

use super::events::{AuthEventKind, AuthEvents, AuthSubscription};
use super::{
    AccessToken, AuthSession, AuthUser, Gateway, GatewayError, NewPartRow, ProfileRow,
    SignUpOutcome,
};

const MIN_PASSWORD_LENGTH: usize = 6;
const TOKEN_LIFETIME_MINUTES: i64 = 60;

/// Calls that can be told to fail, for exercising error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    SignOut,
    UpsertProfile,
    FetchProfile,
    InsertPart,
    ListParts,
    SearchParts,
    Ping,
}

#[derive(Debug)]
struct Account {
    user: AuthUser,
    password: SecretString,
    confirmed: bool,
}

/// A refresh token and the access token it was issued with.
#[derive(Debug)]
struct RefreshGrant {
    user_id: UserId,
    access_token: String,
}

#[derive(Debug, Default)]
struct Store {
    accounts: HashMap<Email, Account>,
    access_tokens: HashMap<String, UserId>,
    refresh_tokens: HashMap<String, RefreshGrant>,
    profiles: HashMap<UserId, ProfileRow>,
    /// Insertion order, oldest first.
    parts: Vec<Part>,
    failures: HashMap<GatewayOperation, String>,
}

impl Store {
    fn user_for(&self, token: &AccessToken) -> Result<UserId, GatewayError> {
        self.access_tokens
            .get(token.as_str())
            .copied()
            .ok_or_else(|| GatewayError::Api {
                status: 401,
                code: Some("PGRST301".to_string()),
                message: "JWT expired".to_string(),
            })
    }

    fn injected(&self, operation: GatewayOperation) -> Result<(), GatewayError> {
        match self.failures.get(&operation) {
            Some(message) => Err(GatewayError::Api {
                status: 503,
                code: None,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn account(&self, id: UserId) -> Option<&Account> {
        self.accounts.values().find(|account| account.user.id == id)
    }

    fn issue_session(&mut self, user: AuthUser) -> AuthSession {
        let access = format!("mem-access-{}", Uuid::new_v4());
        let refresh = format!("mem-refresh-{}", Uuid::new_v4());
        self.access_tokens.insert(access.clone(), user.id);
        self.refresh_tokens.insert(
            refresh.clone(),
            RefreshGrant {
                user_id: user.id,
                access_token: access.clone(),
            },
        );

        AuthSession {
            user,
            access_token: AccessToken::new(access),
            refresh_token: AccessToken::new(refresh),
            expires_at: Some(Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES)),
        }
    }
}

fn row_level_security(table: &str) -> GatewayError {
    GatewayError::Api {
        status: 403,
        code: Some("42501".to_string()),
        message: format!("new row violates row-level security policy for table \"{table}\""),
    }
}

fn invalid_credentials() -> GatewayError {
    GatewayError::Api {
        status: 400,
        code: Some("invalid_credentials".to_string()),
        message: "Invalid login credentials".to_string(),
    }
}

/// In-memory [`Gateway`].
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    store: Mutex<Store>,
    events: AuthEvents,
    require_confirmation: bool,
}

impl InMemoryGateway {
    /// An empty gateway where new accounts can sign in immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty gateway where sign-up leaves the account unconfirmed.
    #[must_use]
    pub fn requiring_confirmation() -> Self {
        Self {
            require_confirmation: true,
            ..Self::default()
        }
    }

    /// Mark an account as confirmed, as following the emailed link would.
    pub async fn confirm(&self, email: &Email) {
        if let Some(account) = self.store.lock().await.accounts.get_mut(email) {
            account.confirmed = true;
        }
    }

    /// Make `operation` fail with `message` until [`Self::recover`] is called.
    pub async fn fail_on(&self, operation: GatewayOperation, message: impl Into<String>) {
        self.store
            .lock()
            .await
            .failures
            .insert(operation, message.into());
    }

    /// Clear an injected failure.
    pub async fn recover(&self, operation: GatewayOperation) {
        self.store.lock().await.failures.remove(&operation);
    }

    /// Stored profile row, bypassing access checks.
    pub async fn profile_row(&self, id: UserId) -> Option<ProfileRow> {
        self.store.lock().await.profiles.get(&id).cloned()
    }

    /// Number of stored profile rows.
    pub async fn profile_count(&self) -> usize {
        self.store.lock().await.profiles.len()
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        let mut store = self.store.lock().await;
        let account = store.accounts.get(email).ok_or_else(invalid_credentials)?;
        if account.password.expose_secret() != password.expose_secret() {
            return Err(invalid_credentials());
        }
        if !account.confirmed {
            return Err(GatewayError::Api {
                status: 400,
                code: Some("email_not_confirmed".to_string()),
                message: "Email not confirmed".to_string(),
            });
        }

        let user = account.user.clone();
        let session = store.issue_session(user);
        drop(store);

        self.events
            .publish(AuthEventKind::SignedIn, Some(session.user.id));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, GatewayError> {
        if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(GatewayError::Api {
                status: 422,
                code: Some("weak_password".to_string()),
                message: format!("Password should be at least {MIN_PASSWORD_LENGTH} characters."),
            });
        }

        let mut store = self.store.lock().await;
        if store.accounts.contains_key(email) {
            return Err(GatewayError::Api {
                status: 422,
                code: Some("user_already_exists".to_string()),
                message: "User already registered".to_string(),
            });
        }

        let user = AuthUser {
            id: UserId::random(),
            email: email.clone(),
        };
        store.accounts.insert(
            email.clone(),
            Account {
                user: user.clone(),
                password: password.clone(),
                confirmed: !self.require_confirmation,
            },
        );

        if self.require_confirmation {
            return Ok(SignUpOutcome::ConfirmationRequired {
                email: email.clone(),
            });
        }

        let session = store.issue_session(user);
        drop(store);

        self.events
            .publish(AuthEventKind::SignedUp, Some(session.user.id));
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn refresh_session(
        &self,
        refresh_token: &AccessToken,
    ) -> Result<AuthSession, GatewayError> {
        let mut store = self.store.lock().await;
        let grant = store
            .refresh_tokens
            .remove(refresh_token.as_str())
            .ok_or_else(|| GatewayError::Api {
                status: 400,
                code: Some("refresh_token_not_found".to_string()),
                message: "Invalid Refresh Token: Refresh Token Not Found".to_string(),
            })?;
        // The access token issued alongside is superseded.
        store.access_tokens.remove(&grant.access_token);
        let user_id = grant.user_id;
        let user = store
            .account(user_id)
            .map(|account| account.user.clone())
            .ok_or_else(|| GatewayError::Decode(format!("no account for user {user_id}")))?;

        let session = store.issue_session(user);
        drop(store);

        self.events
            .publish(AuthEventKind::TokenRefreshed, Some(session.user.id));
        Ok(session)
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), GatewayError> {
        let result = {
            let mut store = self.store.lock().await;
            store.injected(GatewayOperation::SignOut).map(|()| {
                // Global scope: every session of the account ends.
                if let Some(user_id) = store.access_tokens.remove(token.as_str()) {
                    store.access_tokens.retain(|_, owner| *owner != user_id);
                    store.refresh_tokens.retain(|_, grant| grant.user_id != user_id);
                }
            })
        };

        self.events.publish(AuthEventKind::SignedOut, None);
        result
    }

    async fn current_user(&self, token: &AccessToken) -> Result<Option<AuthUser>, GatewayError> {
        let store = self.store.lock().await;
        Ok(store
            .access_tokens
            .get(token.as_str())
            .and_then(|id| store.account(*id))
            .map(|account| account.user.clone()))
    }

    fn subscribe(&self) -> AuthSubscription {
        self.events.subscribe()
    }

    async fn upsert_profile(
        &self,
        token: &AccessToken,
        profile: &ProfileRow,
    ) -> Result<(), GatewayError> {
        let mut store = self.store.lock().await;
        store.injected(GatewayOperation::UpsertProfile)?;
        if store.user_for(token)? != profile.id {
            return Err(row_level_security("profiles"));
        }
        store.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn fetch_profile(
        &self,
        token: &AccessToken,
        id: UserId,
    ) -> Result<Profile, GatewayError> {
        let store = self.store.lock().await;
        store.injected(GatewayOperation::FetchProfile)?;
        store.user_for(token)?;
        let row = store.profiles.get(&id).cloned().ok_or(GatewayError::NotFound)?;
        drop(store);
        row.try_into()
    }

    async fn insert_part(&self, token: &AccessToken, part: &NewPartRow) -> Result<(), GatewayError> {
        let mut store = self.store.lock().await;
        store.injected(GatewayOperation::InsertPart)?;
        if store.user_for(token)? != part.seller_id {
            return Err(row_level_security("parts"));
        }

        store.parts.push(Part {
            id: PartId::random(),
            seller_id: part.seller_id,
            part_name: part.part_name.clone(),
            part_number: part.part_number.clone(),
            vehicle_model: part.vehicle_model.clone(),
            quantity: part.quantity,
            price: part.price,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_parts_by_seller(
        &self,
        token: &AccessToken,
        seller_id: UserId,
    ) -> Result<Vec<Part>, GatewayError> {
        let store = self.store.lock().await;
        store.injected(GatewayOperation::ListParts)?;
        store.user_for(token)?;

        Ok(store
            .parts
            .iter()
            .rev()
            .filter(|part| part.seller_id == seller_id)
            .cloned()
            .collect())
    }

    async fn search_parts(
        &self,
        token: &AccessToken,
        term: Option<&SearchTerm>,
    ) -> Result<Vec<PartListing>, GatewayError> {
        let store = self.store.lock().await;
        store.injected(GatewayOperation::SearchParts)?;
        store.user_for(token)?;

        Ok(store
            .parts
            .iter()
            .rev()
            .filter(|part| part.is_in_stock())
            .filter(|part| term.is_none_or(|term| term.matches(part)))
            .map(|part| PartListing {
                part: part.clone(),
                seller_shop_name: store
                    .profiles
                    .get(&part.seller_id)
                    .and_then(|profile| profile.shop_name.clone()),
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        self.store.lock().await.injected(GatewayOperation::Ping)
    }
}
