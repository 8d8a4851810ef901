//! GoTrue endpoints: password sign-in, sign-up, refresh, sign-out, and user lookup.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use sparepart_nexus_core::{Email, UserId};

use super::{SupabaseGateway, check, read_json};
use crate::gateway::{AccessToken, AuthSession, AuthUser, GatewayError, SignUpOutcome};

/// `user` object in GoTrue responses. Only the fields we read.
#[derive(Debug, Deserialize)]
struct UserBody {
    id: UserId,
    email: Option<String>,
}

impl TryFrom<UserBody> for AuthUser {
    type Error = GatewayError;

    fn try_from(body: UserBody) -> Result<Self, Self::Error> {
        let email = body
            .email
            .as_deref()
            .ok_or_else(|| GatewayError::Decode(format!("user {} has no email", body.id)))
            .and_then(|raw| {
                Email::parse(raw).map_err(|e| GatewayError::Decode(format!("user email: {e}")))
            })?;
        Ok(Self { id: body.id, email })
    }
}

/// Session returned by the token and sign-up endpoints.
#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    refresh_token: String,
    /// Unix seconds.
    expires_at: Option<i64>,
    user: UserBody,
}

impl TryFrom<SessionBody> for AuthSession {
    type Error = GatewayError;

    fn try_from(body: SessionBody) -> Result<Self, Self::Error> {
        Ok(Self {
            user: body.user.try_into()?,
            access_token: AccessToken::new(body.access_token),
            refresh_token: AccessToken::new(body.refresh_token),
            expires_at: body.expires_at.and_then(unix_to_utc),
        })
    }
}

/// Sign-up answers with a session when confirmation is off, or the bare user
/// when the project wants the address confirmed first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session(SessionBody),
    User(UserBody),
}

#[derive(serde::Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(serde::Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

fn unix_to_utc(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

impl SupabaseGateway {
    pub(super) async fn password_grant(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.auth_url("token?grant_type=password"))
            .json(&Credentials {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let body: SessionBody = read_json(response).await?;
        body.try_into()
    }

    pub(super) async fn create_account(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.auth_url("signup"))
            .json(&Credentials {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        match read_json::<SignUpBody>(response).await? {
            SignUpBody::Session(session) => Ok(SignUpOutcome::SignedIn(session.try_into()?)),
            SignUpBody::User(user) => {
                let user = AuthUser::try_from(user)?;
                Ok(SignUpOutcome::ConfirmationRequired { email: user.email })
            }
        }
    }

    pub(super) async fn refresh_grant(
        &self,
        refresh_token: &AccessToken,
    ) -> Result<AuthSession, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.auth_url("token?grant_type=refresh_token"))
            .json(&RefreshRequest {
                refresh_token: refresh_token.as_str(),
            })
            .send()
            .await?;

        let body: SessionBody = read_json(response).await?;
        body.try_into()
    }

    pub(super) async fn revoke(&self, token: &AccessToken) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .post(self.auth_url("logout"))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        // An already-invalid token means there is nothing left to revoke.
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }

    pub(super) async fn fetch_user(
        &self,
        token: &AccessToken,
    ) -> Result<Option<AuthUser>, GatewayError> {
        let response = self
            .inner
            .client
            .get(self.auth_url("user"))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let body: UserBody = read_json(response).await?;
        Ok(Some(body.try_into()?))
    }
}
