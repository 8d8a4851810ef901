//! Integration tests for SparePart Nexus.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests over the in-memory gateway
//! cargo test -p sparepart-nexus-integration-tests
//!
//! # Live tests against a Supabase project
//! SUPABASE_URL=... SUPABASE_ANON_KEY=... \
//! SPAREPART_TEST_EMAIL=... SPAREPART_TEST_PASSWORD=... \
//!     cargo test -p sparepart-nexus-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `marketplace_flow` - Full request flows through the router
//! - `supabase_live` - Gateway calls against a real project (ignored by default)

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use secrecy::SecretString;
use tower::ServiceExt;

use sparepart_nexus_core::Email;
use sparepart_nexus_web::config::{GatewayConfig, WebConfig};
use sparepart_nexus_web::gateway::{AuthSession, Gateway, InMemoryGateway};
use sparepart_nexus_web::state::AppState;
use sparepart_nexus_web::{AppOptions, router};

/// Password used for every test account.
pub const PASSWORD: &str = "correct-horse";

const BODY_LIMIT: usize = 1024 * 1024;

/// Config for a router over the in-memory gateway.
#[must_use]
pub fn test_config() -> WebConfig {
    WebConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("integration-test-session-signing-secret-0123456789"),
        gateway: GatewayConfig::InMemory,
        sentry_dsn: None,
        sentry_environment: "test".to_string(),
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A response with the body read out.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Assert a redirect to `target`.
    pub fn assert_redirect(&self, target: &str) {
        assert!(
            self.status.is_redirection(),
            "expected a redirect, got {}: {}",
            self.status,
            self.body
        );
        assert_eq!(self.location(), Some(target));
    }
}

/// One browser: the shared app plus its own session cookie.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
    pub gateway: Arc<InMemoryGateway>,
    cookie: Option<String>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// An app where new accounts can sign in right away.
    #[must_use]
    pub fn new() -> Self {
        Self::with_gateway(InMemoryGateway::new())
    }

    /// An app over a prepared gateway.
    #[must_use]
    pub fn with_gateway(gateway: InMemoryGateway) -> Self {
        Self::build(gateway, false)
    }

    /// An app with the production rate limits on the auth forms.
    #[must_use]
    pub fn rate_limited() -> Self {
        Self::build(InMemoryGateway::new(), true)
    }

    fn build(gateway: InMemoryGateway, rate_limit: bool) -> Self {
        let gateway = Arc::new(gateway);
        let handle: Arc<dyn Gateway> = gateway.clone();
        let state = AppState::new(test_config(), handle);
        let options = AppOptions {
            rate_limit,
            ..AppOptions::default()
        };

        Self {
            router: router(state, &options),
            gateway,
            cookie: None,
        }
    }

    /// Another browser on the same app, with no cookie.
    #[must_use]
    pub fn new_browser(&self) -> Self {
        Self {
            cookie: None,
            ..self.clone()
        }
    }

    /// Send a GET.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Send a urlencoded form POST.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Sign up through the form and follow the redirect.
    pub async fn sign_up(&mut self, email: &str) -> TestResponse {
        let response = self
            .post_form("/auth/register", &[("email", email), ("password", PASSWORD)])
            .await;
        response.assert_redirect("/");
        self.get("/").await
    }

    /// Sign up and save a retailer profile.
    pub async fn sign_up_retailer(&mut self, email: &str, shop_name: &str) {
        self.sign_up(email).await;
        self.post_form(
            "/profile",
            &[("role", "retailer"), ("display_name", shop_name)],
        )
        .await
        .assert_redirect("/");
    }

    /// Sign up and save a manufacturer profile.
    pub async fn sign_up_manufacturer(&mut self, email: &str, company_name: &str) {
        self.sign_up(email).await;
        self.post_form(
            "/profile",
            &[("role", "manufacturer"), ("display_name", company_name)],
        )
        .await
        .assert_redirect("/");
    }

    /// Submit the add-part form.
    pub async fn add_part(
        &mut self,
        name: &str,
        number: &str,
        model: &str,
        quantity: &str,
        price: &str,
    ) -> TestResponse {
        self.post_form(
            "/parts",
            &[
                ("part_name", name),
                ("part_number", number),
                ("vehicle_model", model),
                ("quantity", quantity),
                ("price", price),
            ],
        )
        .await
    }

    /// A separate gateway session for `email`, for arranging data directly.
    pub async fn gateway_session(&self, email: &str) -> AuthSession {
        self.gateway
            .sign_in(
                &Email::parse(email).unwrap(),
                &SecretString::from(PASSWORD),
            )
            .await
            .unwrap()
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-real-ip", "203.0.113.10");
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            && let Some(pair) = set_cookie.split(';').next()
        {
            self.cookie = Some(pair.trim().to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
