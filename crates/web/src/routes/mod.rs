//! HTTP route handlers for the web front end.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Root view (auth / setup / retailer / manufacturer / unknown role)
//! GET  /?q=term                - Manufacturer search
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (gateway reachable)
//!
//! # Auth
//! POST /auth/login             - Sign in
//! POST /auth/register          - Sign up
//! POST /auth/logout            - Sign out
//!
//! # Views (require a session)
//! POST /profile                - Save profile
//! POST /parts                  - Add a part
//! POST /orders                 - Place-order stub
//! ```

pub mod auth;
pub mod health;
pub mod home;
pub mod orders;
pub mod parts;
pub mod profile;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
///
/// Sign-in and sign-up posts are rate limited per client IP when
/// `rate_limit` is set. Sign-out is never limited.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let credentials = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register));
    let credentials = if rate_limit {
        credentials.layer(auth_rate_limiter())
    } else {
        credentials
    };

    credentials.route("/logout", post(auth::logout))
}

/// Create all page routes.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/profile", post(profile::submit))
        .route("/parts", post(parts::create))
        .route("/orders", post(orders::place))
        .nest("/auth", auth_routes(rate_limit))
}
