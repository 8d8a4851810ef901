//! Router assembly, shared by the binary and the integration tests.

use std::path::PathBuf;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Knobs that differ between production and tests.
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Rate limit the auth form posts.
    pub rate_limit: bool,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            rate_limit: true,
            static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState, options: &AppOptions) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(routes::routes(options.rate_limit))
        .nest_service("/static", ServeDir::new(&options.static_dir))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
