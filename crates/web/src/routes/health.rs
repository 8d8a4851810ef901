//! Health check endpoints.

use axum::extract::State;

use crate::error::AppError;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the gateway is reachable before returning OK.
///
/// # Errors
///
/// Returns [`AppError::Unavailable`] (503) if it is not.
pub async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.gateway().ping().await?;
    Ok("ok")
}
