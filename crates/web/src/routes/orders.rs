//! Place-order button. Nothing is ordered yet; the user gets a notice.

use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::middleware::RequireSession;
use crate::services::catalog::place_order_notice;

/// Place-order form data.
#[derive(Debug, Deserialize)]
pub struct OrderForm {
    pub part_name: String,
    /// Search term to return to.
    #[serde(default)]
    pub q: String,
}

/// Flash the "coming soon" notice and return to the catalog.
pub async fn place(
    session: Session,
    RequireSession(_current): RequireSession,
    Form(form): Form<OrderForm>,
) -> Response {
    place_order_notice(&form.part_name).flash(&session).await;

    let query = form.q.trim();
    if query.is_empty() {
        Redirect::to("/").into_response()
    } else {
        Redirect::to(&format!("/?q={}", urlencoding::encode(query))).into_response()
    }
}
