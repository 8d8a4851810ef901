//! Manufacturer catalog: in-stock parts across all sellers.

use thiserror::Error;
use tracing::instrument;

use sparepart_nexus_core::{PartListing, SearchTerm};

use crate::gateway::{Gateway, GatewayError};
use crate::models::{CurrentSession, Notice};

/// A failed catalog query. `Display` is the notice text.
#[derive(Debug, Error)]
#[error("Error fetching parts: {0}")]
pub struct SearchError(#[from] pub GatewayError);

/// In-stock parts, newest first, optionally narrowed by `term`.
///
/// # Errors
///
/// Returns a [`SearchError`] wrapping the gateway failure.
#[instrument(skip(gateway, session), fields(user_id = %session.user_id, term = term.map(SearchTerm::as_str)))]
pub async fn search_parts(
    gateway: &dyn Gateway,
    session: &CurrentSession,
    term: Option<&SearchTerm>,
) -> Result<Vec<PartListing>, SearchError> {
    let listings = gateway.search_parts(&session.access_token, term).await?;
    tracing::debug!(count = listings.len(), "Catalog search");
    Ok(listings)
}

/// Ordering is not available yet; the button only says so.
#[must_use]
pub fn place_order_notice(part_name: &str) -> Notice {
    Notice::info(format!("Order feature coming soon for \"{part_name}\""))
}
