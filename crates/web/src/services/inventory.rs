//! Retailer inventory: the signed-in seller's own listings.

use thiserror::Error;
use tracing::instrument;

use sparepart_nexus_core::{Part, PartDraft, PartDraftError};

use crate::gateway::{Gateway, GatewayError, NewPartRow};
use crate::models::CurrentSession;

/// Why a part was not added. `Display` is the notice text.
#[derive(Debug, Error)]
pub enum AddPartError {
    #[error(transparent)]
    Invalid(#[from] PartDraftError),

    #[error("Error adding part: {0}")]
    Gateway(#[from] GatewayError),
}

/// The seller's parts, newest first.
///
/// # Errors
///
/// Returns the gateway error if the query fails.
#[instrument(skip_all, fields(user_id = %session.user_id))]
pub async fn list_own_parts(
    gateway: &dyn Gateway,
    session: &CurrentSession,
) -> Result<Vec<Part>, GatewayError> {
    gateway
        .list_parts_by_seller(&session.access_token, session.user_id)
        .await
}

/// Validate the form and insert one part owned by the signed-in user.
///
/// # Errors
///
/// Returns the validation failure, or the gateway's error for the insert.
#[instrument(skip_all, fields(user_id = %session.user_id))]
pub async fn add_part(
    gateway: &dyn Gateway,
    session: &CurrentSession,
    draft: &PartDraft,
) -> Result<(), AddPartError> {
    let part = draft.validate()?;
    let row = NewPartRow::new(session.user_id, part);

    gateway.insert_part(&session.access_token, &row).await?;

    tracing::info!(part_name = %row.part_name, quantity = row.quantity, "Part added");
    Ok(())
}
