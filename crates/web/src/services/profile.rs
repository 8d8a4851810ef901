//! Profile setup.

use thiserror::Error;
use tracing::instrument;

use sparepart_nexus_core::{Profile, ProfileDraft, ProfileDraftError};

use crate::gateway::{Gateway, GatewayError, ProfileRow};
use crate::models::CurrentSession;

/// Why a profile submission was not saved. `Display` is the inline message.
#[derive(Debug, Error)]
pub enum ProfileSetupError {
    #[error(transparent)]
    Invalid(#[from] ProfileDraftError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Validate and upsert the signed-in user's profile.
///
/// Nothing is sent to the gateway unless both fields are filled in.
///
/// # Errors
///
/// Returns the validation failure, or the gateway's error for the upsert.
#[instrument(skip(gateway, session), fields(user_id = %session.user_id))]
pub async fn submit_profile(
    gateway: &dyn Gateway,
    session: &CurrentSession,
    role: &str,
    display_name: &str,
) -> Result<Profile, ProfileSetupError> {
    let draft = ProfileDraft::parse(role, display_name)?;
    let row = ProfileRow::from_draft(session.user_id, &draft);

    gateway.upsert_profile(&session.access_token, &row).await?;

    tracing::info!(role = draft.role().as_str(), "Profile saved");
    Ok(draft.into_profile(session.user_id))
}
