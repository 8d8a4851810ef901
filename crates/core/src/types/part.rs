//! Seller-owned inventory listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{PartId, UserId};
use super::price::Price;

/// A part listed by a retailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    /// Owning retailer. Never changes after insert.
    pub seller_id: UserId,
    pub part_name: String,
    /// OEM part number, if the seller gave one.
    pub part_number: Option<String>,
    pub vehicle_model: String,
    pub quantity: u32,
    pub price: Price,
    pub created_at: DateTime<Utc>,
}

impl Part {
    /// Whether buyers can see this part in search.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// A part as seen by buyers, with the seller's shop name attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartListing {
    pub part: Part,
    /// `None` when the seller has no shop name on file.
    pub seller_shop_name: Option<String>,
}

/// A validated listing ready to insert.
///
/// Carries no seller: the owner is always the signed-in user and is attached
/// when the row is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPart {
    pub part_name: String,
    pub part_number: Option<String>,
    pub vehicle_model: String,
    pub quantity: u32,
    pub price: Price,
}

/// Validation errors for the add-part form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PartDraftError {
    #[error("Part name is required.")]
    MissingName,
    #[error("Compatible vehicle model is required.")]
    MissingVehicleModel,
    #[error("Quantity must be a whole number of at least 1.")]
    InvalidQuantity,
    #[error("Price must be a number of 0 or more.")]
    InvalidPrice,
}

/// Raw add-part form input, as typed by the retailer.
///
/// Kept as strings so a rejected submission can be shown back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartDraft {
    #[serde(default)]
    pub part_name: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub vehicle_model: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub price: String,
}

impl Default for PartDraft {
    /// An empty form: one unit at no price.
    fn default() -> Self {
        Self {
            part_name: String::new(),
            part_number: String::new(),
            vehicle_model: String::new(),
            quantity: "1".to_string(),
            price: "0".to_string(),
        }
    }
}

impl PartDraft {
    /// Validate the form into a [`NewPart`].
    ///
    /// Text fields are trimmed; a blank part number means "none".
    ///
    /// # Errors
    ///
    /// Returns the first failing field: name, vehicle model, quantity (a
    /// positive integer), then price (a non-negative decimal).
    pub fn validate(&self) -> Result<NewPart, PartDraftError> {
        let part_name = self.part_name.trim();
        if part_name.is_empty() {
            return Err(PartDraftError::MissingName);
        }

        let vehicle_model = self.vehicle_model.trim();
        if vehicle_model.is_empty() {
            return Err(PartDraftError::MissingVehicleModel);
        }

        let quantity = self
            .quantity
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|q| *q > 0)
            .ok_or(PartDraftError::InvalidQuantity)?;

        let price = Price::parse(&self.price).map_err(|_| PartDraftError::InvalidPrice)?;

        let part_number = Some(self.part_number.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(NewPart {
            part_name: part_name.to_string(),
            part_number,
            vehicle_model: vehicle_model.to_string(),
            quantity,
            price,
        })
    }
}

/// A buyer's free-text filter.
///
/// Matches a part when its name, number, or vehicle model contains the term,
/// ignoring case. Plain substring matching; no tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Build a term from user input. Blank input means "no filter".
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (!raw.is_empty()).then(|| Self(raw.to_string()))
    }

    /// The term as typed (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `part` matches on any searchable field.
    #[must_use]
    pub fn matches(&self, part: &Part) -> bool {
        let needle = self.0.to_lowercase();
        let contains = |field: &str| field.to_lowercase().contains(&needle);

        contains(&part.part_name)
            || part.part_number.as_deref().is_some_and(contains)
            || contains(&part.vehicle_model)
    }
}
