//! Wire rows for the `profiles` and `parts` tables.
//!
//! Rows are plain serde structs shaped like the tables. Conversion into the
//! core types happens here so a malformed row is rejected once, at the edge.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sparepart_nexus_core::{
    NewPart, Part, PartId, PartListing, Price, Profile, ProfileDraft, ProfileKind, Role, UserId,
};

use super::GatewayError;

/// A `profiles` row.
///
/// Exactly one of `shop_name` / `company_name` is set for a known role; the
/// other is sent as an explicit `null` so an upsert clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: UserId,
    pub role: String,
    pub shop_name: Option<String>,
    pub company_name: Option<String>,
}

impl ProfileRow {
    /// The row a validated setup form writes for `id`.
    #[must_use]
    pub fn from_draft(id: UserId, draft: &ProfileDraft) -> Self {
        Self {
            id,
            role: draft.role().as_str().to_string(),
            shop_name: draft.shop_name().map(str::to_string),
            company_name: draft.company_name().map(str::to_string),
        }
    }
}

impl TryFrom<ProfileRow> for Profile {
    type Error = GatewayError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let name = |value: Option<String>, column: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| GatewayError::Decode(format!("profile {} has no {column}", row.id)))
        };

        let kind = match row.role.parse::<Role>() {
            Ok(Role::Retailer) => ProfileKind::Retailer {
                shop_name: name(row.shop_name, "shop_name")?,
            },
            Ok(Role::Manufacturer) => ProfileKind::Manufacturer {
                company_name: name(row.company_name, "company_name")?,
            },
            Err(_) => ProfileKind::Unrecognized { role: row.role },
        };

        Ok(Self { id: row.id, kind })
    }
}

/// A `parts` row to insert.
///
/// Only constructible with an explicit seller, which callers take from the
/// signed-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPartRow {
    pub seller_id: UserId,
    pub part_name: String,
    pub part_number: Option<String>,
    pub vehicle_model: String,
    pub quantity: u32,
    pub price: Price,
}

impl NewPartRow {
    #[must_use]
    pub fn new(seller_id: UserId, part: NewPart) -> Self {
        Self {
            seller_id,
            part_name: part.part_name,
            part_number: part.part_number,
            vehicle_model: part.vehicle_model,
            quantity: part.quantity,
            price: part.price,
        }
    }
}

/// A `parts` row as selected.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct PartRow {
    id: PartId,
    seller_id: UserId,
    part_name: String,
    part_number: Option<String>,
    vehicle_model: String,
    quantity: i64,
    price: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<PartRow> for Part {
    type Error = GatewayError;

    fn try_from(row: PartRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            GatewayError::Decode(format!("part {} has quantity {}", row.id, row.quantity))
        })?;
        let price = Price::new(row.price)
            .map_err(|e| GatewayError::Decode(format!("part {} price: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            seller_id: row.seller_id,
            part_name: row.part_name,
            part_number: row.part_number.filter(|n| !n.trim().is_empty()),
            vehicle_model: row.vehicle_model,
            quantity,
            price,
            created_at: row.created_at,
        })
    }
}

/// Embedded seller columns in a search result.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct SellerRow {
    shop_name: Option<String>,
}

/// A `parts` row joined with its seller's profile.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct ListingRow {
    #[serde(flatten)]
    part: PartRow,
    profiles: Option<SellerRow>,
}

impl TryFrom<ListingRow> for PartListing {
    type Error = GatewayError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            part: row.part.try_into()?,
            seller_shop_name: row
                .profiles
                .and_then(|seller| seller.shop_name)
                .filter(|name| !name.trim().is_empty()),
        })
    }
}

/// Decode a list of rows, failing on the first bad one.
pub(super) fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, GatewayError>
where
    T: TryFrom<R, Error = GatewayError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Quote a value for PostgREST's `or=(...)` filter grammar.
///
/// Double quotes and backslashes inside the value are escaped so a search
/// term cannot close the quoted string or inject another condition.
pub(super) fn quote_filter_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// The `or` filter for a substring search over the three searchable columns.
pub(super) fn search_filter(term: &str) -> String {
    let pattern = quote_filter_value(&format!("*{term}*"));
    format!(
        "(part_name.ilike.{pattern},part_number.ilike.{pattern},vehicle_model.ilike.{pattern})"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile_row(role: &str, shop: Option<&str>, company: Option<&str>) -> ProfileRow {
        ProfileRow {
            id: UserId::random(),
            role: role.to_string(),
            shop_name: shop.map(str::to_string),
            company_name: company.map(str::to_string),
        }
    }

    #[test]
    fn test_profile_row_from_draft_sets_one_name() {
        let id = UserId::random();
        let draft = ProfileDraft::parse("retailer", "Joe's Garage").unwrap();
        let row = ProfileRow::from_draft(id, &draft);

        assert_eq!(row.id, id);
        assert_eq!(row.role, "retailer");
        assert_eq!(row.shop_name.as_deref(), Some("Joe's Garage"));
        assert_eq!(row.company_name, None);

        let json = serde_json::to_value(&row).unwrap();
        assert!(json["company_name"].is_null());
        assert!(json.as_object().unwrap().contains_key("company_name"));
    }

    #[test]
    fn test_profile_row_decodes_known_roles() {
        let profile = Profile::try_from(profile_row("manufacturer", None, Some("Acme"))).unwrap();
        assert_eq!(
            profile.kind,
            ProfileKind::Manufacturer {
                company_name: "Acme".to_string()
            }
        );
    }

    #[test]
    fn test_profile_row_unknown_role_is_kept() {
        let profile = Profile::try_from(profile_row("distributor", None, None)).unwrap();
        assert_eq!(
            profile.kind,
            ProfileKind::Unrecognized {
                role: "distributor".to_string()
            }
        );
    }

    #[test]
    fn test_profile_row_known_role_without_name_is_rejected() {
        let result = Profile::try_from(profile_row("retailer", None, Some("Acme")));
        assert!(matches!(result, Err(GatewayError::Decode(_))));
    }

    #[test]
    fn test_listing_row_decodes_embedded_seller() {
        let json = serde_json::json!({
            "id": "6f1c7a4e-2b1d-4a53-9b43-5a0e9d1f2c11",
            "seller_id": "0b8f3c52-7d1e-4e0a-8a8e-3f7c2d9b6a10",
            "part_name": "Brake Pad",
            "part_number": "BP-100",
            "vehicle_model": "Civic 2020",
            "quantity": 5,
            "price": 29.99,
            "created_at": "2025-03-01T10:15:00.123456+00:00",
            "profiles": { "shop_name": "Joe's Garage" }
        });

        let row: ListingRow = serde_json::from_value(json).unwrap();
        let listing = PartListing::try_from(row).unwrap();

        assert_eq!(listing.part.part_name, "Brake Pad");
        assert_eq!(listing.part.quantity, 5);
        assert_eq!(listing.part.price, Price::parse("29.99").unwrap());
        assert_eq!(listing.seller_shop_name.as_deref(), Some("Joe's Garage"));
    }

    #[test]
    fn test_listing_row_without_seller() {
        let json = serde_json::json!({
            "id": "6f1c7a4e-2b1d-4a53-9b43-5a0e9d1f2c11",
            "seller_id": "0b8f3c52-7d1e-4e0a-8a8e-3f7c2d9b6a10",
            "part_name": "Oil Filter",
            "part_number": null,
            "vehicle_model": "Corolla",
            "quantity": 2,
            "price": "4.50",
            "created_at": "2025-03-01T10:15:00Z",
            "profiles": null
        });

        let row: ListingRow = serde_json::from_value(json).unwrap();
        let listing = PartListing::try_from(row).unwrap();
        assert_eq!(listing.part.part_number, None);
        assert_eq!(listing.seller_shop_name, None);
    }

    #[test]
    fn test_part_row_negative_quantity_is_rejected() {
        let json = serde_json::json!({
            "id": "6f1c7a4e-2b1d-4a53-9b43-5a0e9d1f2c11",
            "seller_id": "0b8f3c52-7d1e-4e0a-8a8e-3f7c2d9b6a10",
            "part_name": "Oil Filter",
            "part_number": null,
            "vehicle_model": "Corolla",
            "quantity": -1,
            "price": 1,
            "created_at": "2025-03-01T10:15:00Z"
        });

        let row: PartRow = serde_json::from_value(json).unwrap();
        assert!(matches!(Part::try_from(row), Err(GatewayError::Decode(_))));
    }

    #[test]
    fn test_quote_filter_value_escapes() {
        assert_eq!(quote_filter_value("civic"), "\"civic\"");
        assert_eq!(quote_filter_value("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_search_filter_covers_three_columns() {
        assert_eq!(
            search_filter("brake, pad"),
            "(part_name.ilike.\"*brake, pad*\",part_number.ilike.\"*brake, pad*\",vehicle_model.ilike.\"*brake, pad*\")"
        );
    }
}
