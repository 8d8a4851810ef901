//! Marketplace roles.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not one of the known roles.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0:?}")]
pub struct RoleError(pub String);

/// What a user does on the marketplace.
///
/// Stored in the `profiles.role` column as `retailer` or `manufacturer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Seller that lists parts (a shop or service garage).
    Retailer,
    /// Buyer that searches and orders parts.
    Manufacturer,
}

impl Role {
    /// All roles, in the order they are offered on the setup form.
    pub const ALL: [Self; 2] = [Self::Retailer, Self::Manufacturer];

    /// Column value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Retailer => "retailer",
            Self::Manufacturer => "manufacturer",
        }
    }

    /// Human label for the role picker.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Retailer => "Retailer / Service Shop",
            Self::Manufacturer => "Manufacturer",
        }
    }

    /// Label of the display-name field this role fills in.
    #[must_use]
    pub const fn name_label(&self) -> &'static str {
        match self {
            Self::Retailer => "Shop Name",
            Self::Manufacturer => "Company Name",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retailer" => Ok(Self::Retailer),
            "manufacturer" => Ok(Self::Manufacturer),
            other => Err(RoleError(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_exact() {
        assert_eq!("retailer".parse::<Role>().unwrap(), Role::Retailer);
        assert_eq!("manufacturer".parse::<Role>().unwrap(), Role::Manufacturer);
        assert!("Retailer".parse::<Role>().is_err());
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_uses_column_values() {
        assert_eq!(
            serde_json::to_string(&Role::Manufacturer).unwrap(),
            "\"manufacturer\""
        );
    }

    #[test]
    fn test_name_label() {
        assert_eq!(Role::Retailer.name_label(), "Shop Name");
        assert_eq!(Role::Manufacturer.name_label(), "Company Name");
    }
}
