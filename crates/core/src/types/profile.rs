//! Per-user profile declaring role and display name.

use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::role::Role;

/// Validation errors for the profile setup form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileDraftError {
    /// Role or display name missing.
    #[error("Please fill out all fields.")]
    Incomplete,
    /// Role is not one the marketplace offers.
    #[error("Please choose a valid role.")]
    UnknownRole,
}

/// What kind of profile a user has, with the name that goes with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    /// A seller; `shop_name` is set and `company_name` is absent.
    Retailer {
        /// Shop display name.
        shop_name: String,
    },
    /// A buyer; `company_name` is set and `shop_name` is absent.
    Manufacturer {
        /// Company display name.
        company_name: String,
    },
    /// A row whose role the front end does not recognise.
    Unrecognized {
        /// Raw role value as stored.
        role: String,
    },
}

/// A user's marketplace profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same as the owning user's id.
    pub id: UserId,
    /// Role and display name.
    pub kind: ProfileKind,
}

impl Profile {
    /// The role, if it is one the marketplace knows.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        match self.kind {
            ProfileKind::Retailer { .. } => Some(Role::Retailer),
            ProfileKind::Manufacturer { .. } => Some(Role::Manufacturer),
            ProfileKind::Unrecognized { .. } => None,
        }
    }

    /// The display name (shop or company), if the role is known.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match &self.kind {
            ProfileKind::Retailer { shop_name } => Some(shop_name),
            ProfileKind::Manufacturer { company_name } => Some(company_name),
            ProfileKind::Unrecognized { .. } => None,
        }
    }
}

/// A validated profile setup submission.
///
/// Constructing one is the only way to get a value to upsert, so an
/// incomplete form never reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    role: Role,
    display_name: String,
}

impl ProfileDraft {
    /// Validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileDraftError::Incomplete`] if either field is blank and
    /// [`ProfileDraftError::UnknownRole`] if the role is not offered.
    pub fn parse(role: &str, display_name: &str) -> Result<Self, ProfileDraftError> {
        let role = role.trim();
        let display_name = display_name.trim();
        if role.is_empty() || display_name.is_empty() {
            return Err(ProfileDraftError::Incomplete);
        }

        let role = role
            .parse::<Role>()
            .map_err(|_| ProfileDraftError::UnknownRole)?;

        Ok(Self {
            role,
            display_name: display_name.to_string(),
        })
    }

    /// Chosen role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Shop or company name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// `shop_name` column value: set only for retailers.
    #[must_use]
    pub fn shop_name(&self) -> Option<&str> {
        (self.role == Role::Retailer).then_some(self.display_name.as_str())
    }

    /// `company_name` column value: set only for manufacturers.
    #[must_use]
    pub fn company_name(&self) -> Option<&str> {
        (self.role == Role::Manufacturer).then_some(self.display_name.as_str())
    }

    /// The profile this draft produces once written for `id`.
    #[must_use]
    pub fn into_profile(self, id: UserId) -> Profile {
        let kind = match self.role {
            Role::Retailer => ProfileKind::Retailer {
                shop_name: self.display_name,
            },
            Role::Manufacturer => ProfileKind::Manufacturer {
                company_name: self.display_name,
            },
        };
        Profile { id, kind }
    }
}
