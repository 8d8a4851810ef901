//! Core types for SparePart Nexus.
//!
//! This module provides type-safe wrappers for the marketplace's domain concepts.

pub mod email;
pub mod id;
pub mod part;
pub mod price;
pub mod profile;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use part::{NewPart, Part, PartDraft, PartDraftError, PartListing, SearchTerm};
pub use price::{Price, PriceError};
pub use profile::{Profile, ProfileDraft, ProfileDraftError, ProfileKind};
pub use role::{Role, RoleError};
