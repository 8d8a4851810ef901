//! Business logic services for the marketplace views.
//!
//! # Services
//!
//! - `session_router` - Drives the root routing machine for a request
//! - `profile` - Profile setup (role + display name)
//! - `inventory` - Retailer listing and adding of parts
//! - `catalog` - Manufacturer search and the place-order stub
//! - `auth_watch` - Background listener for gateway auth changes

pub mod auth_watch;
pub mod catalog;
pub mod inventory;
pub mod profile;
pub mod session_router;
