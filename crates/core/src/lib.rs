//! SparePart Nexus Core - Shared domain types.
//!
//! This crate provides the types used by the marketplace web front end:
//! - `web` - Server-rendered front end talking to the hosted gateway
//! - `integration-tests` - End-to-end tests over the web router
//!
//! # Architecture
//!
//! The core crate contains only types, validation, and the session routing
//! state machine - no I/O, no HTTP clients. Rows coming back from the gateway
//! are converted into these tagged records at the gateway boundary.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices, roles, profiles, and parts
//! - [`routing`] - Root routing state machine (session → profile → view)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod routing;
pub mod types;

pub use routing::{ProfileLookup, RootRouter, RouteState, RouterAction, RouterEvent};
pub use types::*;
