//! Request-scoped models kept in the cookie session.

pub mod notice;
pub mod session;

pub use notice::{Notice, NoticeLevel};
pub use session::{CurrentSession, session_keys};
