//! Transient notices ("toasts").
//!
//! A handler that redirects stores one notice in the session; the next page
//! render takes it out and shows it once.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// CSS modifier class for the template.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.level {
            NoticeLevel::Success => "notice-success",
            NoticeLevel::Error => "notice-error",
            NoticeLevel::Info => "notice-info",
        }
    }

    /// Store this notice for the next render, replacing any pending one.
    ///
    /// A session write failure only loses the notice, so it is logged and dropped.
    pub async fn flash(self, session: &Session) {
        if let Err(e) = session.insert(session_keys::NOTICE, self).await {
            tracing::error!("Failed to store notice: {}", e);
        }
    }

    /// Take the pending notice, if any.
    pub async fn take(session: &Session) -> Option<Self> {
        match session.remove::<Self>(session_keys::NOTICE).await {
            Ok(notice) => notice,
            Err(e) => {
                tracing::error!("Failed to read notice: {}", e);
                None
            }
        }
    }
}
