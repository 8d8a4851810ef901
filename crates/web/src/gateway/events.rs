//! Auth-change notifications.
//!
//! Each gateway owns an [`AuthEvents`] sender and publishes on sign-in,
//! sign-up, token refresh, and sign-out. Listeners hold an
//! [`AuthSubscription`]; dropping it unsubscribes.

use tokio::sync::broadcast;

use sparepart_nexus_core::UserId;

/// Buffered events per subscriber before the slowest one starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedUp,
    TokenRefreshed,
    SignedOut,
}

impl AuthEventKind {
    /// Short name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignedIn => "signed_in",
            Self::SignedUp => "signed_up",
            Self::TokenRefreshed => "token_refreshed",
            Self::SignedOut => "signed_out",
        }
    }
}

/// An auth transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    /// The user after the transition. `None` for sign-out.
    pub user_id: Option<UserId>,
}

/// Publisher side.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn publish(&self, kind: AuthEventKind, user_id: Option<UserId>) {
        let _ = self.sender.send(AuthEvent { kind, user_id });
    }

    /// Open a new subscription that sees events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: Some(self.sender.subscribe()),
        }
    }
}

/// A cancellable listener handle.
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: Option<broadcast::Receiver<AuthEvent>>,
}

impl AuthSubscription {
    /// Wait for the next event.
    ///
    /// Returns `None` once unsubscribed or when the gateway is gone. Events
    /// missed while lagging are skipped.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Stop listening. Idempotent.
    pub fn unsubscribe(&mut self) {
        if self.receiver.take().is_some() {
            tracing::debug!("Auth subscription released");
        }
    }

    /// Whether the handle still receives events.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
