//! Background listener for gateway auth changes.
//!
//! Holds one [`AuthSubscription`] for the life of the server and records each
//! transition in the logs and as a Sentry breadcrumb.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::add_breadcrumb;
use crate::gateway::{AuthEvent, AuthSubscription, Gateway};

/// Spawn the watcher. Abort the handle at shutdown.
#[must_use]
pub fn spawn(gateway: &Arc<dyn Gateway>) -> JoinHandle<()> {
    let subscription = gateway.subscribe();
    tokio::spawn(watch(subscription))
}

async fn watch(mut subscription: AuthSubscription) {
    while let Some(event) = subscription.next().await {
        record(&event);
    }
    tracing::debug!("Auth watcher stopped");
}

fn record(event: &AuthEvent) {
    let user_id = event.user_id.map(|id| id.to_string());
    tracing::info!(
        event = event.kind.as_str(),
        user_id = user_id.as_deref(),
        "Auth state changed"
    );

    let data = user_id.as_deref().map(|id| [("user_id", id)]);
    add_breadcrumb("auth", event.kind.as_str(), data.as_ref().map(|d| d.as_slice()));
}
