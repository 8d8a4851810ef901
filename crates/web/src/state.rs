//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{GatewayConfig, WebConfig};
use crate::gateway::{Gateway, GatewayError, InMemoryGateway, SupabaseGateway};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the gateway and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    gateway: Arc<dyn Gateway>,
}

impl AppState {
    /// Create application state around an existing gateway.
    #[must_use]
    pub fn new(config: WebConfig, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, gateway }),
        }
    }

    /// Create application state with the gateway selected in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Supabase client cannot be built.
    pub fn from_config(config: WebConfig) -> Result<Self, GatewayError> {
        let gateway: Arc<dyn Gateway> = match &config.gateway {
            GatewayConfig::Supabase(supabase) => Arc::new(SupabaseGateway::new(supabase)?),
            GatewayConfig::InMemory => {
                tracing::warn!("Using in-memory gateway; data is lost on restart");
                Arc::new(InMemoryGateway::new())
            }
        };
        Ok(Self::new(config, gateway))
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the gateway.
    #[must_use]
    pub fn gateway(&self) -> &dyn Gateway {
        self.inner.gateway.as_ref()
    }

    /// Get an owned handle to the gateway, for background tasks.
    #[must_use]
    pub fn gateway_handle(&self) -> Arc<dyn Gateway> {
        Arc::clone(&self.inner.gateway)
    }
}
