//! Shared application state
//!
//! Built once at startup and handed to axum as `Arc<AppState>`. The registry
//! lives here rather than in a global so tests can build as many independent
//! servers as they like.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::{CallTerminator, DeferredActionRegistry, EventDispatcher, VapiClient};

pub struct AppState {
    pub config: ServerConfig,
    pub dispatcher: EventDispatcher,
    /// `None` when no Vapi credential is configured; webhooks then fail with 500
    pub terminator: Option<Arc<dyn CallTerminator>>,
}

impl AppState {
    /// Create state backed by the real Vapi client
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let terminator = VapiClient::from_config(&config)
            .map(|client| Arc::new(client) as Arc<dyn CallTerminator>);
        Self::with_terminator(config, terminator)
    }

    /// Create state with an explicit call terminator
    pub fn with_terminator(
        config: ServerConfig,
        terminator: Option<Arc<dyn CallTerminator>>,
    ) -> Arc<Self> {
        let dispatcher = EventDispatcher::new(DeferredActionRegistry::new(), config.grace_period());
        Arc::new(Self {
            config,
            dispatcher,
            terminator,
        })
    }

    pub fn registry(&self) -> &DeferredActionRegistry {
        self.dispatcher.registry()
    }
}
