use std::sync::Arc;

use tfsgate_client::{Connector, SessionPool};
use tfsgate_transfer::TransferEngine;
use tracing::Level;

use crate::GatewayConfig;

/// Changes the process log level at runtime.
pub type LevelSetter = Arc<dyn Fn(Level) -> Result<(), String> + Send + Sync>;

/// Shared state handed to every handler.
pub struct AppState<C: Connector> {
    pub config: GatewayConfig,
    pub pool: SessionPool<C>,
    pub engine: TransferEngine,
    pub log_level: Option<LevelSetter>,
}

impl<C: Connector> AppState<C> {
    pub fn new(config: GatewayConfig, connector: C) -> Self {
        let engine = TransferEngine::new(config.chunk_size).with_policy(config.write_policy);
        Self {
            config,
            pool: SessionPool::new(connector),
            engine,
            log_level: None,
        }
    }

    /// Enables `PUT /admin/log-level`.
    pub fn with_log_level(mut self, setter: LevelSetter) -> Self {
        self.log_level = Some(setter);
        self
    }
}
