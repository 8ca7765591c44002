//! Shared state handed to every request handler.

use std::sync::Arc;

use redis::aio::ConnectionManager;

use crate::config::Config;

/// Cloned into every handler; the connection manager and config are cheap to
/// share (the former wraps its own `Arc`, the latter is wrapped here).
#[derive(Clone)]
pub struct AppState {
    pub redis: ConnectionManager,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(redis: ConnectionManager, config: Config) -> Self {
        Self {
            redis,
            config: Arc::new(config),
        }
    }
}
