//! Central application state management
//!
//! Single source of truth for handler dependencies: everything reachable
//! from requests goes through `AppState` rather than scattered Arc
//! references.

use std::sync::Arc;

use crate::config::Config;
use crate::services::MonitorEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MonitorEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire all application dependencies
    pub fn initialize(config: Config) -> Self {
        tracing::info!("Initializing application state");

        let engine = Arc::new(MonitorEngine::new(config.clone()));

        Self {
            engine,
            config: Arc::new(config),
        }
    }
}
