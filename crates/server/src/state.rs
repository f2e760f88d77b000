use std::sync::Arc;

use renditions_core::{Config, LoaderExecutor, RenditionService, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    renditions: RenditionService,
    executor: Arc<LoaderExecutor>,
}

impl AppState {
    pub fn new(config: Config, renditions: RenditionService, executor: Arc<LoaderExecutor>) -> Self {
        Self {
            config,
            renditions,
            executor,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn renditions(&self) -> &RenditionService {
        &self.renditions
    }

    pub fn executor(&self) -> &Arc<LoaderExecutor> {
        &self.executor
    }
}
