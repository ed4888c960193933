use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::ForecastStore;
use crate::middleware::ResponseCache;

/// Shared per-process state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ForecastStore>,
    pub cache: ResponseCache,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ForecastStore>) -> Self {
        let cache = ResponseCache::new(&config.cache);
        Self {
            config: Arc::new(config),
            store,
            cache,
        }
    }
}
