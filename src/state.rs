use crate::application::donki::DonkiClient;
use crate::application::swpc::SwpcClient;
use crate::domain::traits::Transport;
use crate::infrastructure::cache::RequestCache;
use crate::infrastructure::config::Config;
use std::sync::Arc;

/// Composition root: owns the one request cache and hands it to the feeds.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: RequestCache,
    pub donki: DonkiClient,
    pub swpc: SwpcClient,
}

impl AppState {
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        let cache = RequestCache::new(&config.cache, transport);
        let donki = DonkiClient::new(cache.clone(), &config.nasa);
        let swpc = SwpcClient::new(cache.clone(), &config.swpc);

        Self {
            config: Arc::new(config),
            cache,
            donki,
            swpc,
        }
    }
}
