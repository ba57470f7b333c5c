//! Lifecycle, routing and fetch handling of the offline response cache.

use super::request::{Destination, SwRequest, SwResponse};
use super::storage::{Bucket, CacheStorage, EntryMeta};
use crate::domain::error::SwError;
use crate::infrastructure::config::ServiceWorkerConfig;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const CACHE_PREFIX: &str = "stellar-tales";
/// Epoch millis at which a served response was stored
pub const CACHED_TIME_HEADER: &str = "sw-cached-time";

const DEV_TOOLING_PREFIXES: &[&str] = &[
    "/@vite",
    "/@react-refresh",
    "/@id/",
    "/@fs/",
    "/__vite",
    "/node_modules/",
    "/src/",
    "/sockjs-node",
];

const API_PATTERNS: &[&str] = &[
    "api.nasa.gov",
    "images-api.nasa.gov",
    "services.swpc.noaa.gov",
    "/api/",
];

const STATIC_EXTENSIONS: &[&str] = &[
    "js", "mjs", "css", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "woff", "woff2",
    "ttf", "otf", "mp3", "wav", "ogg", "webmanifest",
];

/// Network seam for the worker's own fetches
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &SwRequest) -> Result<SwResponse, SwError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Installing,
    /// Installed and waiting to activate
    Installed,
    Activating,
    Activated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    CrossOrigin,
    DevTooling,
    ApiPath,
    NonGet,
    Unmatched,
    NotActivated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Passthrough(PassReason),
    Navigation,
    StaticAsset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<String>,
}

pub fn app_bucket_name(version: &str) -> String {
    format!("{}-app-{}", CACHE_PREFIX, version)
}

pub fn static_bucket_name(version: &str) -> String {
    format!("{}-static-{}", CACHE_PREFIX, version)
}

fn looks_static(request: &SwRequest) -> bool {
    let by_destination = matches!(
        request.destination,
        Destination::Script
            | Destination::Style
            | Destination::Image
            | Destination::Font
            | Destination::Manifest
            | Destination::Audio
    );
    let by_extension = request
        .url
        .path()
        .rsplit('/')
        .next()
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| STATIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    by_destination || by_extension
}

fn stamped(response: SwResponse, meta: &EntryMeta) -> SwResponse {
    response.with_header(CACHED_TIME_HEADER, meta.cached_at_epoch_ms.to_string())
}

pub struct ServiceWorker<N: Network> {
    version: String,
    origin: Url,
    shell_assets: Vec<String>,
    app_max_age: Duration,
    static_max_age: Duration,
    storage: CacheStorage,
    network: N,
    state: LifecycleState,
    clients_claimed: bool,
}

impl<N: Network> ServiceWorker<N> {
    pub fn new(
        config: &ServiceWorkerConfig,
        storage: CacheStorage,
        network: N,
    ) -> Result<Self, SwError> {
        let origin =
            Url::parse(&config.origin).map_err(|_| SwError::BadUrl(config.origin.clone()))?;
        Ok(Self {
            version: config.version.clone(),
            origin,
            shell_assets: config.shell_assets.clone(),
            app_max_age: config.app_max_age(),
            static_max_age: config.static_max_age(),
            storage,
            network,
            state: LifecycleState::Installing,
            clients_claimed: false,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn app_bucket(&self) -> String {
        app_bucket_name(&self.version)
    }

    pub fn static_bucket(&self) -> String {
        static_bucket_name(&self.version)
    }

    fn transition(
        &mut self,
        expected: LifecycleState,
        next: LifecycleState,
        event: &'static str,
    ) -> Result<(), SwError> {
        if self.state != expected {
            return Err(SwError::InvalidTransition {
                from: self.state,
                event,
            });
        }
        self.state = next;
        Ok(())
    }

    fn asset_url(&self, asset: &str) -> Result<Url, SwError> {
        self.origin
            .join(asset)
            .map_err(|_| SwError::BadUrl(asset.to_string()))
    }

    /// Pre-cache the app shell. A missing asset is logged, never fatal.
    pub async fn install(&mut self) -> Result<InstallReport, SwError> {
        if self.state != LifecycleState::Installing {
            return Err(SwError::InvalidTransition {
                from: self.state,
                event: "install",
            });
        }

        let bucket = self.storage.open(&self.app_bucket());
        let mut report = InstallReport::default();

        for asset in &self.shell_assets {
            match self.precache(&bucket, asset).await {
                Ok(()) => report.cached.push(asset.clone()),
                Err(e) => {
                    warn!(asset = %asset, error = %e, "failed to pre-cache asset");
                    report.failed.push(asset.clone());
                }
            }
        }

        self.transition(LifecycleState::Installing, LifecycleState::Installed, "install")?;
        info!(
            version = %self.version,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "service worker installed"
        );
        Ok(report)
    }

    async fn precache(&self, bucket: &Bucket, asset: &str) -> Result<(), SwError> {
        let url = self.asset_url(asset)?;
        let request = SwRequest::get(url.as_str(), Destination::Empty)?;
        let response = self.network.fetch(&request).await?;
        if !response.is_success() {
            return Err(SwError::Network(format!(
                "{} {}",
                response.status, response.status_text
            )));
        }
        bucket.put(&request.cache_key(), response);
        Ok(())
    }

    /// Drop every bucket outside this version's pair, then take over open clients.
    ///
    /// Returns the deleted bucket names.
    pub fn activate(&mut self) -> Result<Vec<String>, SwError> {
        self.transition(
            LifecycleState::Installed,
            LifecycleState::Activating,
            "activate",
        )?;

        let allowed = [self.app_bucket(), self.static_bucket()];
        let deleted: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|name| !allowed.contains(name))
            .filter(|name| self.storage.delete(name))
            .collect();
        for name in &deleted {
            info!(bucket = %name, "deleted old cache");
        }

        self.clients_claimed = true;
        self.transition(
            LifecycleState::Activating,
            LifecycleState::Activated,
            "activate",
        )?;
        Ok(deleted)
    }

    pub fn classify(&self, request: &SwRequest) -> Route {
        if self.state != LifecycleState::Activated {
            return Route::Passthrough(PassReason::NotActivated);
        }
        if request.url.origin() != self.origin.origin() {
            return Route::Passthrough(PassReason::CrossOrigin);
        }

        let path = request.url.path();
        if DEV_TOOLING_PREFIXES.iter().any(|p| path.starts_with(p)) || path.contains("hot-update")
        {
            return Route::Passthrough(PassReason::DevTooling);
        }
        if API_PATTERNS.iter().any(|p| request.url.as_str().contains(p)) {
            return Route::Passthrough(PassReason::ApiPath);
        }
        if request.method != "GET" {
            return Route::Passthrough(PassReason::NonGet);
        }
        if request.is_navigation() {
            return Route::Navigation;
        }
        if looks_static(request) {
            return Route::StaticAsset;
        }
        Route::Passthrough(PassReason::Unmatched)
    }

    /// Answer an intercepted request.
    ///
    /// Pass-through requests fail like the network does; cached routes
    /// always produce a response.
    pub async fn handle_fetch(&self, request: &SwRequest) -> Result<SwResponse, SwError> {
        match self.classify(request) {
            Route::Passthrough(reason) => {
                debug!(url = %request.url, ?reason, "pass-through");
                self.network.fetch(request).await
            }
            Route::Navigation => Ok(self
                .cache_first(request, &self.app_bucket(), self.app_max_age)
                .await),
            Route::StaticAsset => Ok(self
                .cache_first(request, &self.static_bucket(), self.static_max_age)
                .await),
        }
    }

    async fn cache_first(
        &self,
        request: &SwRequest,
        bucket_name: &str,
        max_age: Duration,
    ) -> SwResponse {
        let bucket = self.storage.open(bucket_name);
        let key = request.cache_key();
        let cached = bucket.lookup(&key);

        if let Some((response, meta)) = &cached {
            if meta.cached_at.elapsed() < max_age {
                debug!(url = %key, "served from cache");
                return stamped(response.clone(), meta);
            }
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    bucket.put(&key, response.clone());
                }
                response
            }
            Err(e) => {
                warn!(url = %key, error = %e, "network failed, falling back to cache");
                if let Some((response, meta)) = cached {
                    return stamped(response, &meta);
                }
                if request.is_navigation() {
                    if let Some((response, meta)) = self.cached_root(&bucket) {
                        return stamped(response, &meta);
                    }
                }
                SwResponse::offline()
            }
        }
    }

    fn cached_root(&self, bucket: &Bucket) -> Option<(SwResponse, EntryMeta)> {
        ["/", "/index.html"]
            .iter()
            .filter_map(|path| self.origin.join(path).ok())
            .find_map(|url| bucket.lookup(url.as_str()))
    }
}
