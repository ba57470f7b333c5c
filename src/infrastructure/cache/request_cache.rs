//! TTL request cache with in-flight de-duplication and background refresh.

use crate::domain::error::CacheError;
use crate::domain::traits::Transport;
use crate::infrastructure::config::CacheConfig;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::key::cache_key;

pub(super) type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Value>, CacheError>>>;

/// Per-call options for [`RequestCache::get`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Validity window; the cache default when `None`
    pub ttl: Option<Duration>,
    pub background_refresh: bool,
    pub force_refresh: bool,
    /// Only used to derive the cache key
    pub params: Value,
    pub headers: BTreeMap<String, String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            background_refresh: true,
            force_refresh: false,
            params: Value::Null,
            headers: BTreeMap::new(),
        }
    }
}

impl RequestOptions {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    pub fn without_background_refresh(mut self) -> Self {
        self.background_refresh = false;
        self
    }
}

#[derive(Debug, Clone)]
pub(super) struct CacheEntry {
    pub data: Arc<Value>,
    pub timestamp: Instant,
    /// Issue order of the fetch that produced this entry
    pub seq: u64,
}

pub(super) struct InFlight {
    pub seq: u64,
    pub request: SharedFetch,
}

/// Everything needed to run one fetch, owned so it can move into a task.
#[derive(Debug, Clone)]
pub(super) struct FetchRequest {
    pub key: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub seq: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub pending: usize,
    pub keys: Vec<String>,
}

pub(super) struct Inner {
    pub entries: DashMap<String, CacheEntry>,
    pub pending: DashMap<String, InFlight>,
    pub sequence: AtomicU64,
    pub transport: Arc<dyn Transport>,
    pub default_ttl: Duration,
    pub stale_fraction: f64,
    pub cleanup_interval: Duration,
}

/// Process-wide request cache.
///
/// Cloning is cheap; all clones share the same entries and pending table.
#[derive(Clone)]
pub struct RequestCache {
    pub(super) inner: Arc<Inner>,
}

struct Hit {
    data: Arc<Value>,
    stale: bool,
}

impl RequestCache {
    pub fn new(config: &CacheConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                pending: DashMap::new(),
                sequence: AtomicU64::new(0),
                transport,
                default_ttl: config.default_ttl(),
                stale_fraction: config.stale_fraction(),
                cleanup_interval: config.cleanup_interval(),
            }),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// Fetch `url` through the cache.
    ///
    /// 1. Valid entry and no force: return it, refreshing in the background
    ///    once it is past the stale threshold
    /// 2. Request for the key already in flight: share it
    /// 3. Otherwise start a new fetch
    ///
    /// A failed fetch falls back to whatever entry exists for the key, of any
    /// age, and only errors when there is none.
    pub async fn get(&self, url: &str, options: &RequestOptions) -> Result<Arc<Value>, CacheError> {
        let key = cache_key(url, &options.params);
        let ttl = options.ttl.unwrap_or(self.inner.default_ttl);

        if !options.force_refresh {
            if let Some(hit) = self.lookup(&key, ttl) {
                debug!(key = %key, stale = hit.stale, "cache hit");
                if hit.stale && options.background_refresh {
                    self.refresh_in_background(&key, url, &options.headers);
                }
                return Ok(hit.data);
            }
        }

        let request = self.claim(&key, url, &options.headers);
        match request.await {
            Ok(data) => Ok(data),
            Err(err) => {
                let stale = self
                    .inner
                    .entries
                    .get(&key)
                    .map(|entry| Arc::clone(&entry.data));
                match stale {
                    Some(data) => {
                        warn!(key = %key, error = %err, "fetch failed, serving stale cache");
                        Ok(data)
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// `get` followed by deserialization into `T`
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<T, CacheError> {
        let value = self.get(url, options).await?;
        Ok(T::deserialize(value.as_ref())?)
    }

    /// Seed an entry as if it had just been fetched
    pub fn prime(&self, url: &str, params: &Value, data: Value) {
        let key = cache_key(url, params);
        let entry = CacheEntry {
            data: Arc::new(data),
            timestamp: Instant::now(),
            seq: self.next_seq(),
        };
        self.inner.entries.insert(key, entry);
    }

    /// Drop entries older than twice the default ttl
    pub fn cleanup(&self) {
        let max_age = self.inner.default_ttl * 2;
        let before = self.inner.entries.len();
        self.inner
            .entries
            .retain(|_, entry| entry.timestamp.elapsed() <= max_age);
        let removed = before.saturating_sub(self.inner.entries.len());
        if removed > 0 {
            debug!(removed, "cache cleanup");
        }
    }

    /// Wipe entries and the pending table
    pub fn clear(&self) {
        self.inner.entries.clear();
        self.inner.pending.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self
            .inner
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();

        CacheStats {
            size: keys.len(),
            pending: self.inner.pending.len(),
            keys,
        }
    }

    /// Run [`cleanup`](Self::cleanup) on the configured interval.
    ///
    /// The task ends on its own once every handle to the cache is dropped.
    pub fn spawn_janitor(&self) -> JoinHandle<()> {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let period = self.inner.cleanup_interval.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                RequestCache { inner }.cleanup();
            }
        })
    }

    fn lookup(&self, key: &str, ttl: Duration) -> Option<Hit> {
        let entry = self.inner.entries.get(key)?;
        let age = entry.timestamp.elapsed();
        if age >= ttl {
            return None;
        }

        Some(Hit {
            data: Arc::clone(&entry.data),
            stale: age > ttl.mul_f64(self.inner.stale_fraction),
        })
    }

    fn next_seq(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Join the in-flight request for `key` or start one.
    ///
    /// Check and insert happen under the same shard lock, so at most one
    /// request per key is ever in flight. The fetch runs in its own task and
    /// clears its pending slot when it settles, even if every waiter is gone.
    fn claim(
        &self,
        key: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> SharedFetch {
        match self.inner.pending.entry(key.to_string()) {
            Entry::Occupied(in_flight) => {
                debug!(key = %key, "joining in-flight request");
                in_flight.get().request.clone()
            }
            Entry::Vacant(slot) => {
                let request = FetchRequest {
                    key: key.to_string(),
                    url: url.to_string(),
                    headers: headers.clone(),
                    seq: self.next_seq(),
                };
                let seq = request.seq;
                let cache = self.clone();

                let task = tokio::spawn(async move {
                    let result = cache.fetch_and_cache(&request).await;
                    cache
                        .inner
                        .pending
                        .remove_if(&request.key, |_, in_flight| in_flight.seq == request.seq);
                    result
                });

                let shared = async move {
                    match task.await {
                        Ok(result) => result,
                        Err(e) => Err(CacheError::Task(e.to_string())),
                    }
                }
                .boxed()
                .shared();

                slot.insert(InFlight {
                    seq,
                    request: shared.clone(),
                });
                shared
            }
        }
    }

    fn refresh_in_background(
        &self,
        key: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) {
        if self.inner.pending.contains_key(key) {
            return;
        }

        debug!(key = %key, "starting background refresh");
        let request = self.claim(key, url, headers);
        let key = key.to_string();
        tokio::spawn(async move {
            if let Err(e) = request.await {
                warn!(key = %key, error = %e, "background refresh failed");
            }
        });
    }

    /// Store a fetched payload unless a newer fetch already landed.
    pub(super) fn commit(&self, request: &FetchRequest, data: Arc<Value>) {
        let entry = CacheEntry {
            data,
            timestamp: Instant::now(),
            seq: request.seq,
        };

        match self.inner.entries.entry(request.key.clone()) {
            Entry::Occupied(mut current) => {
                if current.get().seq < request.seq {
                    current.insert(entry);
                } else {
                    debug!(key = %request.key, seq = request.seq, "discarding out-of-order response");
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::RawResponse;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticTransport(&'static str);

    #[async_trait]
    impl Transport for StaticTransport {
        async fn send(
            &self,
            _url: &str,
            _headers: &BTreeMap<String, String>,
        ) -> Result<RawResponse, CacheError> {
            Ok(RawResponse::ok(self.0))
        }
    }

    fn cache() -> RequestCache {
        RequestCache::new(&CacheConfig::default(), Arc::new(StaticTransport("[]")))
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_drops_entries_past_twice_the_default_ttl() {
        let cache = cache();
        cache.prime("/old", &Value::Null, json!(1));
        tokio::time::advance(Duration::from_secs(400)).await;
        cache.prime("/young", &Value::Null, json!(2));
        tokio::time::advance(Duration::from_secs(201)).await;

        cache.cleanup();

        assert_eq!(cache.stats().keys, vec!["/young".to_string()]);
    }

    #[tokio::test]
    async fn older_fetch_never_overwrites_newer_entry() {
        let cache = cache();
        let older = FetchRequest {
            key: "/k".to_string(),
            url: "/k".to_string(),
            headers: BTreeMap::new(),
            seq: cache.next_seq(),
        };
        let newer = FetchRequest {
            seq: cache.next_seq(),
            ..older.clone()
        };

        cache.commit(&newer, Arc::new(json!("new")));
        cache.commit(&older, Arc::new(json!("old")));

        let stored = cache.inner.entries.get("/k").map(|e| e.data.clone());
        assert_eq!(stored.as_deref(), Some(&json!("new")));
    }

    #[tokio::test]
    async fn clear_wipes_entries() {
        let cache = cache();
        cache.prime("/a", &Value::Null, json!(1));
        cache.prime("/b", &json!({"x": 1}), json!(2));
        assert_eq!(cache.stats().size, 2);

        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.pending, 0);
        assert!(stats.keys.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn janitor_sweeps_on_interval() {
        let config = CacheConfig {
            default_ttl_secs: 10,
            cleanup_interval_secs: 30,
            ..CacheConfig::default()
        };
        let cache = RequestCache::new(&config, Arc::new(StaticTransport("[]")));
        cache.prime("/a", &Value::Null, json!(1));
        let janitor = cache.spawn_janitor();

        tokio::time::sleep(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;

        assert_eq!(cache.stats().size, 0);
        janitor.abort();
    }

    #[test]
    fn options_builder() {
        let options = RequestOptions::with_ttl(Duration::from_secs(5))
            .params(json!({"q": 1}))
            .header("X-Test", "1")
            .force_refresh()
            .without_background_refresh();

        assert_eq!(options.ttl, Some(Duration::from_secs(5)));
        assert!(options.force_refresh);
        assert!(!options.background_refresh);
        assert_eq!(options.headers.get("X-Test").map(String::as_str), Some("1"));
    }
}
