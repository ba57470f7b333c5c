//! Named response buckets with an insertion-time side-table.

use super::request::SwResponse;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub cached_at: Instant,
    pub cached_at_epoch_ms: i64,
}

/// One named cache.
///
/// Responses are stored untouched; when they were stored lives in `metadata`
/// under the same key.
#[derive(Debug, Default)]
pub struct Bucket {
    responses: DashMap<String, SwResponse>,
    metadata: DashMap<String, EntryMeta>,
}

impl Bucket {
    pub fn put(&self, key: &str, response: SwResponse) {
        let meta = EntryMeta {
            cached_at: Instant::now(),
            cached_at_epoch_ms: Utc::now().timestamp_millis(),
        };
        self.responses.insert(key.to_string(), response);
        self.metadata.insert(key.to_string(), meta);
    }

    pub fn lookup(&self, key: &str) -> Option<(SwResponse, EntryMeta)> {
        let response = self.responses.get(key)?.clone();
        let meta = *self.metadata.get(key)?;
        Some((response, meta))
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

/// Every bucket of one origin, shared by all clients.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    buckets: Arc<DashMap<String, Arc<Bucket>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `name`, creating it empty when missing
    pub fn open(&self, name: &str) -> Arc<Bucket> {
        Arc::clone(
            self.buckets
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Bucket::default()))
                .value(),
        )
    }

    pub fn delete(&self, name: &str) -> bool {
        self.buckets.remove(name).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.iter().map(|b| b.key().clone()).collect();
        names.sort();
        names
    }
}
