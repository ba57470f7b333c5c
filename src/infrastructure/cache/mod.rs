//! In-memory request cache for upstream JSON feeds.
//!
//! - Entries are valid for a per-call ttl and refreshed in the background
//!   once past a fraction of it
//! - At most one request per key is in flight
//! - A failed fetch serves the last good payload when there is one

mod fetch;
mod key;
mod request_cache;

pub use fetch::{fetch_json, merge_headers};
pub use key::cache_key;
pub use request_cache::{CacheStats, RequestCache, RequestOptions};
