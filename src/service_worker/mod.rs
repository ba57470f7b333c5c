//! Offline response cache for the app shell and static assets.
//!
//! Runs at the request-interception layer, independent of the request
//! cache: cross-origin and API traffic passes straight through.

mod request;
mod storage;
mod worker;

pub use request::{Destination, RequestMode, SwRequest, SwResponse};
pub use storage::{Bucket, CacheStorage, EntryMeta};
pub use worker::{
    app_bucket_name, static_bucket_name, InstallReport, LifecycleState, Network, PassReason,
    Route, ServiceWorker, CACHED_TIME_HEADER, CACHE_PREFIX,
};
