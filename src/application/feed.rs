use crate::domain::error::{FeedError, ShapeError};
use crate::domain::model::Feed;
use crate::infrastructure::cache::{RequestCache, RequestOptions};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Fetch `url` through the cache, normalize it, and never fail.
///
/// Any cache or shape error is logged and replaced by `fallback()`.
pub async fn load_feed<T>(
    cache: &RequestCache,
    name: &'static str,
    url: &str,
    ttl: Duration,
    parse: impl FnOnce(&Value) -> Result<T, ShapeError>,
    fallback: impl FnOnce() -> T,
) -> Feed<T> {
    match fetch_parsed(cache, url, ttl, parse).await {
        Ok(data) => Feed::live(data),
        Err(e) => {
            warn!(feed = name, error = %e, "feed unavailable, using fallback data");
            Feed::fallback(fallback())
        }
    }
}

async fn fetch_parsed<T>(
    cache: &RequestCache,
    url: &str,
    ttl: Duration,
    parse: impl FnOnce(&Value) -> Result<T, ShapeError>,
) -> Result<T, FeedError> {
    let value = cache.get(url, &RequestOptions::with_ttl(ttl)).await?;
    Ok(parse(&value)?)
}
