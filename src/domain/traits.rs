use crate::domain::error::CacheError;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Status line and body of an HTTP response, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for the network seam under the request cache
///
/// Implementations only move bytes. Status checks and JSON parsing belong to
/// the fetch adapter so every transport fails the same way.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request with the given headers
    async fn send(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<RawResponse, CacheError>;
}
