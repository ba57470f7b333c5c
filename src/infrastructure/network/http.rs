// HTTP client utilities
use crate::domain::error::{CacheError, SwError};
use crate::domain::traits::{RawResponse, Transport};
use crate::infrastructure::config::Config;
use crate::service_worker::{Network, SwRequest, SwResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::BTreeMap;

/// Create the shared HTTP client, honouring `http_proxy` from the config
pub fn create_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(concat!("stellar-tales/", env!("CARGO_PKG_VERSION")));

    if let Some(proxy) = config.http_proxy.as_deref().filter(|p| !p.is_empty()) {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }

    builder.build()
}

/// `Transport` backed by a pooled reqwest client
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn to_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, CacheError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CacheError::Network(format!("invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CacheError::Network(format!("invalid header value: {}", e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<RawResponse, CacheError> {
        let response = self
            .client
            .get(url)
            .headers(to_header_map(headers)?)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl Network for ReqwestTransport {
    async fn fetch(&self, request: &SwRequest) -> Result<SwResponse, SwError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| SwError::Network(e.to_string()))?;
        let response = self
            .client
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| SwError::Network(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| SwError::Network(e.to_string()))?;

        Ok(SwResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_keeps_every_header() {
        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("X-Trace".to_string(), "abc".to_string());

        let map = to_header_map(&headers).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["accept"], "application/json");
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            to_header_map(&headers),
            Err(CacheError::Network(_))
        ));
    }
}
