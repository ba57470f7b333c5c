//! Fetch adapter: the only place the request cache touches the network.

use crate::domain::error::CacheError;
use crate::domain::traits::Transport;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::request_cache::{FetchRequest, RequestCache};

/// `Accept: application/json` merged with caller headers, caller wins
pub fn merge_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    if !headers.keys().any(|name| name.eq_ignore_ascii_case("accept")) {
        merged.insert("Accept".to_string(), "application/json".to_string());
    }
    merged.extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// GET `url` and parse the body as JSON.
///
/// Non-2xx is an `Http` error carrying the status; an unparseable body is a
/// `Parse` error. Neither is swallowed here.
pub async fn fetch_json(
    transport: &dyn Transport,
    url: &str,
    headers: &BTreeMap<String, String>,
) -> Result<Value, CacheError> {
    let response = transport.send(url, &merge_headers(headers)).await?;
    if !response.is_success() {
        return Err(CacheError::http(response.status, response.status_text));
    }
    Ok(serde_json::from_slice(&response.body)?)
}

impl RequestCache {
    pub(super) async fn fetch_and_cache(
        &self,
        request: &FetchRequest,
    ) -> Result<Arc<Value>, CacheError> {
        debug!(url = %request.url, seq = request.seq, "fetching");
        let data = Arc::new(
            fetch_json(self.inner.transport.as_ref(), &request.url, &request.headers).await?,
        );
        self.commit(request, Arc::clone(&data));
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::RawResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        response: RawResponse,
        seen: Mutex<Vec<BTreeMap<String, String>>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn send(
            &self,
            _url: &str,
            headers: &BTreeMap<String, String>,
        ) -> Result<RawResponse, CacheError> {
            self.seen.lock().unwrap().push(headers.clone());
            Ok(self.response.clone())
        }
    }

    fn recorder(status: u16, status_text: &str, body: &str) -> Recorder {
        Recorder {
            response: RawResponse {
                status,
                status_text: status_text.to_string(),
                body: body.as_bytes().to_vec(),
            },
            seen: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn sends_accept_json_by_default() {
        let transport = recorder(200, "OK", "{}");
        let mut headers = BTreeMap::new();
        headers.insert("X-Api".to_string(), "1".to_string());

        fetch_json(&transport, "/x", &headers).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].get("Accept").map(String::as_str), Some("application/json"));
        assert_eq!(seen[0].get("X-Api").map(String::as_str), Some("1"));
    }

    #[test]
    fn caller_accept_header_wins() {
        let mut headers = BTreeMap::new();
        headers.insert("accept".to_string(), "text/plain".to_string());
        let merged = merge_headers(&headers);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get("accept").map(String::as_str), Some("text/plain"));
    }

    #[tokio::test]
    async fn non_2xx_is_http_error() {
        let transport = recorder(503, "Service Unavailable", "oops");
        let err = fetch_json(&transport, "/x", &BTreeMap::new())
            .await
            .unwrap_err();
        assert_eq!(err, CacheError::http(503, "Service Unavailable"));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let transport = recorder(200, "OK", "<html>");
        let err = fetch_json(&transport, "/x", &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Parse(_)));
    }
}
