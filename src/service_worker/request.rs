use crate::domain::error::SwError;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    Cors,
}

/// What the page intends to do with the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Audio,
    /// `fetch()` / XHR
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwRequest {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl SwRequest {
    fn parse(url: &str) -> Result<Url, SwError> {
        Url::parse(url).map_err(|_| SwError::BadUrl(url.to_string()))
    }

    /// Full-page load
    pub fn navigate(url: &str) -> Result<Self, SwError> {
        Ok(Self {
            method: "GET".to_string(),
            url: Self::parse(url)?,
            mode: RequestMode::Navigate,
            destination: Destination::Document,
        })
    }

    pub fn get(url: &str, destination: Destination) -> Result<Self, SwError> {
        Ok(Self {
            method: "GET".to_string(),
            url: Self::parse(url)?,
            mode: RequestMode::Cors,
            destination,
        })
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Cache key: the url without its fragment
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl SwResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Last resort when neither cache nor network can answer
    pub fn offline() -> Self {
        Self {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: b"Offline".to_vec(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn with_header(mut self, name: &str, value: String) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value));
        self
    }
}
