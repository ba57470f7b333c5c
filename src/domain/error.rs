use thiserror::Error;

/// Failure of a cached request.
///
/// Cloneable because one in-flight request hands the same outcome to every
/// caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {status}: {status_text}")]
    Http { status: u16, status_text: String },

    #[error("JSON parse error: {0}")]
    Parse(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl CacheError {
    pub fn http(status: u16, status_text: impl Into<String>) -> Self {
        Self::Http {
            status,
            status_text: status_text.into(),
        }
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Upstream payload did not match what an endpoint promises.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("unsupported upstream shape: expected {expected}, got {found}")]
    Unexpected {
        expected: &'static str,
        found: &'static str,
    },

    #[error("header row is missing or malformed")]
    BadHeader,

    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

/// Why a normalizer swapped live data for its fallback payload.
#[derive(Error, Debug, Clone)]
pub enum FeedError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Invalid(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwError {
    #[error("invalid lifecycle transition from {from:?} via {event}")]
    InvalidTransition {
        from: crate::service_worker::LifecycleState,
        event: &'static str,
    },

    #[error("network request failed: {0}")]
    Network(String),

    #[error("invalid request url `{0}`")]
    BadUrl(String),
}
