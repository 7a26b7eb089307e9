use thiserror::Error;

/// The input could not be turned into a usable document tree.
#[derive(Debug, Error)]
#[error("markup could not be parsed into a document tree ({} diagnostics)", diagnostics.len())]
pub struct MarkupError {
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} returned an empty body")]
    Empty { url: String },
    #[error("cache error: {0}")]
    Cache(#[from] std::io::Error),
}

impl FetchError {
    /// Rate limiting and server-side failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("invalid entity id {0}, must be a positive number")]
    InvalidId(i64),
    #[error("invalid court id {0}, expected 1..=9")]
    InvalidCourt(u8),
    #[error("invalid detail link '{0}'")]
    InvalidLink(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Markup(#[from] MarkupError),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output format [{0}] not supported")]
    UnsupportedFormat(String),
    #[error("illegal character in {kind} name '{name}' in node '{node}'")]
    InvalidName {
        kind: &'static str,
        name: String,
        node: String,
    },
    #[error("xml writer error: {0}")]
    Xml(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
