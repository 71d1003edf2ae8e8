use thiserror::Error;

#[derive(Error, Debug)]
pub enum CadentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No hosts configured")]
    NoHosts,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CadentError {
    /// True for failures talking to a host (as opposed to bad payloads or config).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CadentError::Transport(_) | CadentError::Timeout(_) | CadentError::Http { .. }
        )
    }
}

impl From<url::ParseError> for CadentError {
    fn from(err: url::ParseError) -> Self {
        CadentError::InvalidUrl(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CadentError>;
