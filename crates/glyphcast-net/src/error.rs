use thiserror::Error;

/// Transport errors.
///
/// Clone because callers may share one failed result between several
/// waiters of a deduplicated request.
#[derive(Debug, Error, Clone)]
pub enum NetError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Timeout")]
    Timeout,

    #[error("Request failed after {max_retries} retries: {source}")]
    RetryExhausted {
        max_retries: u32,
        source: Box<NetError>,
    },
}

impl NetError {
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Self::Http(msg.into())
    }

    pub fn http_status(status: u16, url: String) -> Self {
        Self::HttpStatus { status, url }
    }

    /// Whether a retry layer may reasonably re-issue the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetError::Timeout => true,
            NetError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetError::Http(msg) => {
                msg.contains("timeout") || msg.contains("connection") || msg.contains("network")
            }
            NetError::RetryExhausted { .. } => false,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }
        Self::Http(error.to_string())
    }
}

pub type NetResult<T> = Result<T, NetError>;
