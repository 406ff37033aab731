#![forbid(unsafe_code)]

use thiserror::Error;

/// Streaming core errors.
///
/// Clone because a single failed fetch may be observed by every waiter
/// that joined the in-flight operation.
#[derive(Debug, Error, Clone)]
pub enum StreamError {
    #[error("Network error: {0}")]
    Net(#[from] glyphcast_net::NetError),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Session not initialized")]
    NotInitialized,
}

pub type StreamResult<T> = Result<T, StreamError>;
