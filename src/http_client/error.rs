use std::time::Duration;

use thiserror::Error;

pub type HttpClientResult<T> = Result<T, HttpClientError>;

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported url scheme '{0}'; expected http or https")]
    UnsupportedScheme(String),
    #[error("url '{0}' has no host")]
    MissingHost(String),
    #[error("timed out after {0:?} waiting for a pooled connection")]
    PoolTimeout(Duration),
    #[error("connection pool is closed")]
    PoolClosed,
    #[error("connection pool lock poisoned")]
    PoolPoisoned,
    #[error("tls configuration failed: {0}")]
    Tls(#[from] rustls::Error),
    #[error("certificate verifier setup failed: {0}")]
    Verifier(#[from] rustls::client::VerifierBuilderError),
    #[error("unexpected response status {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}
