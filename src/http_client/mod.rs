//! Pooled outbound HTTP client: per-route reqwest clients behind a bounded
//! lease pool, keep-alive negotiation from response headers and a
//! background reaper for expired and idle routes.

mod client;
mod error;
mod keep_alive;
mod pool;
mod reaper;
mod tls;

pub use client::{HttpResponse, PooledHttpClient};
pub use error::{HttpClientError, HttpClientResult};
pub use keep_alive::{HeaderKeepAliveStrategy, KeepAliveStrategy};
pub use pool::{ConnectionLease, ConnectionManager, PoolStats, Route, WeakConnectionManager};
pub use reaper::IdleConnectionReaper;
pub use tls::{TrustSelfSignedVerifier, build_tls_config};

use crate::config::HttpClientConfig;

/// The pooled client plus its reaper, owned by the binary for the
/// lifetime of the server.
pub struct HttpClientRuntime {
    client: PooledHttpClient,
    reaper: IdleConnectionReaper,
}

impl HttpClientRuntime {
    /// Must be called from within a tokio runtime.
    pub fn start(config: &HttpClientConfig) -> HttpClientResult<Self> {
        let client = PooledHttpClient::from_config(config)?;
        let reaper = IdleConnectionReaper::spawn(
            client.manager(),
            config.reaper_interval(),
            config.idle_timeout(),
        );
        tracing::info!(
            max_total = config.max_total_connections,
            trust_self_signed = config.trust_self_signed,
            "http client pool started"
        );
        Ok(Self { client, reaper })
    }

    pub fn client(&self) -> &PooledHttpClient {
        &self.client
    }

    pub async fn shutdown(self) {
        self.reaper.shutdown().await;
        self.client.manager().close();
        tracing::info!("http client pool closed");
    }
}
