use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use reqwest::{Method, RequestBuilder, StatusCode, Url, header::HeaderMap};
use serde::{Serialize, de::DeserializeOwned};

use super::{
    error::{HttpClientError, HttpClientResult},
    keep_alive::{HeaderKeepAliveStrategy, KeepAliveStrategy},
    pool::ConnectionManager,
};
use crate::config::HttpClientConfig;

/// A fully read response together with the keep-alive granted to its
/// connection.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub keep_alive: Duration,
}

impl HttpResponse {
    pub fn json<T: DeserializeOwned>(&self) -> HttpClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn ensure_success(self) -> HttpClientResult<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(HttpClientError::Status(self.status))
        }
    }
}

#[derive(Clone)]
pub struct PooledHttpClient {
    manager: ConnectionManager,
    keep_alive: Arc<dyn KeepAliveStrategy>,
}

impl PooledHttpClient {
    pub fn new(manager: ConnectionManager, keep_alive: Arc<dyn KeepAliveStrategy>) -> Self {
        Self {
            manager,
            keep_alive,
        }
    }

    pub fn from_config(config: &HttpClientConfig) -> HttpClientResult<Self> {
        let manager = ConnectionManager::new(config)?;
        let keep_alive = HeaderKeepAliveStrategy::new(config.default_keep_alive());
        Ok(Self::new(manager, Arc::new(keep_alive)))
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Sends one request through a pooled route client and reads the whole
    /// body before the lease goes back to the pool.
    pub async fn execute<F>(
        &self,
        method: Method,
        url: &str,
        configure: F,
    ) -> HttpClientResult<HttpResponse>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let parsed = Url::parse(url).map_err(|err| HttpClientError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        let lease = self.manager.lease(&parsed).await?;

        let request = configure(lease.client().request(method.clone(), parsed));
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let keep_alive = self.keep_alive.keep_alive_duration(&headers);
        tracing::debug!(
            %method,
            route = %lease.route(),
            status = status.as_u16(),
            keep_alive = ?keep_alive,
            "request completed"
        );
        lease.complete(keep_alive);

        Ok(HttpResponse {
            status,
            headers,
            body,
            keep_alive,
        })
    }

    pub async fn get(&self, url: &str) -> HttpClientResult<HttpResponse> {
        self.execute(Method::GET, url, |request| request).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> HttpClientResult<T> {
        self.get(url).await?.ensure_success()?.json()
    }

    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> HttpClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, url, |request| request.json(body))
            .await?
            .ensure_success()?
            .json()
    }
}
