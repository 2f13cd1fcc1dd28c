use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};

use reqwest::{Client, Url};
use tokio::{
    sync::{OwnedSemaphorePermit, Semaphore},
    time::{Instant, timeout},
};

use super::{
    error::{HttpClientError, HttpClientResult},
    tls::build_tls_config,
};
use crate::config::HttpClientConfig;

/// Scheme, host and port a pooled client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    scheme: String,
    host: String,
    port: u16,
}

impl Route {
    pub fn from_url(url: &Url) -> HttpClientResult<Self> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(HttpClientError::UnsupportedScheme(scheme.to_string()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| HttpClientError::MissingHost(url.to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| HttpClientError::UnsupportedScheme(scheme.to_string()))?;

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_ascii_lowercase(),
            port,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub routes: usize,
    pub leased: usize,
    pub available: usize,
    pub max_total: usize,
}

#[derive(Debug, Clone, Copy)]
struct PoolSettings {
    connect_timeout: Duration,
    request_timeout: Duration,
    socket_timeout: Duration,
    max_total: usize,
}

struct RouteEntry {
    client: Client,
    last_used: Instant,
    expires_at: Option<Instant>,
    leased: usize,
}

impl RouteEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_used)
    }
}

struct PoolInner {
    settings: PoolSettings,
    tls: rustls::ClientConfig,
    permits: Arc<Semaphore>,
    routes: Mutex<HashMap<Route, RouteEntry>>,
}

/// Shared pool of per-route reqwest clients. At most `max_total` leases are
/// outstanding at once; dropping a route's client closes its sockets.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<PoolInner>,
}

/// Handle that does not keep the pool alive.
#[derive(Clone)]
pub struct WeakConnectionManager {
    inner: Weak<PoolInner>,
}

impl WeakConnectionManager {
    pub fn upgrade(&self) -> Option<ConnectionManager> {
        self.inner.upgrade().map(|inner| ConnectionManager { inner })
    }
}

impl ConnectionManager {
    pub fn new(config: &HttpClientConfig) -> HttpClientResult<Self> {
        let settings = PoolSettings {
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
            socket_timeout: config.socket_timeout(),
            max_total: config.max_total_connections.min(Semaphore::MAX_PERMITS),
        };
        let tls = build_tls_config(config.trust_self_signed)?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                settings,
                tls,
                permits: Arc::new(Semaphore::new(settings.max_total)),
                routes: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn downgrade(&self) -> WeakConnectionManager {
        WeakConnectionManager {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Waits up to the request timeout for a free slot, then checks out the
    /// client for the URL's route.
    pub async fn lease(&self, url: &Url) -> HttpClientResult<ConnectionLease> {
        let route = Route::from_url(url)?;
        let wait = self.inner.settings.request_timeout;
        let permit = match timeout(wait, self.inner.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(HttpClientError::PoolClosed),
            Err(_) => {
                tracing::warn!(route = %route, timeout = ?wait, "timed out waiting for pooled connection");
                return Err(HttpClientError::PoolTimeout(wait));
            }
        };

        let client = self.checkout(&route)?;
        Ok(ConnectionLease {
            manager: self.clone(),
            route,
            client,
            released: false,
            _permit: permit,
        })
    }

    fn checkout(&self, route: &Route) -> HttpClientResult<Client> {
        let now = Instant::now();
        let mut routes = self.routes()?;

        if let Some(entry) = routes.get_mut(route) {
            if entry.is_expired(now) {
                tracing::trace!(route = %route, "keep-alive expired; replacing route client");
                entry.client = self.build_client()?;
            }
            entry.leased += 1;
            entry.last_used = now;
            entry.expires_at = None;
            return Ok(entry.client.clone());
        }

        let client = self.build_client()?;
        tracing::debug!(route = %route, "opening route");
        routes.insert(
            route.clone(),
            RouteEntry {
                client: client.clone(),
                last_used: now,
                expires_at: None,
                leased: 1,
            },
        );
        Ok(client)
    }

    fn release(&self, route: &Route, keep_alive: Option<Duration>) {
        let now = Instant::now();
        // A keep-alive past the clock's range never expires; the idle sweep
        // still evicts the route.
        let expires_at = now.checked_add(keep_alive.unwrap_or(Duration::ZERO));
        let Ok(mut routes) = self.inner.routes.lock() else {
            tracing::warn!(route = %route, "pool lock poisoned; dropping lease");
            return;
        };
        if let Some(entry) = routes.get_mut(route) {
            entry.leased = entry.leased.saturating_sub(1);
            entry.last_used = now;
            entry.expires_at = expires_at;
        }
    }

    fn build_client(&self) -> HttpClientResult<Client> {
        let settings = &self.inner.settings;
        let client = Client::builder()
            .use_preconfigured_tls(self.inner.tls.clone())
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.socket_timeout)
            .pool_max_idle_per_host(settings.max_total)
            .pool_idle_timeout(None)
            .build()?;
        Ok(client)
    }

    /// Closes idle routes whose keep-alive has passed.
    pub fn close_expired_connections(&self) -> HttpClientResult<usize> {
        let now = Instant::now();
        self.evict(|entry| entry.is_expired(now))
    }

    /// Closes routes that have been idle for at least `idle`.
    pub fn close_idle_connections(&self, idle: Duration) -> HttpClientResult<usize> {
        let now = Instant::now();
        self.evict(|entry| entry.idle_for(now) >= idle)
    }

    fn evict(&self, should_close: impl Fn(&RouteEntry) -> bool) -> HttpClientResult<usize> {
        let mut routes = self.routes()?;
        let before = routes.len();
        routes.retain(|_, entry| entry.leased > 0 || !should_close(entry));
        Ok(before - routes.len())
    }

    pub fn stats(&self) -> HttpClientResult<PoolStats> {
        let routes = self.routes()?;
        Ok(PoolStats {
            routes: routes.len(),
            leased: routes.values().map(|entry| entry.leased).sum(),
            available: self.inner.permits.available_permits(),
            max_total: self.inner.settings.max_total,
        })
    }

    /// Rejects new leases and drops every route client.
    pub fn close(&self) {
        self.inner.permits.close();
        match self.inner.routes.lock() {
            Ok(mut routes) => routes.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.permits.is_closed()
    }

    #[cfg(test)]
    pub(crate) fn poison_for_test(&self) {
        let inner = Arc::clone(&self.inner);
        let _ = std::thread::spawn(move || {
            let _guard = inner.routes.lock();
            panic!("poisoning pool lock");
        })
        .join();
    }

    fn routes(&self) -> HttpClientResult<MutexGuard<'_, HashMap<Route, RouteEntry>>> {
        self.inner
            .routes
            .lock()
            .map_err(|_| HttpClientError::PoolPoisoned)
    }
}

/// A checked-out route client. Call [`ConnectionLease::complete`] once the
/// response has been read; a lease dropped without completing marks its
/// route as expired.
pub struct ConnectionLease {
    manager: ConnectionManager,
    route: Route,
    client: Client,
    released: bool,
    _permit: OwnedSemaphorePermit,
}

impl ConnectionLease {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn complete(mut self, keep_alive: Duration) {
        self.manager.release(&self.route, Some(keep_alive));
        self.released = true;
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        if !self.released {
            self.manager.release(&self.route, None);
        }
    }
}
