use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub http_client: HttpClientConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_idle: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DEFAULT_DATABASE_URL.to_string(),
            max_connections: defaults::DEFAULT_DB_MAX_CONNECTIONS as u32,
            min_idle: defaults::DEFAULT_DB_MIN_IDLE as u32,
        }
    }
}

/// Outbound HTTP client pool tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpClientConfig {
    /// Time allowed to establish a TCP/TLS connection.
    pub connect_timeout_ms: u64,
    /// Time allowed to wait for a free connection from the pool.
    pub request_timeout_ms: u64,
    /// Time allowed between reads on an established connection.
    pub socket_timeout_ms: u64,
    /// Upper bound on connections leased at the same time, across all routes.
    pub max_total_connections: usize,
    /// Keep-alive applied when a response carries no `Keep-Alive: timeout=`.
    pub default_keep_alive_ms: u64,
    /// Connections idle for at least this long are closed by the reaper.
    pub idle_timeout_secs: u64,
    /// Delay between the end of one reaper sweep and the start of the next.
    pub reaper_interval_ms: u64,
    /// Trust servers presenting a single, self-signed certificate.
    pub trust_self_signed: bool,
}

impl HttpClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    pub fn default_keep_alive(&self) -> Duration {
        Duration::from_millis(self.default_keep_alive_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: defaults::DEFAULT_HTTP_CONNECT_TIMEOUT_MS,
            request_timeout_ms: defaults::DEFAULT_HTTP_REQUEST_TIMEOUT_MS,
            socket_timeout_ms: defaults::DEFAULT_HTTP_SOCKET_TIMEOUT_MS,
            max_total_connections: defaults::DEFAULT_HTTP_MAX_TOTAL_CONNECTIONS,
            default_keep_alive_ms: defaults::DEFAULT_HTTP_KEEP_ALIVE_MS,
            idle_timeout_secs: defaults::DEFAULT_HTTP_IDLE_TIMEOUT_SECS,
            reaper_interval_ms: defaults::DEFAULT_HTTP_REAPER_INTERVAL_MS,
            trust_self_signed: defaults::DEFAULT_HTTP_TRUST_SELF_SIGNED,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use super::AppConfig;
    use crate::config::EnvConfig;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_pool_settings() {
        let cfg = AppConfig::from_vars(HashMap::new()).expect("defaults should load");
        let http = &cfg.http_client;

        assert_eq!(http.connect_timeout(), Duration::from_secs(30));
        assert_eq!(http.request_timeout(), Duration::from_secs(30));
        assert_eq!(http.socket_timeout(), Duration::from_secs(60));
        assert_eq!(http.max_total_connections, 50);
        assert_eq!(http.default_keep_alive(), Duration::from_secs(20));
        assert_eq!(http.idle_timeout(), Duration::from_secs(30));
        assert_eq!(http.reaper_interval(), Duration::from_secs(1));
        assert!(http.trust_self_signed);
        assert_eq!(cfg.general.port, 3000);
    }

    #[test]
    fn nested_sections_read_from_prefixed_vars() {
        let cfg = AppConfig::from_vars(vars(&[
            ("APP_GENERAL__PORT", "8081"),
            ("APP_DATABASE__URL", "sqlite::memory:"),
            ("APP_HTTP_CLIENT__MAX_TOTAL_CONNECTIONS", "7"),
            ("APP_HTTP_CLIENT__TRUST_SELF_SIGNED", "false"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.general.port, 8081);
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.http_client.max_total_connections, 7);
        assert!(!cfg.http_client.trust_self_signed);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::from_vars(vars(&[("APP_HTTP_CLIENT__MAX_TOTAL_CONNECTIONS", "0")]))
            .expect_err("zero pool size should fail validation");

        assert!(format!("{err:#}").contains("http_client.max_total_connections"));
    }
}
