use anyhow::{Result, bail};
use tokio::sync::Semaphore;

use super::AppConfig;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if cfg.database.url.trim().is_empty() {
        errors.push("database.url must not be empty".to_string());
    }

    if cfg.database.max_connections == 0 {
        errors.push("database.max_connections must be > 0".to_string());
    }

    if cfg.database.min_idle > cfg.database.max_connections {
        errors.push(format!(
            "database.min_idle ({}) must be <= database.max_connections ({})",
            cfg.database.min_idle, cfg.database.max_connections
        ));
    }

    let http = &cfg.http_client;

    if http.max_total_connections == 0 {
        errors.push("http_client.max_total_connections must be > 0".to_string());
    }

    if http.max_total_connections > Semaphore::MAX_PERMITS {
        errors.push(format!(
            "http_client.max_total_connections ({}) must be <= {}",
            http.max_total_connections,
            Semaphore::MAX_PERMITS
        ));
    }

    if http.connect_timeout_ms == 0 {
        errors.push("http_client.connect_timeout_ms must be > 0".to_string());
    }

    if http.request_timeout_ms == 0 {
        errors.push("http_client.request_timeout_ms must be > 0".to_string());
    }

    if http.socket_timeout_ms == 0 {
        errors.push("http_client.socket_timeout_ms must be > 0".to_string());
    }

    if http.reaper_interval_ms == 0 {
        errors.push("http_client.reaper_interval_ms must be > 0".to_string());
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}
