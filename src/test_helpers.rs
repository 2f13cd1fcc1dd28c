use std::sync::Arc;

use axum::Router;

use crate::{
    config::{AppConfig, DatabaseConfig},
    db::connection,
    routes::app,
    state::AppState,
};

/// State backed by a fresh in-memory SQLite database with the schema
/// synced.
pub async fn test_state() -> Arc<AppState> {
    let cfg = AppConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_idle: 1,
        },
        ..AppConfig::default()
    };
    let db = connection::connect(&cfg.database)
        .await
        .expect("connect to in-memory sqlite");
    AppState::new(cfg, db)
}

pub async fn test_router() -> Router {
    app(test_state().await)
}
