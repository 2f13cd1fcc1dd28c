use sea_orm::DatabaseConnection;
use tracing::info;

use super::providers::{DbProviderId, redact_url};
use crate::config::DatabaseConfig;

/// Connects through the provider matching the URL scheme, runs its
/// post-connect hook and syncs the schema from the registered entities.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let provider_id = DbProviderId::from_url(&cfg.url)?;
    let provider = provider_id.provider();

    info!(
        provider = provider_id.as_str(),
        url = %redact_url(&cfg.url),
        "connecting to database"
    );
    let db = provider.connect(cfg).await?;
    provider.post_connect(&db, cfg).await?;

    info!("syncing database schema from entities");
    db.get_schema_registry("todo_backend::db::entities::*")
        .sync(&db)
        .await?;
    Ok(db)
}
