use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::info;

use crate::config::{DatabaseConfig, RunMode};

const SQLITE_BUSY_TIMEOUT_MS: u64 = 5_000;

pub async fn connect(cfg: &DatabaseConfig, mode: RunMode) -> anyhow::Result<DatabaseConnection> {
    let url = cfg.url_for(mode);
    let mut options = ConnectOptions::new(url.to_string());
    options
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_idle)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    if is_sqlite(url) {
        db.execute_unprepared("PRAGMA foreign_keys = ON").await?;
        db.execute_unprepared(&format!("PRAGMA busy_timeout = {SQLITE_BUSY_TIMEOUT_MS}"))
            .await?;
    }

    info!(run_mode = mode.as_str(), "syncing database schema from entities");
    db.get_schema_registry("account_server::db::entities::*")
        .sync(&db)
        .await?;
    Ok(db)
}

fn is_sqlite(url: &str) -> bool {
    url.trim().to_ascii_lowercase().starts_with("sqlite:")
}
