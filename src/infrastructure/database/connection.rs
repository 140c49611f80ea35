use crate::shared::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub type DbPool = Pool<Sqlite>;

pub struct Database;

impl Database {
    pub async fn initialize(config: &DatabaseConfig) -> Result<DbPool> {
        let file_path = config
            .url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        if file_path != ":memory:" {
            if let Some(parent) = Path::new(file_path).parent() {
                std::fs::create_dir_all(parent)
                    .context("failed to create database directory")?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await
            .with_context(|| format!("failed to connect to {}", config.url))?;

        info!(target: "offline::store", url = %config.url, "database connected");

        Self::run_migrations(&pool).await?;

        Ok(pool)
    }

    pub async fn run_migrations(pool: &DbPool) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .context("failed to run database migrations")?;
        info!(target: "offline::store", "database migrations completed");
        Ok(())
    }
}
