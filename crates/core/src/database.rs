//! Single-schema Postgres connection pool.
//!
//! Every tenant lives in the same schema; isolation is a `company_id` column filter
//! enforced by each repository in `sentinel-store`, not by a per-tenant search_path.
//! This is a deliberate simplification of the ERP lineage's schema-per-tenant pool.

use crate::{config::DatabasePoolConfig, error::Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(url: &str, config: &DatabasePoolConfig) -> Result<Self> {
        info!("connecting to database pool (max_connections={})", config.max_connections);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn check_health(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../store/migrations").run(&self.pool).await?;
        Ok(())
    }
}
