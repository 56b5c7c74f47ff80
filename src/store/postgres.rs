use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::StoreError;

/// Postgres-backed store. The repository impls live next to each domain's `repo.rs`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

/// Maps constraint violations on writes to domain errors; everything else stays a database error.
pub(crate) fn write_error(err: sqlx::Error, entity: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate(entity);
        }
        if db.is_foreign_key_violation() {
            return StoreError::InUse(entity);
        }
    }
    StoreError::Database(err)
}

/// Escapes LIKE wildcards so user search text matches literally.
pub(crate) fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
