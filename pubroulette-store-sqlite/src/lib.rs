//! Persistent exclusion sets stored in SQLite.

use async_trait::async_trait;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use tracing::info;

use pubroulette_core::{
    model::CandidateId,
    ports::{ExclusionStore, PortError},
};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS exclusions (
    set_name TEXT NOT NULL,
    id INTEGER NOT NULL,
    PRIMARY KEY (set_name, id)
)";

/// Exclusion store keeping one named set in a SQLite table.
///
/// Several stores with different set names can share a database.
#[derive(Debug, Clone)]
pub struct SqliteExclusionStore {
    pool: SqlitePool,
    set_name: String,
}

impl SqliteExclusionStore {
    /// Open (creating if needed) the database at `db_url` and prepare the table.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::StoreUnavailable`] when the database cannot be
    /// created, opened or initialised.
    pub async fn connect(db_url: &str, set_name: impl Into<String>) -> Result<Self, PortError> {
        let in_memory = db_url.contains(":memory:");
        if !in_memory && !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await.map_err(unavailable)?;
        }

        // every connection to `:memory:` opens its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect(db_url)
            .await
            .map_err(unavailable)?;

        Self::with_pool(pool, set_name).await
    }

    /// Use an existing pool, creating the table if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::StoreUnavailable`] when the table cannot be created.
    pub async fn with_pool(pool: SqlitePool, set_name: impl Into<String>) -> Result<Self, PortError> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(unavailable)?;

        let set_name = set_name.into();
        info!(set = %set_name, "exclusion store ready");
        Ok(Self { pool, set_name })
    }

    /// Name of the set this store reads and writes.
    #[must_use]
    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    /// Number of identifiers in the set.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::StoreUnavailable`] when the query fails.
    pub async fn count(&self) -> Result<i64, PortError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exclusions WHERE set_name = ?")
            .bind(&self.set_name)
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(count)
    }
}

#[async_trait]
impl ExclusionStore for SqliteExclusionStore {
    async fn is_excluded(&self, id: CandidateId) -> Result<bool, PortError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM exclusions WHERE set_name = ? AND id = ?")
                .bind(&self.set_name)
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;
        Ok(row.is_some())
    }

    async fn exclude(&self, id: CandidateId) -> Result<(), PortError> {
        sqlx::query("INSERT OR IGNORE INTO exclusions (set_name, id) VALUES (?, ?)")
            .bind(&self.set_name)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

fn unavailable(err: sqlx::Error) -> PortError {
    PortError::StoreUnavailable(err.to_string())
}
