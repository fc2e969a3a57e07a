use async_trait::async_trait;
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{path::Path, str::FromStr};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid table name: {0}")]
    InvalidTable(String),
}

/// A string-keyed durable slot store.
///
/// Values are opaque strings; callers decide on the encoding (JSON for every
/// slot the storefront writes).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    /// # Errors
    /// - Returns `DbError` if the backend cannot be read
    async fn get(&self, key: &str) -> Result<Option<String>, DbError>;
    /// Write `value` under `key`, replacing any previous value
    /// # Errors
    /// - Returns `DbError` if the backend cannot be written
    async fn set(&self, key: &str, value: &str) -> Result<(), DbError>;
}

/// SQLite key-value store, one row per slot
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    table: String,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Connect to a database URL such as `sqlite://data/store.db` or `sqlite::memory:`
    /// # Errors
    /// - Returns `DbError` if the URL is invalid or the connection fails
    pub async fn connect(db_url: &str, table: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        Self::with_options(options, table).await
    }

    /// Open (creating if needed) a database file on disk
    /// # Errors
    /// - Returns `DbError` if the parent directory cannot be created or the connection fails
    pub async fn open(path: &Path, table: &str) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::with_options(options, table).await
    }

    async fn with_options(options: SqliteConnectOptions, table: &str) -> Result<Self, DbError> {
        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(DbError::InvalidTable(table.to_string()));
        }

        // A single connection keeps `sqlite::memory:` databases alive and
        // serialises writers.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let query = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )"
        );
        sqlx::query(&query).execute(&pool).await?;
        debug!("Opened key-value table {table}");

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let query = format!("SELECT value FROM {} WHERE key = ?1", self.table);

        let value: Option<String> = sqlx::query_scalar(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        let query = format!(
            "INSERT INTO {} (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            self.table
        );

        sqlx::query(&query)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
