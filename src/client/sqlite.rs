use super::DocumentStore;
use crate::error::{Error, Result};
use crate::types::RecordId;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY NOT NULL,
    collection TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS documents_collection ON documents (collection)";

/// A document store keeping JSON documents in one SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Use an existing pool, creating the `documents` table if needed.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(Error::from_dyn)?;
        sqlx::query(CREATE_INDEX)
            .execute(&pool)
            .await
            .map_err(Error::from_dyn)?;
        Ok(Self { pool })
    }

    /// Open (or create) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(Error::from_dyn)?;
        Self::new(pool).await
    }

    /// An in-memory database, for tests.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(Error::from_dyn)?;
        // Every connection to `:memory:` is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(Error::from_dyn)?;
        Self::new(pool).await
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fetch a document by ID.
    pub async fn get(&self, id: &RecordId) -> Result<Option<serde_json::Value>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT body FROM documents WHERE id = ?")
            .bind(&**id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::from_dyn)?;

        row.map(|(body,)| serde_json::from_str(&body).map_err(Error::from_dyn))
            .transpose()
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::from_dyn)?;
        Ok(n)
    }
}

impl DocumentStore for SqliteDocumentStore {
    async fn insert(&self, collection: &str, document: serde_json::Value) -> Result<RecordId> {
        let id = Uuid::now_v7().to_string();
        let body = serde_json::to_string(&document).map_err(Error::from_dyn)?;

        sqlx::query("INSERT INTO documents (id, collection, body) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(collection)
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(Error::from_dyn)?;

        trace!(%id, collection, "inserted document");
        Ok(RecordId::from(id))
    }
}
