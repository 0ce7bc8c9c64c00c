//! Queue Persistence using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    persistence::{PersistedRecord, PersistenceAdapter},
};
use bytes::Bytes;
use sqlx::{sqlite::SqlitePool, Row};
use std::path::PathBuf;
use tracing::debug;

/// SQLite-backed queue persistence implementation
///
/// Stores one row per queue item, keyed by the item's identity key:
/// - Opaque JSON payload written by the engine
/// - Optional derived thumbnail blob, preserved across payload updates
/// - Async operations on a connection pool
pub struct SqlitePersistenceAdapter {
    pool: SqlitePool,
}

impl SqlitePersistenceAdapter {
    /// Create a new persistence adapter with the given database path
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // Convert path to string, replacing backslashes with forward slashes for SQLite URL
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let db_url = format!("sqlite://{}?mode=rwc", path_str);

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        Self::init_schema(&pool).await?;
        debug!(path = ?db_path, "Initialized queue persistence");

        Ok(Self { pool })
    }

    /// Create an in-memory adapter (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue_items (
                key TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                thumbnail BLOB,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to create table: {}", e)))?;
        Ok(())
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[async_trait]
impl PersistenceAdapter for SqlitePersistenceAdapter {
    async fn save_item(&self, key: &str, payload: Bytes, thumbnail: Option<Bytes>) -> Result<()> {
        // COALESCE keeps a previously stored thumbnail when this save does
        // not carry one.
        sqlx::query(
            r#"
            INSERT INTO queue_items (key, payload, thumbnail, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                thumbnail = COALESCE(excluded.thumbnail, queue_items.thumbnail),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(payload.as_ref())
        .bind(thumbnail.as_deref())
        .bind(Self::now())
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to save item: {}", e)))?;

        debug!(key = key, "Stored queue item");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM queue_items WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to delete item: {}", e)))?;

        debug!(key = key, "Deleted queue item");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM queue_items")
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to clear items: {}", e)))?;

        debug!("Cleared queue items");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<PersistedRecord>> {
        let rows = sqlx::query("SELECT key, payload, thumbnail FROM queue_items")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to load items: {}", e)))?;

        let records = rows
            .into_iter()
            .map(|row| {
                let payload: Vec<u8> = row.get(1);
                let thumbnail: Option<Vec<u8>> = row.get(2);
                PersistedRecord {
                    key: row.get(0),
                    payload: Bytes::from(payload),
                    thumbnail: thumbnail.map(Bytes::from),
                }
            })
            .collect();
        Ok(records)
    }
}
