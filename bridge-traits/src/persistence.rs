//! Persistence Adapter Abstraction
//!
//! Keyed, best-effort store for serialized queue items and their thumbnail
//! bytes. The engine treats its in-memory state as authoritative; adapter
//! failures are surfaced so callers can log them, never to abort a queue
//! operation.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// One persisted queue entry as returned by [`PersistenceAdapter::load_all`].
#[derive(Debug, Clone)]
pub struct PersistedRecord {
    /// Identity key the item was saved under.
    pub key: String,
    /// Serialized item payload (the engine owns the encoding).
    pub payload: Bytes,
    /// Cached thumbnail bytes, if any were written through.
    pub thumbnail: Option<Bytes>,
}

/// Keyed store for queue items that survives restarts.
///
/// Implementations must upsert on `save_item` and must not erase a stored
/// thumbnail when a later save for the same key carries `None` (thumbnail
/// write-through and item re-saves race by design).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::persistence::PersistenceAdapter;
///
/// async fn persist(adapter: &dyn PersistenceAdapter, key: &str, payload: bytes::Bytes) {
///     if let Err(e) = adapter.save_item(key, payload, None).await {
///         tracing::warn!(key, error = %e, "queue item persistence failed");
///     }
/// }
/// ```
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Insert or update one item under `key`.
    async fn save_item(&self, key: &str, payload: Bytes, thumbnail: Option<Bytes>) -> Result<()>;

    /// Delete the item stored under `key`. Deleting an absent key is not an
    /// error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Delete every stored item.
    async fn clear(&self) -> Result<()>;

    /// Load every stored item. No ordering is guaranteed; the engine restores
    /// order from the payload itself.
    async fn load_all(&self) -> Result<Vec<PersistedRecord>>;
}
