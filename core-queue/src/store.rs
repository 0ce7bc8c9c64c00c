//! Ordered, deduplicated queue store.
//!
//! `QueueStore` owns queue membership: the ordered item collection, the
//! identity-key dedup index, and the monotonic order counter. Structural
//! mutations happen synchronously under one mutex; persistence writes and
//! thumbnail derivation are dispatched to background tasks so no caller ever
//! blocks on I/O.
//!
//! Persistence is best-effort: a failed write or delete is logged and the
//! in-memory state stays authoritative for the process session.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use bridge_traits::PersistenceAdapter;
use bytes::Bytes;
use core_runtime::events::{CoreEvent, EventBus, QueueEvent};
use tracing::{debug, info, warn};

use crate::error::{QueueError, Result};
use crate::models::{ItemStatus, PersistedItem, QueueItem, SongKey, SongRecord};
use crate::thumbnail::ThumbnailService;

#[derive(Default)]
struct Inner {
    items: Vec<QueueItem>,
    keys: HashSet<SongKey>,
}

/// The ordered, deduplicated collection of queue items.
///
/// Constructed once with its collaborators injected; share it behind an
/// [`Arc`] between the embedding application and the runner.
pub struct QueueStore {
    inner: Mutex<Inner>,
    persistence: Arc<dyn PersistenceAdapter>,
    thumbnails: Arc<ThumbnailService>,
    events: EventBus,
}

impl QueueStore {
    pub fn new(
        persistence: Arc<dyn PersistenceAdapter>,
        thumbnails: Arc<ThumbnailService>,
        events: EventBus,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            persistence,
            thumbnails,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("queue store mutex poisoned")
    }

    fn emit(&self, event: QueueEvent) {
        // An error here only means nobody is subscribed.
        let _ = self.events.emit(CoreEvent::Queue(event));
    }

    fn next_index(items: &[QueueItem]) -> u64 {
        items
            .iter()
            .map(|item| item.order_index)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Add a song to the end of the queue.
    ///
    /// Returns `None` without touching anything when the identity key is
    /// already present. Otherwise the item is appended with the next order
    /// index, its persistence write and thumbnail derivation are scheduled in
    /// the background, and a copy of the new item is returned.
    pub fn add(self: &Arc<Self>, song: SongRecord) -> Option<QueueItem> {
        let key = song.key();
        let item = {
            let mut inner = self.lock();
            if inner.keys.contains(&key) {
                debug!(%key, "duplicate add ignored");
                return None;
            }
            let item = QueueItem::new(song, Self::next_index(&inner.items));
            inner.keys.insert(key.clone());
            inner.items.push(item.clone());
            item
        };

        self.emit(QueueEvent::ItemAdded {
            key: key.storage_key(),
            title: item.song.title.clone(),
            order_index: item.order_index,
        });
        self.spawn_persist(&item);
        if let Some(location) = item.song.image_location.clone() {
            self.spawn_thumbnail(key, location);
        }
        Some(item)
    }

    /// Remove the item with the given identity key. Removing an absent key is
    /// a no-op.
    pub fn remove(&self, key: &SongKey) {
        let removed = {
            let mut inner = self.lock();
            if inner.keys.remove(key) {
                inner.items.retain(|item| item.key() != *key);
                true
            } else {
                false
            }
        };
        if !removed {
            debug!(%key, "remove of absent key ignored");
            return;
        }

        self.emit(QueueEvent::ItemRemoved {
            key: key.storage_key(),
        });
        let persistence = Arc::clone(&self.persistence);
        let storage_key = key.storage_key();
        tokio::spawn(async move {
            if let Err(e) = persistence.remove(&storage_key).await {
                warn!(key = storage_key, error = %e, "queue item delete failed");
            }
        });
    }

    /// Atomically swap the item at `position` for a new song.
    ///
    /// The new item keeps the replaced slot's order index so the slot
    /// survives a reload. Fails if the position is out of range or the new
    /// identity key already belongs to a different item.
    pub fn replace(self: &Arc<Self>, position: usize, song: SongRecord) -> Result<QueueItem> {
        let new_key = song.key();
        let (old_key, item) = {
            let mut inner = self.lock();
            let len = inner.items.len();
            if position >= len {
                return Err(QueueError::InvalidPosition { position, len });
            }
            let old_key = inner.items[position].key();
            if new_key != old_key && inner.keys.contains(&new_key) {
                return Err(QueueError::DuplicateKey(new_key.storage_key()));
            }
            let item = QueueItem::new(song, inner.items[position].order_index);
            inner.keys.remove(&old_key);
            inner.keys.insert(new_key.clone());
            inner.items[position] = item.clone();
            (old_key, item)
        };

        self.emit(QueueEvent::ItemReplaced {
            position,
            old_key: old_key.storage_key(),
            new_key: new_key.storage_key(),
        });

        let persistence = Arc::clone(&self.persistence);
        let old_storage = old_key.storage_key();
        let new_storage = new_key.storage_key();
        let payload = PersistedItem::from_item(&item).encode();
        tokio::spawn(async move {
            if old_storage != new_storage {
                if let Err(e) = persistence.remove(&old_storage).await {
                    warn!(key = old_storage, error = %e, "replaced item delete failed");
                }
            }
            match payload {
                Ok(payload) => {
                    if let Err(e) = persistence.save_item(&new_storage, payload, None).await {
                        warn!(key = new_storage, error = %e, "queue item persistence failed");
                    }
                }
                Err(e) => warn!(key = new_storage, error = %e, "queue item encode failed"),
            }
        });

        if let Some(location) = item.song.image_location.clone() {
            self.spawn_thumbnail(new_key, location);
        }
        Ok(item)
    }

    /// Remove every item and issue a bulk persistence clear.
    pub fn clear(&self) {
        {
            let mut inner = self.lock();
            inner.items.clear();
            inner.keys.clear();
        }
        self.emit(QueueEvent::Cleared);

        let persistence = Arc::clone(&self.persistence);
        tokio::spawn(async move {
            if let Err(e) = persistence.clear().await {
                warn!(error = %e, "queue persistence clear failed");
            }
        });
    }

    /// Clear every item's result text ahead of a re-run. Status is left
    /// untouched; it keeps reflecting the last run until a worker claims the
    /// item again.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            for item in &mut inner.items {
                item.result_text = None;
            }
        }
        self.emit(QueueEvent::ResultsReset);
    }

    /// The order index the next added item would receive: `0` when empty,
    /// otherwise `max(existing) + 1`.
    pub fn next_order_index(&self) -> u64 {
        Self::next_index(&self.lock().items)
    }

    /// Restore the queue from the persistence adapter.
    ///
    /// Records are decoded, sorted by their persisted order index, and
    /// re-inserted through the normal dedup path. Each item keeps its
    /// persisted order index, so indices stay consistent with what is on
    /// disk and the relative order survives any number of reloads; the next
    /// add continues from the restored maximum. Thumbnails are attached from
    /// the persisted cache when present, otherwise derivation is scheduled.
    /// Corrupt records are skipped with a warning.
    ///
    /// Returns the number of items restored.
    pub async fn load_from_persistence(self: &Arc<Self>) -> Result<usize> {
        let records = self.persistence.load_all().await?;

        let mut decoded: Vec<(PersistedItem, Option<Bytes>)> = Vec::with_capacity(records.len());
        for record in records {
            match PersistedItem::decode(&record.payload) {
                Ok(persisted) => decoded.push((persisted, record.thumbnail)),
                Err(e) => {
                    warn!(key = record.key, error = %e, "skipping corrupt persisted record")
                }
            }
        }
        decoded.sort_by_key(|(persisted, _)| persisted.order_index);

        let mut restored = 0usize;
        for (persisted, thumbnail) in decoded {
            let key = persisted.song.key();
            let location = persisted.song.image_location.clone();
            let inserted = {
                let mut inner = self.lock();
                if inner.keys.contains(&key) {
                    debug!(%key, "duplicate persisted record ignored");
                    false
                } else {
                    let item = QueueItem::new(persisted.song, persisted.order_index);
                    inner.keys.insert(key.clone());
                    inner.items.push(item);
                    true
                }
            };
            if !inserted {
                continue;
            }
            restored += 1;

            match thumbnail {
                // Already cached on disk, no need to write it back.
                Some(bytes) => self.attach_thumbnail(&key, bytes, false).await,
                None => {
                    if let Some(location) = location {
                        self.spawn_thumbnail(key, location);
                    }
                }
            }
        }

        // Loading into a non-empty store may interleave indices.
        self.lock().items.sort_by_key(|item| item.order_index);

        info!(restored, "queue restored from persistence");
        Ok(restored)
    }

    /// A point-in-time copy of the queue in order-index order.
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.lock().items.clone()
    }

    /// Look up one item by identity key.
    pub fn get(&self, key: &SongKey) -> Option<QueueItem> {
        self.lock()
            .items
            .iter()
            .find(|item| item.key() == *key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Set an item's status. Only the runner transitions status.
    pub(crate) fn set_status(&self, key: &SongKey, status: ItemStatus) {
        let mut inner = self.lock();
        if let Some(item) = inner.items.iter_mut().find(|item| item.key() == *key) {
            item.status = status;
        }
    }

    /// Record an item's terminal status and result text.
    pub(crate) fn finish_item(&self, key: &SongKey, status: ItemStatus, result: Option<String>) {
        let mut inner = self.lock();
        if let Some(item) = inner.items.iter_mut().find(|item| item.key() == *key) {
            item.status = status;
            item.result_text = result;
        }
    }

    fn spawn_persist(&self, item: &QueueItem) {
        let payload = match PersistedItem::from_item(item).encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %item.key(), error = %e, "queue item encode failed");
                return;
            }
        };
        let persistence = Arc::clone(&self.persistence);
        let storage_key = item.key().storage_key();
        let thumbnail = item.thumbnail.clone();
        tokio::spawn(async move {
            if let Err(e) = persistence.save_item(&storage_key, payload, thumbnail).await {
                warn!(key = storage_key, error = %e, "queue item persistence failed");
            }
        });
    }

    fn spawn_thumbnail(self: &Arc<Self>, key: SongKey, location: String) {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            if let Some(bytes) = store.thumbnails.resolve(&location).await {
                store.attach_thumbnail(&key, bytes, true).await;
            }
        });
    }

    /// Attach derived thumbnail bytes to an item. The item may have been
    /// removed while the pipeline ran; that is not an error.
    async fn attach_thumbnail(&self, key: &SongKey, bytes: Bytes, write_through: bool) {
        let payload = {
            let mut inner = self.lock();
            let Some(item) = inner.items.iter_mut().find(|item| item.key() == *key) else {
                debug!(%key, "thumbnail arrived for an item no longer queued");
                return;
            };
            item.thumbnail = Some(bytes.clone());
            PersistedItem::from_item(item).encode()
        };

        if write_through {
            match payload {
                Ok(payload) => {
                    let storage_key = key.storage_key();
                    if let Err(e) = self
                        .persistence
                        .save_item(&storage_key, payload, Some(bytes))
                        .await
                    {
                        warn!(key = storage_key, error = %e, "thumbnail persistence failed");
                    }
                }
                Err(e) => warn!(%key, error = %e, "queue item encode failed"),
            }
        }

        self.emit(QueueEvent::ThumbnailReady {
            key: key.storage_key(),
        });
    }
}
