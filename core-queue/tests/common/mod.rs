//! Shared fakes for queue integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{BridgeError, MediaFetcher, PersistedRecord, PersistenceAdapter, ProcessExecutor};
use bytes::Bytes;
use tokio::sync::Semaphore;

/// In-memory persistence adapter honoring the thumbnail-preserving upsert
/// contract: a save with `None` keeps a previously stored thumbnail.
#[derive(Default)]
pub struct MemoryPersistence {
    records: Mutex<HashMap<String, (Bytes, Option<Bytes>)>>,
}

impl MemoryPersistence {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.lock().unwrap().contains_key(key)
    }

    pub fn thumbnail_of(&self, key: &str) -> Option<Bytes> {
        self.records
            .lock()
            .unwrap()
            .get(key)
            .and_then(|(_, thumb)| thumb.clone())
    }

    /// Seed a raw record, bypassing the store. Used to simulate corrupt or
    /// pre-existing database contents.
    pub fn seed(&self, key: &str, payload: Bytes, thumbnail: Option<Bytes>) {
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), (payload, thumbnail));
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryPersistence {
    async fn save_item(
        &self,
        key: &str,
        payload: Bytes,
        thumbnail: Option<Bytes>,
    ) -> bridge_traits::error::Result<()> {
        let mut records = self.records.lock().unwrap();
        let entry = records
            .entry(key.to_string())
            .or_insert_with(|| (Bytes::new(), None));
        entry.0 = payload;
        if thumbnail.is_some() {
            entry.1 = thumbnail;
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> bridge_traits::error::Result<()> {
        self.records.lock().unwrap().remove(key);
        Ok(())
    }

    async fn clear(&self) -> bridge_traits::error::Result<()> {
        self.records.lock().unwrap().clear();
        Ok(())
    }

    async fn load_all(&self) -> bridge_traits::error::Result<Vec<PersistedRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|(key, (payload, thumbnail))| PersistedRecord {
                key: key.clone(),
                payload: payload.clone(),
                thumbnail: thumbnail.clone(),
            })
            .collect())
    }
}

/// Fetcher that always fails; for tests where artwork does not matter.
pub struct NullFetcher;

#[async_trait]
impl MediaFetcher for NullFetcher {
    async fn fetch(&self, location: &str) -> bridge_traits::error::Result<Bytes> {
        Err(BridgeError::FetchFailed {
            location: location.to_string(),
            message: "no fetcher in this test".to_string(),
        })
    }
}

/// Fetcher serving one generated PNG for every location.
pub struct PngFetcher;

impl PngFetcher {
    pub fn png(width: u32, height: u32) -> Bytes {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([10, 200, 30, 255]),
        ));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        Bytes::from(cursor.into_inner())
    }
}

#[async_trait]
impl MediaFetcher for PngFetcher {
    async fn fetch(&self, _location: &str) -> bridge_traits::error::Result<Bytes> {
        Ok(Self::png(120, 90))
    }
}

/// Executor recording every rendered command and echoing it back.
#[derive(Default)]
pub struct RecordingExecutor {
    commands: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessExecutor for RecordingExecutor {
    async fn run(&self, command: &str, _working_dir: &Path) -> bridge_traits::error::Result<String> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(command.to_string())
    }
}

/// Executor that parks each command on a semaphore until the test releases
/// it. Lets tests hold a run mid-flight deterministically.
pub struct GatedExecutor {
    started: AtomicUsize,
    gate: Semaphore,
}

impl GatedExecutor {
    pub fn new() -> Self {
        Self {
            started: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Let `n` parked commands finish.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl ProcessExecutor for GatedExecutor {
    async fn run(&self, command: &str, _working_dir: &Path) -> bridge_traits::error::Result<String> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| BridgeError::OperationFailed("gate closed".to_string()))?;
        permit.forget();
        Ok(command.to_string())
    }
}

/// Poll `condition` until it holds or a two second deadline passes.
///
/// Background persistence and thumbnail writes are fire-and-forget, so tests
/// observe their effects by polling rather than by awaiting a handle.
pub async fn wait_for(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
