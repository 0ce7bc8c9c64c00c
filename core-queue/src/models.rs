//! Domain model for queued media items.
//!
//! A [`SongRecord`] is the normalized, provider-agnostic description of one
//! media item. Its identity is the `(Source, Id)` pair and nothing else: two
//! records with the same source and id are the same song even when every
//! other field differs. A [`QueueItem`] wraps a record with the runtime state
//! owned by the engine (order index, status, result text, thumbnail).

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{QueueError, Result};

/// Provider a song was discovered from. `Local` is the sentinel for files
/// already on disk; for local songs the id is the file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Deezer,
    Spotify,
    Qobuz,
    YouTube,
    Local,
}

impl Source {
    /// Stable lowercase tag, used in identity keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deezer => "deezer",
            Self::Spotify => "spotify",
            Self::Qobuz => "qobuz",
            Self::YouTube => "youtube",
            Self::Local => "local",
        }
    }

    /// Canonical web URL for a track id on this source. `None` for local
    /// songs, whose id is already a path.
    pub fn track_url(&self, id: &str) -> Option<String> {
        match self {
            Self::Deezer => Some(format!("https://www.deezer.com/track/{id}")),
            Self::Spotify => Some(format!("https://open.spotify.com/track/{id}")),
            Self::Qobuz => Some(format!("https://open.qobuz.com/track/{id}")),
            Self::YouTube => Some(format!("https://music.youtube.com/watch?v={id}")),
            Self::Local => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity key of a song: the `(Source, Id)` pair used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SongKey {
    pub source: Source,
    pub id: String,
}

impl SongKey {
    pub fn new(source: Source, id: impl Into<String>) -> Self {
        Self {
            source,
            id: id.into(),
        }
    }

    /// String form used as the persistence adapter key.
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.source, self.id)
    }
}

impl fmt::Display for SongKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.id)
    }
}

/// Normalized, provider-agnostic description of one media item.
///
/// Immutable once constructed. Equality and hashing are defined over the
/// identity key only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongRecord {
    pub source: Source,
    pub id: String,
    pub title: String,
    pub isrc: Option<String>,
    pub release_date: String,
    pub artists: Vec<String>,
    /// Track length in whole seconds.
    pub duration_secs: u64,
    pub album_name: String,
    /// Remote artwork URL or local artwork path, when known.
    pub image_location: Option<String>,
    pub explicit: bool,
    pub track_position: u32,
    pub rank: u64,
    pub audio_format: Option<String>,
}

impl SongRecord {
    /// Create a record with the identity fields and title set; everything
    /// else starts empty and is filled with the `with_*` setters.
    pub fn new(source: Source, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source,
            id: id.into(),
            title: title.into(),
            isrc: None,
            release_date: String::new(),
            artists: Vec::new(),
            duration_secs: 0,
            album_name: String::new(),
            image_location: None,
            explicit: false,
            track_position: 0,
            rank: 0,
            audio_format: None,
        }
    }

    pub fn with_isrc(mut self, isrc: impl Into<String>) -> Self {
        self.isrc = Some(isrc.into());
        self
    }

    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        self.release_date = date.into();
        self
    }

    pub fn with_artists(mut self, artists: Vec<String>) -> Self {
        self.artists = artists;
        self
    }

    pub fn with_duration_secs(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_album_name(mut self, album: impl Into<String>) -> Self {
        self.album_name = album.into();
        self
    }

    pub fn with_image_location(mut self, location: impl Into<String>) -> Self {
        self.image_location = Some(location.into());
        self
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn with_track_position(mut self, position: u32) -> Self {
        self.track_position = position;
        self
    }

    pub fn with_rank(mut self, rank: u64) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_audio_format(mut self, format: impl Into<String>) -> Self {
        self.audio_format = Some(format.into());
        self
    }

    /// The identity key for deduplication.
    pub fn key(&self) -> SongKey {
        SongKey::new(self.source, self.id.clone())
    }

    /// Whether this song is a local file (id is the path).
    pub fn is_local(&self) -> bool {
        self.source == Source::Local
    }
}

impl PartialEq for SongRecord {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.id == other.id
    }
}

impl Eq for SongRecord {}

impl Hash for SongRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.id.hash(state);
    }
}

/// Per-item scheduling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Not yet processed in the current run.
    Pending,
    /// A worker is executing this item's command.
    Running,
    /// Command completed; output classified as a success.
    Success,
    /// Command completed; output classified as a warning.
    Warning,
    /// Command failed to launch or exited non-zero.
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Check if status is terminal (set exactly once per run per item).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Warning | Self::Error)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A song plus the runtime state the engine owns for it.
///
/// `thumbnail` is populated asynchronously by the thumbnail pipeline and may
/// be absent at any time; absence never invalidates the item.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub song: SongRecord,
    /// Monotonic insertion index; fixes iteration order across reloads.
    pub order_index: u64,
    pub status: ItemStatus,
    pub result_text: Option<String>,
    pub thumbnail: Option<Bytes>,
}

impl QueueItem {
    pub fn new(song: SongRecord, order_index: u64) -> Self {
        Self {
            song,
            order_index,
            status: ItemStatus::Pending,
            result_text: None,
            thumbnail: None,
        }
    }

    pub fn key(&self) -> SongKey {
        self.song.key()
    }
}

/// Serialized form of a queue item written through the persistence adapter.
///
/// Thumbnail bytes travel separately (the adapter stores them alongside the
/// payload); runtime status is deliberately not persisted, every restored
/// item starts `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedItem {
    pub song: SongRecord,
    pub order_index: u64,
}

impl PersistedItem {
    pub fn from_item(item: &QueueItem) -> Self {
        Self {
            song: item.song.clone(),
            order_index: item.order_index,
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        let raw = serde_json::to_vec(self)
            .map_err(|e| QueueError::CorruptRecord(format!("encode failed: {e}")))?;
        Ok(Bytes::from(raw))
    }

    pub fn decode(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).map_err(|e| QueueError::CorruptRecord(e.to_string()))
    }
}
