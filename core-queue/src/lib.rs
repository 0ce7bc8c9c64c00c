//! # Queue Engine Module
//!
//! Owns the download queue: an ordered, deduplicated collection of songs and
//! the machinery that processes it.
//!
//! ## Overview
//!
//! This module manages:
//! - The queue store: ordered membership, `(source, id)` deduplication, and
//!   best-effort persistence through an injected adapter
//! - Thumbnail derivation from artwork locations into small JPEGs
//! - Command template rendering with per-song placeholders
//! - The run scheduler: sequential or parallel execution of one external
//!   command per item, with cooperative cancellation and aggregate totals
//! - The provider search seam for discovering songs to enqueue

pub mod error;
pub mod models;
pub mod providers;
pub mod runner;
pub mod store;
pub mod template;
pub mod thumbnail;

pub use error::{QueueError, Result};
pub use models::{ItemStatus, PersistedItem, QueueItem, SongKey, SongRecord, Source};
pub use providers::{ProviderRegistry, SearchProvider};
pub use runner::{
    AcceptAllClassifier, QueueRunner, ResultClassifier, RunMode, RunOutcome, RunStatus,
    RunSummary, RunnerConfig, TotalsSnapshot,
};
pub use store::QueueStore;
pub use template::render_command;
pub use thumbnail::{ThumbnailConfig, ThumbnailService};
