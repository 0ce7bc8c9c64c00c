//! # Host Bridge Traits
//!
//! Collaborator contracts that the queue engine consumes but does not own.
//!
//! ## Overview
//!
//! This crate defines the boundary between the queue engine and the host
//! application. Each trait represents a capability the engine requires but
//! whose implementation differs per host:
//!
//! - [`PersistenceAdapter`](persistence::PersistenceAdapter) - keyed store for
//!   serialized queue items and thumbnail bytes
//! - [`ProcessExecutor`](process::ProcessExecutor) - runs a rendered command
//!   string and reports its outcome
//! - [`MediaFetcher`](fetch::MediaFetcher) - resolves an image location
//!   (remote URL or local path) to raw bytes
//!
//! The traits deliberately speak in `String` keys and [`bytes::Bytes`]
//! payloads so that implementations stay independent of the engine's domain
//! types.
//!
//! ## Error Handling
//!
//! All traits use [`BridgeError`](error::BridgeError). Implementations should
//! convert host-specific errors into it and include actionable context
//! (command text, file path, HTTP status).
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync`; the engine shares implementations
//! across worker tasks behind `Arc<dyn Trait>`.

pub mod error;
pub mod fetch;
pub mod persistence;
pub mod process;

pub use error::BridgeError;

// Re-export commonly used types
pub use fetch::MediaFetcher;
pub use persistence::{PersistedRecord, PersistenceAdapter};
pub use process::ProcessExecutor;
