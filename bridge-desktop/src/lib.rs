//! # Desktop Bridge Implementations
//!
//! Native implementations of the bridge traits for desktop platforms.
//!
//! ## Overview
//!
//! This module provides:
//! - SQLite-backed queue persistence via sqlx
//! - Shell command execution via tokio::process
//! - Artwork fetching over HTTP (reqwest) and from the local filesystem

pub mod fetcher;
pub mod persistence;
pub mod process;

pub use fetcher::ReqwestMediaFetcher;
pub use persistence::SqlitePersistenceAdapter;
pub use process::ShellProcessExecutor;
