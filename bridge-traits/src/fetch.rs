//! Media Fetch Abstraction
//!
//! Resolves an image location to raw bytes. A location is either a remote
//! `http(s)` URL or a local filesystem path; the implementation decides how
//! each is read.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Byte source for artwork locations.
///
/// Used by the thumbnail pipeline, which treats every failure as "no
/// thumbnail" rather than an error, so implementations should fail fast
/// instead of retrying aggressively.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch the raw bytes behind `location`.
    async fn fetch(&self, location: &str) -> Result<Bytes>;
}
