//! Artwork Fetching using Reqwest and the Local Filesystem

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    fetch::MediaFetcher,
};
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Fetches artwork bytes from HTTP(S) URLs or local paths
///
/// Locations starting with `http://` or `https://` go through a pooled
/// reqwest client; anything else is treated as a filesystem path.
pub struct ReqwestMediaFetcher {
    client: Client,
}

impl ReqwestMediaFetcher {
    /// Create a new fetcher with default configuration
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new fetcher with custom timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent("songdeck/0.1.0")
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Create a new fetcher with a custom client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_remote(&self, url: &str) -> Result<Bytes> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| BridgeError::FetchFailed {
                    location: url.to_string(),
                    message: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(BridgeError::FetchFailed {
                location: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        response.bytes().await.map_err(|e| BridgeError::FetchFailed {
            location: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn fetch_local(&self, path: &str) -> Result<Bytes> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| BridgeError::FetchFailed {
                location: path.to_string(),
                message: e.to_string(),
            })?;
        Ok(Bytes::from(raw))
    }
}

impl Default for ReqwestMediaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for ReqwestMediaFetcher {
    async fn fetch(&self, location: &str) -> Result<Bytes> {
        debug!(location, "Fetching artwork");
        if location.starts_with("http://") || location.starts_with("https://") {
            self.fetch_remote(location).await
        } else {
            self.fetch_local(location).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_fetcher_creation() {
        let _fetcher = ReqwestMediaFetcher::new();
        // Just verify it constructs
    }

    #[tokio::test]
    async fn test_local_path_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"fake image bytes").unwrap();

        let fetcher = ReqwestMediaFetcher::new();
        let bytes = fetcher
            .fetch(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(bytes.as_ref(), b"fake image bytes");
    }

    #[tokio::test]
    async fn test_missing_local_path_is_fetch_failed() {
        let fetcher = ReqwestMediaFetcher::new();
        let err = fetcher.fetch("/does/not/exist.png").await.unwrap_err();
        assert!(matches!(err, BridgeError::FetchFailed { .. }));
    }
}
