//! Provider search seam.
//!
//! The engine itself never talks to a music catalog; discovery is behind
//! [`SearchProvider`], one implementation per [`Source`], supplied by the
//! embedding application. The [`ProviderRegistry`] is a convenience map from
//! source to implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{QueueError, Result};
use crate::models::{SongRecord, Source};

/// Searches one provider's catalog for songs matching a free-text query.
///
/// Implementations must return records whose `source` matches
/// [`SearchProvider::source`].
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// The source this provider searches.
    fn source(&self) -> Source;

    /// Search the catalog. An empty result set is not an error.
    async fn search(&self, query: &str) -> Result<Vec<SongRecord>>;
}

/// Maps each [`Source`] to its registered provider.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<Source, Arc<dyn SearchProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own source, replacing any previous
    /// registration for that source.
    pub fn register(&mut self, provider: Arc<dyn SearchProvider>) {
        let source = provider.source();
        debug!(%source, "search provider registered");
        self.providers.insert(source, provider);
    }

    pub fn get(&self, source: Source) -> Option<Arc<dyn SearchProvider>> {
        self.providers.get(&source).cloned()
    }

    /// Search a single source's catalog.
    pub async fn search(&self, source: Source, query: &str) -> Result<Vec<SongRecord>> {
        let provider = self
            .get(source)
            .ok_or_else(|| QueueError::Provider(format!("no provider registered for {source}")))?;
        provider.search(query).await
    }

    pub fn sources(&self) -> Vec<Source> {
        self.providers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider {
        source: Source,
        results: Vec<SongRecord>,
    }

    #[async_trait]
    impl SearchProvider for FixedProvider {
        fn source(&self) -> Source {
            self.source
        }

        async fn search(&self, _query: &str) -> Result<Vec<SongRecord>> {
            Ok(self.results.clone())
        }
    }

    #[tokio::test]
    async fn test_registry_routes_by_source() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(FixedProvider {
            source: Source::Deezer,
            results: vec![SongRecord::new(Source::Deezer, "1", "Hit")],
        }));

        let results = registry.search(Source::Deezer, "hit").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Hit");
    }

    #[tokio::test]
    async fn test_registry_rejects_unknown_source() {
        let registry = ProviderRegistry::new();
        let err = registry.search(Source::Qobuz, "x").await.unwrap_err();
        assert!(matches!(err, QueueError::Provider(_)));
    }

    #[tokio::test]
    async fn test_register_replaces_previous_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(FixedProvider {
            source: Source::Spotify,
            results: vec![],
        }));
        registry.register(Arc::new(FixedProvider {
            source: Source::Spotify,
            results: vec![SongRecord::new(Source::Spotify, "2", "New")],
        }));

        assert_eq!(registry.sources(), vec![Source::Spotify]);
        let results = registry.search(Source::Spotify, "q").await.unwrap();
        assert_eq!(results[0].id, "2");
    }
}
