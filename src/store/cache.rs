//! Semantic answer cache.
//!
//! The cache stores query/answer pairs as documents: the query text is
//! what gets embedded and matched, and the canonical answer rides along
//! in metadata under the reserved `RESPONSE` key.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StoreError;

use super::{META_RESPONSE, RetrievedFact, SemanticIndex};

/// Vector-backed cache of previously answered queries.
pub struct CacheStore {
    index: Arc<dyn SemanticIndex>,
}

impl CacheStore {
    /// Wraps a semantic index as the answer cache.
    #[must_use]
    pub fn new(index: Arc<dyn SemanticIndex>) -> Self {
        Self { index }
    }

    /// Caches `response` as the canonical answer for `fact`.
    ///
    /// `tags` is a comma-separated list of `KEY:VALUE` pairs stored as
    /// extra metadata. Malformed entries are skipped, as is any entry
    /// trying to claim the reserved `RESPONSE` key.
    ///
    /// # Errors
    ///
    /// Propagates embedding and database failures from the index.
    pub async fn add(
        &self,
        fact: &str,
        response: &str,
        tags: &str,
    ) -> Result<String, StoreError> {
        let mut metadata = HashMap::new();
        metadata.insert(META_RESPONSE.to_string(), response.to_string());

        for pair in tags.split(',') {
            let mut kv = pair.splitn(2, ':');
            let (Some(key), Some(value)) = (kv.next(), kv.next()) else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || key == META_RESPONSE {
                continue;
            }
            metadata.insert(key.to_string(), value.to_string());
        }

        self.index.add(fact, metadata).await
    }

    /// Returns cached entries ranked by similarity to `text`.
    ///
    /// # Errors
    ///
    /// Propagates embedding and database failures from the index.
    pub async fn query(&self, text: &str) -> Result<Vec<RetrievedFact>, StoreError> {
        self.index.query(text).await
    }

    /// Deletes one cached entry by id.
    ///
    /// # Errors
    ///
    /// Propagates database failures from the index.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.index.delete(id).await
    }

    /// Drops every cached entry.
    ///
    /// # Errors
    ///
    /// Propagates database failures from the index.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.index.clear().await
    }

    /// Extracts the canonical answer from a cache hit, if present.
    #[must_use]
    pub fn response_of(fact: &RetrievedFact) -> Option<&str> {
        fact.metadata.get(META_RESPONSE).map(String::as_str)
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Index double that records adds and replays canned query results.
    #[derive(Default)]
    struct RecordingIndex {
        added: Mutex<Vec<(String, HashMap<String, String>)>>,
        results: Mutex<Vec<RetrievedFact>>,
    }

    #[async_trait]
    impl SemanticIndex for RecordingIndex {
        async fn add(
            &self,
            content: &str,
            metadata: HashMap<String, String>,
        ) -> Result<String, StoreError> {
            self.added
                .lock()
                .unwrap()
                .push((content.to_string(), metadata));
            Ok("id-1".to_string())
        }

        async fn query(&self, _text: &str) -> Result<Vec<RetrievedFact>, StoreError> {
            Ok(self.results.lock().unwrap().clone())
        }

        async fn delete(&self, _id: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn clear(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_add_stores_response_under_reserved_key() {
        let index = Arc::new(RecordingIndex::default());
        let cache = CacheStore::new(Arc::clone(&index) as _);

        cache.add("what is the capital?", "Lisbon", "").await.unwrap();

        let added = index.added.lock().unwrap();
        let (content, metadata) = &added[0];
        assert_eq!(content, "what is the capital?");
        assert_eq!(metadata.get(META_RESPONSE).unwrap(), "Lisbon");
    }

    #[tokio::test]
    async fn test_add_parses_tags_and_skips_malformed() {
        let index = Arc::new(RecordingIndex::default());
        let cache = CacheStore::new(Arc::clone(&index) as _);

        cache
            .add("q", "a", "team:infra, malformed, RESPONSE:spoofed, env:prod")
            .await
            .unwrap();

        let added = index.added.lock().unwrap();
        let (_, metadata) = &added[0];
        assert_eq!(metadata.get("team").unwrap(), "infra");
        assert_eq!(metadata.get("env").unwrap(), "prod");
        assert!(!metadata.contains_key("malformed"));
        // The reserved key keeps the real response.
        assert_eq!(metadata.get(META_RESPONSE).unwrap(), "a");
    }

    #[tokio::test]
    async fn test_tag_value_may_contain_colons() {
        let index = Arc::new(RecordingIndex::default());
        let cache = CacheStore::new(Arc::clone(&index) as _);

        cache.add("q", "a", "source:https://example.com").await.unwrap();

        let added = index.added.lock().unwrap();
        let (_, metadata) = &added[0];
        assert_eq!(metadata.get("source").unwrap(), "https://example.com");
    }

    #[test]
    fn test_response_of_extracts_reserved_key() {
        let mut metadata = HashMap::new();
        metadata.insert(META_RESPONSE.to_string(), "cached answer".to_string());
        let fact = RetrievedFact {
            id: "x".to_string(),
            content: "q".to_string(),
            similarity: 0.95,
            metadata,
            embedding: Vec::new(),
        };
        assert_eq!(CacheStore::response_of(&fact), Some("cached answer"));

        let bare = RetrievedFact {
            id: "y".to_string(),
            content: "q".to_string(),
            similarity: 0.95,
            metadata: HashMap::new(),
            embedding: Vec::new(),
        };
        assert_eq!(CacheStore::response_of(&bare), None);
    }
}
