//! Knowledge-base retriever.
//!
//! A thin convenience over the shared semantic index: plain facts carry
//! free-form metadata, and facts whose metadata marks them as `TOOL`
//! descriptors route the query to the deterministic tool layer instead
//! of the prompt.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StoreError;

use super::{META_NAME, META_TYPE, RetrievedFact, SemanticIndex, TYPE_TOOL};

/// Vector-backed store of facts and tool descriptors.
pub struct RetrieverStore {
    index: Arc<dyn SemanticIndex>,
}

impl RetrieverStore {
    /// Wraps a semantic index as the knowledge retriever.
    #[must_use]
    pub fn new(index: Arc<dyn SemanticIndex>) -> Self {
        Self { index }
    }

    /// Stores a fact with its metadata, returning the assigned id.
    ///
    /// # Errors
    ///
    /// Propagates embedding and database failures from the index.
    pub async fn add(
        &self,
        fact: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String, StoreError> {
        self.index.add(fact, metadata).await
    }

    /// Returns facts ranked by similarity to `text`.
    ///
    /// # Errors
    ///
    /// Propagates embedding and database failures from the index.
    pub async fn query(&self, text: &str) -> Result<Vec<RetrievedFact>, StoreError> {
        self.index.query(text).await
    }

    /// Deletes one fact by id.
    ///
    /// # Errors
    ///
    /// Propagates database failures from the index.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.index.delete(id).await
    }

    /// Drops every fact.
    ///
    /// # Errors
    ///
    /// Propagates database failures from the index.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.index.clear().await
    }

    /// Returns the tool name if this fact is a tool descriptor. A
    /// descriptor with no `name` key yields the empty string, which the
    /// router resolves to its default tool.
    #[must_use]
    pub fn tool_name(fact: &RetrievedFact) -> Option<&str> {
        if fact.metadata.get(META_TYPE).map(String::as_str) == Some(TYPE_TOOL) {
            Some(fact.metadata.get(META_NAME).map_or("", String::as_str))
        } else {
            None
        }
    }
}

impl std::fmt::Debug for RetrieverStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieverStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact_with(metadata: HashMap<String, String>) -> RetrievedFact {
        RetrievedFact {
            id: "x".to_string(),
            content: "c".to_string(),
            similarity: 0.7,
            metadata,
            embedding: Vec::new(),
        }
    }

    #[test]
    fn test_tool_name_on_descriptor() {
        let mut metadata = HashMap::new();
        metadata.insert(META_TYPE.to_string(), TYPE_TOOL.to_string());
        metadata.insert(META_NAME.to_string(), "kpi".to_string());
        assert_eq!(RetrieverStore::tool_name(&fact_with(metadata)), Some("kpi"));
    }

    #[test]
    fn test_tool_name_absent_on_plain_fact() {
        assert_eq!(RetrieverStore::tool_name(&fact_with(HashMap::new())), None);
    }

    #[test]
    fn test_descriptor_without_name_yields_empty_name() {
        let mut metadata = HashMap::new();
        metadata.insert(META_TYPE.to_string(), TYPE_TOOL.to_string());
        assert_eq!(RetrieverStore::tool_name(&fact_with(metadata)), Some(""));
    }

    #[test]
    fn test_tool_name_requires_tool_type() {
        // A "name" key without the TOOL type marker is just metadata.
        let mut metadata = HashMap::new();
        metadata.insert(META_NAME.to_string(), "kpi".to_string());
        assert_eq!(RetrieverStore::tool_name(&fact_with(metadata)), None);
    }
}
