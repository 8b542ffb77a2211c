//! Semantic storage: the vector-backed cache and retriever collections.
//!
//! Both collections share one SQLite file and one embedding client; they
//! differ only in collection name and in the metadata conventions layered
//! on top ([`CacheStore`] reserves the `RESPONSE` key, [`RetrieverStore`]
//! recognizes `TOOL` descriptors).

pub mod cache;
pub mod embedding;
pub mod retriever;
pub mod vector;

pub use cache::CacheStore;
pub use embedding::{Embedder, OpenAiEmbedder};
pub use retriever::RetrieverStore;
pub use vector::{VectorCollection, open_vector_db};

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Maximum results returned by a similarity query. Queries against
/// smaller collections clamp to however many documents exist.
pub const MAX_RESULTS: usize = 25;

/// Metadata key distinguishing tool descriptors from plain facts.
pub const META_TYPE: &str = "type";
/// Metadata key carrying the tool name on a `TOOL` descriptor.
pub const META_NAME: &str = "name";
/// Reserved metadata key holding the canonical cached answer.
pub const META_RESPONSE: &str = "RESPONSE";
/// Value of [`META_TYPE`] marking a tool descriptor.
pub const TYPE_TOOL: &str = "TOOL";

/// A document returned by a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedFact {
    /// Opaque unique id assigned at insert time.
    pub id: String,
    /// The stored fact text.
    pub content: String,
    /// Similarity to the query embedding, in `[0, 1]`.
    pub similarity: f32,
    /// Free-form string metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// The stored embedding. Stripped at the transport layer unless
    /// explicitly requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

/// Contract shared by the cache and retriever collections.
///
/// Querying an empty collection returns an empty result, not an error.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Stores `content` with `metadata`, returning the assigned id.
    async fn add(
        &self,
        content: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String, StoreError>;

    /// Returns up to [`MAX_RESULTS`] documents ranked by similarity to
    /// `text`, most similar first.
    async fn query(&self, text: &str) -> Result<Vec<RetrievedFact>, StoreError>;

    /// Deletes the document with the given id. Deleting an unknown id is
    /// a no-op.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Drops every document in the collection.
    async fn clear(&self) -> Result<(), StoreError>;
}
