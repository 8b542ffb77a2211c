//! SQLite-backed vector collection with in-process cosine ranking.
//!
//! Documents live in one `documents` table keyed by collection name, so
//! the cache and retriever share a single database file. Ranking is a
//! brute-force cosine scan, which is the right trade-off for the
//! collection sizes this service holds (result sets cap at
//! [`MAX_RESULTS`]).

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, params};
use uuid::Uuid;

use super::{Embedder, MAX_RESULTS, RetrievedFact, SemanticIndex};
use crate::error::{Error, StoreError};

/// Schema for the shared vector database.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id          TEXT PRIMARY KEY,
    collection  TEXT NOT NULL,
    content     TEXT NOT NULL,
    metadata    TEXT NOT NULL,
    embedding   BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
";

/// Opens (and migrates) the shared vector database.
///
/// # Errors
///
/// Returns [`Error::Database`] if the file cannot be opened or the
/// schema cannot be applied.
pub fn open_vector_db(path: &Path) -> Result<Arc<Mutex<Connection>>, Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::Config {
            message: format!("cannot create {}: {e}", parent.display()),
        })?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// One named collection inside the shared vector database.
pub struct VectorCollection {
    conn: Arc<Mutex<Connection>>,
    name: String,
    embedder: Arc<dyn Embedder>,
}

impl VectorCollection {
    /// Creates a handle to the named collection.
    #[must_use]
    pub fn new(conn: Arc<Mutex<Connection>>, name: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            conn,
            name: name.into(),
            embedder,
        }
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl std::fmt::Debug for VectorCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorCollection")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait::async_trait]
impl SemanticIndex for VectorCollection {
    async fn add(
        &self,
        content: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String, StoreError> {
        let embedding = self.embedder.embed(content).await?;
        let id = Uuid::new_v4().to_string();
        let metadata_json =
            serde_json::to_string(&metadata).map_err(|e| StoreError::Corrupt {
                id: id.clone(),
                message: format!("metadata encode: {e}"),
            })?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (id, collection, content, metadata, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, self.name, content, metadata_json, encode_embedding(&embedding)],
        )?;
        Ok(id)
    }

    async fn query(&self, text: &str) -> Result<Vec<RetrievedFact>, StoreError> {
        // Count first: an empty collection short-circuits without an
        // embedding round-trip.
        {
            let conn = self.lock()?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![self.name],
                |row| row.get(0),
            )?;
            if count == 0 {
                return Ok(Vec::new());
            }
        }

        let query_embedding = self.embedder.embed(text).await?;

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, content, metadata, embedding FROM documents WHERE collection = ?1",
        )?;
        let rows = stmt.query_map(params![self.name], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut facts = Vec::new();
        for row in rows {
            let (id, content, metadata_json, embedding_blob) = row?;
            let metadata: HashMap<String, String> = serde_json::from_str(&metadata_json)
                .map_err(|e| StoreError::Corrupt {
                    id: id.clone(),
                    message: format!("metadata decode: {e}"),
                })?;
            let embedding = decode_embedding(&embedding_blob);
            let similarity = cosine_similarity(&query_embedding, &embedding);
            facts.push(RetrievedFact {
                id,
                content,
                similarity,
                metadata,
                embedding,
            });
        }

        facts.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        facts.truncate(MAX_RESULTS);
        Ok(facts)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![self.name, id],
        )?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM documents WHERE collection = ?1",
            params![self.name],
        )?;
        Ok(())
    }
}

/// Encodes an embedding as little-endian `f32` bytes.
fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decodes little-endian `f32` bytes back into an embedding.
fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity clamped to `[0, 1]`.
///
/// Mismatched dimensions or zero-norm vectors score 0 rather than
/// erroring; a document that cannot be compared is simply irrelevant.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}
