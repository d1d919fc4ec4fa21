//! Document chunk model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use pgvector::Vector;
use sha2::{Digest, Sha256};

use crate::schema::document_chunks;

/// A unit of retrievable text belonging to exactly one data source.
///
/// Chunks are immutable after creation except for embedding backfill, and
/// are deleted when the parent data source is deleted.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = document_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentChunk {
    /// Unique chunk identifier.
    pub id: i64,
    /// Parent data source.
    pub data_source_id: i64,
    /// The chunk text.
    pub content: String,
    /// SHA-256 hash of the content, used for upsert deduplication.
    pub content_sha256: Vec<u8>,
    /// Vector embedding for semantic search; null until backfilled.
    pub embedding: Option<Vector>,
    /// Model used to generate the embedding.
    pub embedding_model: Option<String>,
    /// Additional metadata (JSON).
    pub metadata: serde_json::Value,
    /// Timestamp when the chunk was created.
    pub created_at: Timestamp,
    /// Timestamp when the chunk was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new document chunk.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = document_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDocumentChunk {
    /// Parent data source.
    pub data_source_id: i64,
    /// The chunk text.
    pub content: String,
    /// SHA-256 hash of the content.
    pub content_sha256: Vec<u8>,
    /// Vector embedding.
    pub embedding: Option<Vector>,
    /// Embedding model name.
    pub embedding_model: Option<String>,
    /// Metadata.
    pub metadata: Option<serde_json::Value>,
}

impl NewDocumentChunk {
    /// Creates a new chunk, hashing the content for deduplication.
    pub fn new(data_source_id: i64, content: impl Into<String>) -> Self {
        let content = content.into();
        let content_sha256 = content_digest(&content);

        Self {
            data_source_id,
            content,
            content_sha256,
            embedding: None,
            embedding_model: None,
            metadata: None,
        }
    }

    /// Attaches an embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>, model: impl Into<String>) -> Self {
        self.embedding = Some(Vector::from(embedding));
        self.embedding_model = Some(model.into());
        self
    }

    /// Attaches metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Computes the SHA-256 digest of chunk content.
pub(crate) fn content_digest(content: &str) -> Vec<u8> {
    Sha256::digest(content.as_bytes()).to_vec()
}

impl DocumentChunk {
    /// Returns the embedding dimensions, if an embedding is present.
    pub fn embedding_dimensions(&self) -> Option<usize> {
        self.embedding.as_ref().map(|e| e.as_slice().len())
    }

    /// Returns whether the chunk still needs an embedding backfill.
    pub fn needs_embedding(&self) -> bool {
        self.embedding.is_none()
    }
}

/// A document chunk with its similarity score.
///
/// Returned from similarity search queries.
#[derive(Debug, Clone)]
pub struct ScoredDocumentChunk {
    /// The document chunk.
    pub chunk: DocumentChunk,
    /// Similarity score (0.0 to 1.0, higher is more similar).
    pub score: f64,
}

impl ScoredDocumentChunk {
    /// Returns the similarity score.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Consumes self and returns the inner chunk.
    pub fn into_chunk(self) -> DocumentChunk {
        self.chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content_hashes_identically() {
        let a = NewDocumentChunk::new(1, "meter_id: M-100\nusage_kwh: 412");
        let b = NewDocumentChunk::new(1, "meter_id: M-100\nusage_kwh: 412");
        let c = NewDocumentChunk::new(1, "meter_id: M-101\nusage_kwh: 9");

        assert_eq!(a.content_sha256, b.content_sha256);
        assert_ne!(a.content_sha256, c.content_sha256);
        assert_eq!(a.content_sha256.len(), 32);
    }

    #[test]
    fn test_with_embedding_sets_model() {
        let chunk = NewDocumentChunk::new(1, "content")
            .with_embedding(vec![0.0; 4], "text-embedding-3-small");

        assert!(chunk.embedding.is_some());
        assert_eq!(chunk.embedding_model.as_deref(), Some("text-embedding-3-small"));
    }
}
