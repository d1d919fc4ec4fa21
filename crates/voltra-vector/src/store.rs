//! Vector store trait and unified facade.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::config::VectorStoreConfig;
use crate::error::VectorResult;
use crate::pgvector::PgVectorBackend;
use crate::qdrant::QdrantBackend;

/// Returns the collection name owned by a data source.
///
/// The `datasource_{id}` scheme is shared with the ingestion pipeline; both
/// sides must agree on it for retrieval to find anything.
pub fn data_source_collection(data_source_id: i64) -> String {
    format!("datasource_{data_source_id}")
}

/// Vector data to be stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorData {
    /// Unique identifier for the vector.
    pub id: String,
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Optional metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl VectorData {
    /// Creates a new vector data with an ID and embedding.
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata: HashMap::new(),
        }
    }

    /// Adds metadata to the vector.
    pub fn with_metadata(
        mut self,
        metadata: impl IntoIterator<Item = (impl Into<String>, serde_json::Value)>,
    ) -> Self {
        self.metadata = metadata.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    /// Adds a single metadata field.
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Search result from a vector query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Vector ID.
    pub id: String,
    /// Similarity score.
    pub score: f32,
    /// The vector (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    /// Associated metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Search options.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Include vectors in results.
    pub include_vectors: bool,
    /// Include metadata in results.
    pub include_metadata: bool,
    /// Metadata filter (backend-specific JSON).
    pub filter: Option<serde_json::Value>,
}

impl SearchOptions {
    /// Creates default search options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include vectors in results.
    pub fn with_vectors(mut self) -> Self {
        self.include_vectors = true;
        self
    }

    /// Include metadata in results.
    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }

    /// Set a metadata filter.
    pub fn with_filter(mut self, filter: serde_json::Value) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// A page of vectors returned by [`VectorStoreBackend::scroll`].
#[derive(Debug, Clone, Default)]
pub struct ScrollPage {
    /// The vectors in this page.
    pub vectors: Vec<VectorData>,
    /// Offset token for the next page, if any.
    pub next_offset: Option<String>,
}

/// Trait for vector store backends.
#[async_trait]
pub trait VectorStoreBackend: Send + Sync {
    /// Creates or ensures a collection exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> VectorResult<()>;

    /// Deletes a collection.
    async fn delete_collection(&self, name: &str) -> VectorResult<()>;

    /// Checks if a collection exists.
    async fn collection_exists(&self, name: &str) -> VectorResult<bool>;

    /// Lists all collection names.
    async fn list_collections(&self) -> VectorResult<Vec<String>>;

    /// Upserts vectors into a collection.
    async fn upsert(&self, collection: &str, vectors: Vec<VectorData>) -> VectorResult<()>;

    /// Searches for similar vectors.
    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
        options: SearchOptions,
    ) -> VectorResult<Vec<SearchResult>>;

    /// Deletes vectors by their IDs.
    async fn delete(&self, collection: &str, ids: Vec<String>) -> VectorResult<()>;

    /// Pages through a collection's vectors.
    async fn scroll(
        &self,
        collection: &str,
        offset: Option<String>,
        limit: usize,
    ) -> VectorResult<ScrollPage>;
}

/// Unified vector store that wraps backend implementations.
pub struct VectorStore {
    config: VectorStoreConfig,
    backend: Box<dyn VectorStoreBackend>,
}

impl VectorStore {
    /// Creates a new vector store from configuration.
    pub async fn new(config: VectorStoreConfig) -> VectorResult<Self> {
        let backend: Box<dyn VectorStoreBackend> = match &config {
            VectorStoreConfig::Qdrant(cfg) => Box::new(QdrantBackend::new(cfg).await?),
            VectorStoreConfig::PgVector(cfg) => Box::new(PgVectorBackend::new(cfg).await?),
        };

        tracing::info!(
            target: TRACING_TARGET,
            backend = %config.backend_name(),
            "Vector store initialized"
        );

        Ok(Self { config, backend })
    }

    /// Wraps an existing backend implementation.
    ///
    /// Used by tests and by callers that construct backends themselves.
    pub fn from_backend(config: VectorStoreConfig, backend: Box<dyn VectorStoreBackend>) -> Self {
        Self { config, backend }
    }

    /// Creates or ensures a collection exists.
    pub async fn create_collection(&self, name: &str, dimensions: usize) -> VectorResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            collection = %name,
            dimensions = %dimensions,
            "Creating collection"
        );
        self.backend.create_collection(name, dimensions).await
    }

    /// Deletes a collection.
    pub async fn delete_collection(&self, name: &str) -> VectorResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            collection = %name,
            "Deleting collection"
        );
        self.backend.delete_collection(name).await
    }

    /// Checks if a collection exists.
    pub async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        self.backend.collection_exists(name).await
    }

    /// Lists all collection names.
    pub async fn list_collections(&self) -> VectorResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Upserts vectors into a collection.
    pub async fn upsert(&self, collection: &str, vectors: Vec<VectorData>) -> VectorResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            collection = %collection,
            count = %vectors.len(),
            "Upserting vectors"
        );
        self.backend.upsert(collection, vectors).await
    }

    /// Searches for similar vectors.
    pub async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
    ) -> VectorResult<Vec<SearchResult>> {
        self.search_with_options(collection, query, limit, SearchOptions::default())
            .await
    }

    /// Searches for similar vectors with options.
    pub async fn search_with_options(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
        options: SearchOptions,
    ) -> VectorResult<Vec<SearchResult>> {
        tracing::debug!(
            target: TRACING_TARGET,
            collection = %collection,
            limit = %limit,
            "Searching vectors"
        );
        self.backend.search(collection, query, limit, options).await
    }

    /// Deletes vectors by their IDs.
    pub async fn delete(&self, collection: &str, ids: Vec<String>) -> VectorResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            collection = %collection,
            count = %ids.len(),
            "Deleting vectors"
        );
        self.backend.delete(collection, ids).await
    }

    /// Pages through a collection's vectors.
    pub async fn scroll(
        &self,
        collection: &str,
        offset: Option<String>,
        limit: usize,
    ) -> VectorResult<ScrollPage> {
        self.backend.scroll(collection, offset, limit).await
    }
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("backend", &self.config.backend_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_collection_name() {
        assert_eq!(data_source_collection(42), "datasource_42");
    }

    #[test]
    fn test_vector_data_builder() {
        let data = VectorData::new("42_record_0", vec![0.1, 0.2])
            .with_field("source", serde_json::json!("csv_processor"));

        assert_eq!(data.id, "42_record_0");
        assert_eq!(data.metadata["source"], serde_json::json!("csv_processor"));
    }
}
