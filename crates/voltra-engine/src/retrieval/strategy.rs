//! Retrieval strategy trait and the three production tiers.

use async_trait::async_trait;
use pgvector::Vector;
use voltra_postgres::PgClient;
use voltra_postgres::query::DocumentChunkRepository;
use voltra_vector::{SearchOptions, VectorStore, data_source_collection};

use super::entity::extract_probable_entity;
use super::{ChunkMetadata, RetrievalRequest, RetrievedChunk, apply_threshold};
use crate::{EngineResult, TRACING_TARGET};

/// Nominal similarity assigned to text-search matches, which carry no
/// comparable vector score.
const TEXT_MATCH_SIMILARITY: f32 = 0.0;

/// A single retrieval tier.
///
/// Tiers are tried in order by the orchestrator; each one either returns
/// its matches or fails independently of the others.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    /// Tier name, used in logs and result metadata.
    fn name(&self) -> &'static str;

    /// Searches this tier for the request.
    async fn search(&self, request: &RetrievalRequest) -> EngineResult<Vec<RetrievedChunk>>;
}

/// Tier 1: per-source collections in the vector backend.
pub struct VectorBackendStrategy {
    store: std::sync::Arc<VectorStore>,
}

impl VectorBackendStrategy {
    /// Creates the tier over a vector store.
    pub fn new(store: std::sync::Arc<VectorStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RetrievalStrategy for VectorBackendStrategy {
    fn name(&self) -> &'static str {
        "vector_backend"
    }

    async fn search(&self, request: &RetrievalRequest) -> EngineResult<Vec<RetrievedChunk>> {
        let per_source_limit = request.kind.widened_limit(request.limit);
        let mut merged = Vec::new();

        for &source_id in &request.data_source_ids {
            let collection = data_source_collection(source_id);

            // A missing collection is an empty source, not a failure
            if !self.store.collection_exists(&collection).await? {
                tracing::debug!(
                    target: TRACING_TARGET,
                    collection = %collection,
                    "Collection missing, skipping source"
                );
                continue;
            }

            let results = self
                .store
                .search_with_options(
                    &collection,
                    request.embedding.clone(),
                    per_source_limit,
                    SearchOptions::new().with_metadata(),
                )
                .await?;

            merged.extend(results.into_iter().map(|result| {
                let content = result
                    .metadata
                    .get("text")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();

                let source_type = result
                    .metadata
                    .get("source_type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();

                RetrievedChunk {
                    id: result.id,
                    content,
                    metadata: ChunkMetadata {
                        similarity: result.score,
                        source: "vector_backend".into(),
                        source_id,
                        source_type,
                    },
                }
            }));
        }

        Ok(apply_threshold(merged, request.threshold))
    }
}

/// Tier 2: pgvector cosine search over the relational chunk table.
pub struct RelationalVectorStrategy {
    pg: PgClient,
}

impl RelationalVectorStrategy {
    /// Creates the tier over a database client.
    pub fn new(pg: PgClient) -> Self {
        Self { pg }
    }
}

#[async_trait]
impl RetrievalStrategy for RelationalVectorStrategy {
    fn name(&self) -> &'static str {
        "relational_vector"
    }

    async fn search(&self, request: &RetrievalRequest) -> EngineResult<Vec<RetrievedChunk>> {
        let limit = request.kind.widened_limit(request.limit) as i64;
        let mut conn = self.pg.get_connection().await?;

        let scored = conn
            .search_similar_chunks(
                Vector::from(request.embedding.clone()),
                &request.data_source_ids,
                limit,
            )
            .await?;

        let results = scored
            .into_iter()
            .map(|scored| {
                let source_type = scored
                    .chunk
                    .metadata
                    .get("source_type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();

                RetrievedChunk {
                    id: scored.chunk.id.to_string(),
                    content: scored.chunk.content.clone(),
                    metadata: ChunkMetadata {
                        similarity: scored.score as f32,
                        source: "relational_vector".into(),
                        source_id: scored.chunk.data_source_id,
                        source_type,
                    },
                }
            })
            .collect();

        Ok(apply_threshold(results, request.threshold))
    }
}

/// Tier 3: case-insensitive substring search over chunk text.
pub struct RelationalTextStrategy {
    pg: PgClient,
}

impl RelationalTextStrategy {
    /// Creates the tier over a database client.
    pub fn new(pg: PgClient) -> Self {
        Self { pg }
    }
}

#[async_trait]
impl RetrievalStrategy for RelationalTextStrategy {
    fn name(&self) -> &'static str {
        "relational_text"
    }

    async fn search(&self, request: &RetrievalRequest) -> EngineResult<Vec<RetrievedChunk>> {
        // Searching for a probable entity name beats matching the whole
        // question verbatim against record text
        let pattern = extract_probable_entity(&request.query_text)
            .unwrap_or_else(|| request.query_text.clone());

        let mut conn = self.pg.get_connection().await?;

        let chunks = conn
            .search_chunks_by_text(&pattern, &request.data_source_ids, request.limit as i64)
            .await?;

        let results = chunks
            .into_iter()
            .map(|chunk| {
                let source_type = chunk
                    .metadata
                    .get("source_type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();

                RetrievedChunk {
                    id: chunk.id.to_string(),
                    content: chunk.content.clone(),
                    metadata: ChunkMetadata {
                        similarity: TEXT_MATCH_SIMILARITY,
                        source: "relational_text".into(),
                        source_id: chunk.data_source_id,
                        source_type,
                    },
                }
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use voltra_vector::{
        ScrollPage, SearchResult, VectorData, VectorStoreBackend, VectorStoreConfig, QdrantConfig,
        VectorResult,
    };

    use super::*;
    use crate::retrieval::QueryKind;

    /// In-memory backend: cosine scores are faked as 1.0 for every stored
    /// vector, which is enough to exercise collection lifecycle behavior.
    #[derive(Default)]
    struct MemoryBackend {
        collections: Mutex<HashMap<String, Vec<VectorData>>>,
    }

    #[async_trait]
    impl VectorStoreBackend for MemoryBackend {
        async fn create_collection(&self, name: &str, _dimensions: usize) -> VectorResult<()> {
            self.collections
                .lock()
                .unwrap()
                .entry(name.to_string())
                .or_default();
            Ok(())
        }

        async fn delete_collection(&self, name: &str) -> VectorResult<()> {
            self.collections.lock().unwrap().remove(name);
            Ok(())
        }

        async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
            Ok(self.collections.lock().unwrap().contains_key(name))
        }

        async fn list_collections(&self) -> VectorResult<Vec<String>> {
            Ok(self.collections.lock().unwrap().keys().cloned().collect())
        }

        async fn upsert(&self, collection: &str, vectors: Vec<VectorData>) -> VectorResult<()> {
            self.collections
                .lock()
                .unwrap()
                .entry(collection.to_string())
                .or_default()
                .extend(vectors);
            Ok(())
        }

        async fn search(
            &self,
            collection: &str,
            _query: Vec<f32>,
            limit: usize,
            _options: voltra_vector::SearchOptions,
        ) -> VectorResult<Vec<SearchResult>> {
            let collections = self.collections.lock().unwrap();
            let vectors = collections.get(collection).cloned().unwrap_or_default();

            Ok(vectors
                .into_iter()
                .take(limit)
                .map(|data| SearchResult {
                    id: data.id,
                    score: 1.0,
                    vector: None,
                    metadata: data.metadata,
                })
                .collect())
        }

        async fn delete(&self, collection: &str, ids: Vec<String>) -> VectorResult<()> {
            if let Some(vectors) = self.collections.lock().unwrap().get_mut(collection) {
                vectors.retain(|v| !ids.contains(&v.id));
            }
            Ok(())
        }

        async fn scroll(
            &self,
            collection: &str,
            _offset: Option<String>,
            limit: usize,
        ) -> VectorResult<ScrollPage> {
            let collections = self.collections.lock().unwrap();
            let vectors = collections
                .get(collection)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .take(limit)
                .collect();

            Ok(ScrollPage {
                vectors,
                next_offset: None,
            })
        }
    }

    fn memory_store() -> Arc<VectorStore> {
        Arc::new(VectorStore::from_backend(
            VectorStoreConfig::Qdrant(QdrantConfig::new("http://test.invalid")),
            Box::new(MemoryBackend::default()),
        ))
    }

    fn request(data_source_ids: Vec<i64>) -> RetrievalRequest {
        RetrievalRequest {
            embedding: vec![0.0; 4],
            query_text: "usage for meter M-100".into(),
            data_source_ids,
            limit: 10,
            threshold: 0.5,
            kind: QueryKind::Standard,
        }
    }

    #[tokio::test]
    async fn test_search_after_collection_delete_returns_empty() {
        let store = memory_store();
        let collection = data_source_collection(7);

        store
            .upsert(
                &collection,
                vec![
                    VectorData::new("7_record_0", vec![0.1; 4])
                        .with_field("text", serde_json::json!("meter_id: M-100")),
                ],
            )
            .await
            .unwrap();

        let strategy = VectorBackendStrategy::new(store.clone());

        let before = strategy.search(&request(vec![7])).await.unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].content, "meter_id: M-100");

        store.delete_collection(&collection).await.unwrap();

        // A deleted source's collection is simply skipped: empty, not an error
        let after = strategy.search(&request(vec![7])).await.unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_missing_collections_are_skipped() {
        let store = memory_store();
        store
            .upsert(
                &data_source_collection(1),
                vec![
                    VectorData::new("1_record_0", vec![0.1; 4])
                        .with_field("text", serde_json::json!("site: Harbor Point")),
                ],
            )
            .await
            .unwrap();

        let strategy = VectorBackendStrategy::new(store);

        // Source 2 was never ingested; only source 1 contributes
        let results = strategy.search(&request(vec![1, 2])).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.source_id, 1);
    }
}
