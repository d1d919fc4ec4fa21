//! Tiered retrieval orchestration.
//!
//! Strategies are tried in order until one yields results. A tier that
//! fails is logged and skipped; a tier that succeeds with an empty result
//! set also falls through, since the next tier may still find matches. The
//! call only errors when every tier failed outright.

mod entity;
mod strategy;

pub use strategy::{
    RelationalTextStrategy, RelationalVectorStrategy, RetrievalStrategy, VectorBackendStrategy,
};

use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult, TRACING_TARGET};

/// Per-source search limit for analytical queries.
const ANALYTICAL_SEARCH_LIMIT: usize = 100;

/// Per-source search limit for entity-count queries.
const ENTITY_COUNT_SEARCH_LIMIT: usize = 500;

/// How a query should be treated during retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Plain lookup; the caller limit is used as-is.
    #[default]
    Standard,
    /// Analytical query; more evidence is gathered for aggregation.
    Analytical,
    /// Entity-count query; the widest evidence sweep.
    EntityCount,
}

impl QueryKind {
    /// Returns the per-source backend limit for this kind.
    ///
    /// Analytical and entity-count queries request more than the caller
    /// asked for so downstream aggregation has enough evidence; the final
    /// result is still truncated to the caller limit.
    pub fn widened_limit(&self, caller_limit: usize) -> usize {
        match self {
            Self::Standard => caller_limit,
            Self::Analytical => caller_limit.max(ANALYTICAL_SEARCH_LIMIT),
            Self::EntityCount => caller_limit.max(ENTITY_COUNT_SEARCH_LIMIT),
        }
    }

    /// Returns whether entity aggregation applies.
    pub fn wants_entity_summary(&self) -> bool {
        matches!(self, Self::Analytical | Self::EntityCount)
    }
}

/// A retrieval request after input validation.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    /// Query embedding.
    pub embedding: Vec<f32>,
    /// The query text (original casing, for entity heuristics).
    pub query_text: String,
    /// Numeric data-source ids to search.
    pub data_source_ids: Vec<i64>,
    /// Maximum results to return.
    pub limit: usize,
    /// Minimum similarity for vector matches.
    pub threshold: f32,
    /// Query kind.
    pub kind: QueryKind,
}

/// Metadata attached to each retrieved chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Similarity score; 1.0 for synthetic summary chunks.
    pub similarity: f32,
    /// Which tier produced the chunk.
    pub source: String,
    /// The data source the chunk belongs to.
    pub source_id: i64,
    /// The data source kind, when known.
    pub source_type: String,
}

/// A chunk-like record produced by retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk identifier (backend-specific).
    pub id: String,
    /// Chunk text.
    pub content: String,
    /// Retrieval metadata.
    pub metadata: ChunkMetadata,
}

/// Filters vector-tier results by the similarity threshold.
///
/// Applied inside the vector-backed tiers only; the text tier has no
/// comparable score.
pub(crate) fn apply_threshold(
    mut results: Vec<RetrievedChunk>,
    threshold: f32,
) -> Vec<RetrievedChunk> {
    results.retain(|chunk| chunk.metadata.similarity >= threshold);
    results
}

/// Orchestrates an ordered list of retrieval strategies.
pub struct RetrievalOrchestrator {
    strategies: Vec<Box<dyn RetrievalStrategy>>,
}

impl RetrievalOrchestrator {
    /// Creates an orchestrator over the given tiers, tried in order.
    pub fn new(strategies: Vec<Box<dyn RetrievalStrategy>>) -> Self {
        Self { strategies }
    }

    /// Searches the configured tiers for the request.
    ///
    /// Returns the ranked result list, or [`EngineError::RetrievalExhausted`]
    /// when every tier failed. An empty list is a valid outcome when at
    /// least one tier succeeded but found nothing.
    pub async fn search(&self, request: &RetrievalRequest) -> EngineResult<Vec<RetrievedChunk>> {
        if request.data_source_ids.is_empty() {
            return Ok(vec![]);
        }

        let mut any_tier_succeeded = false;

        for strategy in &self.strategies {
            match strategy.search(request).await {
                Ok(results) if !results.is_empty() => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        strategy = strategy.name(),
                        results = results.len(),
                        "Retrieval tier produced results"
                    );
                    return Ok(self.finalize(results, request));
                }
                Ok(_) => {
                    any_tier_succeeded = true;
                    tracing::debug!(
                        target: TRACING_TARGET,
                        strategy = strategy.name(),
                        "Retrieval tier returned no results, falling through"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        strategy = strategy.name(),
                        error = %e,
                        "Retrieval tier failed, falling through"
                    );
                }
            }
        }

        if any_tier_succeeded {
            Ok(vec![])
        } else {
            Err(EngineError::RetrievalExhausted {
                attempted: self.strategies.len(),
            })
        }
    }

    /// Sorts, truncates, and (for analytical kinds) prepends the entity
    /// count summary.
    fn finalize(
        &self,
        mut results: Vec<RetrievedChunk>,
        request: &RetrievalRequest,
    ) -> Vec<RetrievedChunk> {
        results.sort_by(|a, b| {
            b.metadata
                .similarity
                .total_cmp(&a.metadata.similarity)
        });
        results.truncate(request.limit);

        if request.kind.wants_entity_summary()
            && let Some(summary) = entity::entity_count_summary(&results)
        {
            results.insert(0, summary);
        }

        results
    }
}

impl std::fmt::Debug for RetrievalOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("RetrievalOrchestrator")
            .field("strategies", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Stub tier that records its invocations in a shared log.
    struct StubStrategy {
        name: &'static str,
        outcome: fn() -> EngineResult<Vec<RetrievedChunk>>,
        log: std::sync::Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl RetrievalStrategy for StubStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _request: &RetrievalRequest) -> EngineResult<Vec<RetrievedChunk>> {
            self.log.lock().unwrap().push(self.name);
            (self.outcome)()
        }
    }

    fn chunk(id: &str, similarity: f32) -> RetrievedChunk {
        RetrievedChunk {
            id: id.to_string(),
            content: format!("content for {id}"),
            metadata: ChunkMetadata {
                similarity,
                source: "stub".into(),
                source_id: 1,
                source_type: "csv".into(),
            },
        }
    }

    fn request(kind: QueryKind) -> RetrievalRequest {
        RetrievalRequest {
            embedding: vec![0.0; 4],
            query_text: "total usage".into(),
            data_source_ids: vec![1],
            limit: 10,
            threshold: 0.5,
            kind,
        }
    }

    fn orchestrator(
        tiers: Vec<(&'static str, fn() -> EngineResult<Vec<RetrievedChunk>>)>,
    ) -> (
        RetrievalOrchestrator,
        std::sync::Arc<Mutex<Vec<&'static str>>>,
    ) {
        let log = std::sync::Arc::new(Mutex::new(Vec::new()));
        let strategies = tiers
            .into_iter()
            .map(|(name, outcome)| {
                Box::new(StubStrategy {
                    name,
                    outcome,
                    log: log.clone(),
                }) as Box<dyn RetrievalStrategy>
            })
            .collect();

        (RetrievalOrchestrator::new(strategies), log)
    }

    #[tokio::test]
    async fn test_results_ordered_by_descending_similarity() {
        let (orchestrator, _) = orchestrator(vec![(
            "vector",
            || Ok(vec![chunk("a", 0.6), chunk("b", 0.9), chunk("c", 0.7)]),
        )]);

        let results = orchestrator.search(&request(QueryKind::Standard)).await.unwrap();
        let scores: Vec<f32> = results.iter().map(|c| c.metadata.similarity).collect();
        assert_eq!(scores, vec![0.9, 0.7, 0.6]);
    }

    #[tokio::test]
    async fn test_relational_fallback_invoked_once_before_text() {
        let (orchestrator, log) = orchestrator(vec![
            ("vector", || Ok(vec![])),
            ("relational_vector", || Ok(vec![])),
            ("relational_text", || Ok(vec![chunk("t", 0.0)])),
        ]);

        let results = orchestrator.search(&request(QueryKind::Standard)).await.unwrap();
        assert_eq!(results.len(), 1);

        let calls = log.lock().unwrap().clone();
        assert_eq!(calls, vec!["vector", "relational_vector", "relational_text"]);
        assert_eq!(
            calls.iter().filter(|c| **c == "relational_vector").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_failed_tier_is_skipped() {
        let (orchestrator, _) = orchestrator(vec![
            ("vector", || Err(EngineError::SourceNotFound(9))),
            ("relational_vector", || Ok(vec![chunk("r", 0.8)])),
        ]);

        let results = orchestrator.search(&request(QueryKind::Standard)).await.unwrap();
        assert_eq!(results[0].id, "r");
    }

    #[tokio::test]
    async fn test_exhaustion_errors_only_when_all_tiers_fail() {
        let (orchestrator, _) = orchestrator(vec![
            ("vector", || Err(EngineError::SourceNotFound(1))),
            ("relational_vector", || Err(EngineError::SourceNotFound(1))),
        ]);

        let result = orchestrator.search(&request(QueryKind::Standard)).await;
        assert!(matches!(
            result,
            Err(EngineError::RetrievalExhausted { attempted: 2 })
        ));
    }

    #[tokio::test]
    async fn test_empty_tiers_yield_empty_not_error() {
        let (orchestrator, _) = orchestrator(vec![
            ("vector", || Ok(vec![])),
            ("relational_vector", || Ok(vec![])),
            ("relational_text", || Ok(vec![])),
        ]);

        let results = orchestrator.search(&request(QueryKind::Standard)).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_analytical_prepends_entity_summary() {
        let (orchestrator, _) = orchestrator(vec![(
            "vector",
            || {
                Ok(vec![
                    RetrievedChunk {
                        id: "1".into(),
                        content: "customer: Acme Energy\nusage_kwh: 412".into(),
                        metadata: ChunkMetadata {
                            similarity: 0.9,
                            source: "stub".into(),
                            source_id: 1,
                            source_type: "csv".into(),
                        },
                    },
                    RetrievedChunk {
                        id: "2".into(),
                        content: "customer: Acme Energy\nusage_kwh: 9".into(),
                        metadata: ChunkMetadata {
                            similarity: 0.8,
                            source: "stub".into(),
                            source_id: 1,
                            source_type: "csv".into(),
                        },
                    },
                ])
            },
        )]);

        let results = orchestrator
            .search(&request(QueryKind::Analytical))
            .await
            .unwrap();

        assert_eq!(results[0].metadata.similarity, 1.0);
        assert!(results[0].content.contains("Acme Energy"));
        assert!(results[0].id.starts_with("entity-summary"));
    }

    #[test]
    fn test_threshold_filter() {
        let results = vec![chunk("a", 0.9), chunk("b", 0.6), chunk("c", 0.3)];
        let filtered = apply_threshold(results, 0.5);
        let ids: Vec<&str> = filtered.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_widened_limits() {
        assert_eq!(QueryKind::Standard.widened_limit(10), 10);
        assert_eq!(QueryKind::Analytical.widened_limit(10), 100);
        assert_eq!(QueryKind::EntityCount.widened_limit(10), 500);
    }
}
