//! Shared route-dispatch logic for the chat and query endpoints.

use voltra_engine::parse_data_source_ids;
use voltra_engine::pipeline::{PipelineOptions, PipelineResult};
use voltra_engine::retrieval::{QueryKind, RetrievalRequest, RetrievedChunk};
use voltra_rig::router::{PreprocessedQuery, QueryRoute, RoutingDecision};
use voltra_sandbox::VisualizationFormat;

use crate::handler::Result;
use crate::service::ServiceState;

/// Tracing target for query dispatch.
const TRACING_TARGET: &str = "voltra_server::handler::dispatch";

/// Canned reply for under-specified queries.
const CLARIFICATION_PROMPT: &str = "I need a bit more detail to answer that. \
    Which data source, time range, or metric are you asking about?";

/// Caller knobs forwarded into dispatch.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DispatchOptions {
    pub limit: usize,
    pub threshold: f32,
    pub return_raw_output: bool,
}

/// Outcome of dispatching a routed query.
pub(crate) enum Dispatched {
    /// Direct retrieval: chunks plus a composed answer.
    Retrieval {
        chunks: Vec<RetrievedChunk>,
        answer: String,
    },
    /// Analytical: the structured pipeline result.
    Analytical { result: PipelineResult },
    /// Clarification request.
    Clarification { prompt: String },
}

/// Executes the processing path the router chose.
pub(crate) async fn dispatch(
    state: &ServiceState,
    organization_id: i64,
    preprocessed: &PreprocessedQuery,
    decision: &RoutingDecision,
    raw_data_source_ids: &[String],
    options: DispatchOptions,
) -> Result<Dispatched> {
    match decision.route {
        QueryRoute::DirectRetrieval => {
            let data_source_ids = parse_data_source_ids(raw_data_source_ids)?;

            let embedding = state
                .embeddings
                .embed_query(&preprocessed.normalized)
                .await?;

            let request = RetrievalRequest {
                embedding,
                query_text: preprocessed.original.clone(),
                data_source_ids,
                limit: options.limit,
                threshold: options.threshold,
                kind: QueryKind::Standard,
            };

            let chunks = state.retrieval.search(&request).await?;

            tracing::debug!(
                target: TRACING_TARGET,
                chunks = chunks.len(),
                "Dispatching retrieval answer"
            );

            let context: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            let answer = state
                .composer
                .answer_with_context(&preprocessed.original, &context, vec![])
                .await?;

            Ok(Dispatched::Retrieval { chunks, answer })
        }
        QueryRoute::AnalyticalTask => {
            let pipeline_options = PipelineOptions {
                preferred_format: decision
                    .requires_visualization
                    .then_some(VisualizationFormat::Html),
                return_raw_output: options.return_raw_output,
                ..Default::default()
            };

            let result = state
                .pipeline
                .execute(
                    organization_id,
                    &preprocessed.original,
                    raw_data_source_ids,
                    pipeline_options,
                )
                .await?;

            Ok(Dispatched::Analytical { result })
        }
        QueryRoute::ClarificationNeeded => Ok(Dispatched::Clarification {
            prompt: CLARIFICATION_PROMPT.to_string(),
        }),
    }
}

impl Dispatched {
    /// The assistant-facing text for this outcome.
    pub(crate) fn content(&self) -> String {
        match self {
            Self::Retrieval { answer, .. } => answer.clone(),
            Self::Analytical { result } => {
                if result.stdout.is_empty() {
                    result.explanation.clone()
                } else {
                    format!("{}\n\n{}", result.explanation, result.stdout)
                }
            }
            Self::Clarification { prompt } => prompt.clone(),
        }
    }

    /// Message metadata recorded alongside the assistant reply.
    pub(crate) fn metadata(&self, state: &ServiceState, decision: &RoutingDecision) -> serde_json::Value {
        let mut metadata = serde_json::json!({
            "routing": decision,
            "model": state.composer.provider().model_name(),
        });

        if let Self::Analytical { result } = self {
            metadata["success"] = serde_json::json!(result.success);
            if let Some(code) = &result.generated_code {
                metadata["model"] = serde_json::json!(code.model);
                metadata["codeCategory"] = serde_json::json!(code.category);
            }
            if let Some(visualization) = &result.visualization {
                metadata["visualization"] = serde_json::json!(visualization);
            }
        }

        metadata
    }
}
