//! The dual-path query endpoint.
//!
//! Routes a query and runs the chosen processing path without a chat
//! session: retrieval with a composed answer, the code-execution pipeline,
//! or a clarification prompt.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::{AuthState, ValidateJson};
use crate::handler::dispatch::{self, DispatchOptions, Dispatched};
use crate::handler::request::QueryRequest;
use crate::handler::response::{ErrorResponse, QueryResponse};
use crate::handler::Result;
use crate::service::ServiceState;

/// Tracing target for query operations.
const TRACING_TARGET: &str = "voltra_server::handler::query";

/// Routes and answers a query.
#[tracing::instrument(
    skip_all,
    fields(organization_id = %auth_state.organization_id)
)]
async fn execute_query(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    ValidateJson(request): ValidateJson<QueryRequest>,
) -> Result<(StatusCode, Json<QueryResponse>)> {
    let preprocessed = state.router.preprocess(&request.query);
    let decision = state.router.route(&preprocessed).await;

    tracing::info!(
        target: TRACING_TARGET,
        route = %decision.route,
        confidence = decision.confidence,
        "Query routed"
    );

    let options = DispatchOptions {
        limit: request.limit(),
        threshold: request.threshold(),
        return_raw_output: request.return_raw_output,
    };

    let dispatched = dispatch::dispatch(
        &state,
        auth_state.organization_id,
        &preprocessed,
        &decision,
        &request.data_source_ids,
        options,
    )
    .await?;

    let response = match dispatched {
        Dispatched::Retrieval { chunks, answer } => QueryResponse {
            routing: decision,
            chunks: Some(chunks),
            answer: Some(answer),
            pipeline: None,
            clarification: None,
        },
        Dispatched::Analytical { result } => QueryResponse {
            routing: decision,
            chunks: None,
            answer: None,
            pipeline: Some(result),
            clarification: None,
        },
        Dispatched::Clarification { prompt } => QueryResponse {
            routing: decision,
            chunks: None,
            answer: None,
            pipeline: None,
            clarification: Some(prompt),
        },
    };

    Ok((StatusCode::OK, Json(response)))
}

fn execute_query_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Execute query")
        .description(
            "Classifies the query and runs the chosen processing path: \
             direct retrieval, analytical code execution, or clarification.",
        )
        .response::<200, Json<QueryResponse>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all related routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/query", post_with(execute_query, execute_query_docs))
        .with_path_items(|item| item.tag("Query"))
}
