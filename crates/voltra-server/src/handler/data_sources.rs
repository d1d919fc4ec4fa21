//! Data source handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use voltra_postgres::query::{DataSourceRepository, DocumentChunkRepository};

use crate::extract::AuthState;
use crate::handler::request::{DataSourcePathParams, PaginationParams};
use crate::handler::response::{DataSource, ErrorResponse, IngestSummary};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for data source operations.
const TRACING_TARGET: &str = "voltra_server::handler::data_sources";

/// Lists the organization's data sources.
#[tracing::instrument(
    skip_all,
    fields(organization_id = %auth_state.organization_id)
)]
async fn list_data_sources(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    Query(pagination): Query<PaginationParams>,
) -> Result<(StatusCode, Json<Vec<DataSource>>)> {
    let mut conn = state.postgres.get_connection().await?;

    let sources = conn
        .list_data_sources(auth_state.organization_id, pagination.into())
        .await?;

    let response = sources.into_iter().map(DataSource::from_model).collect();

    Ok((StatusCode::OK, Json(response)))
}

fn list_data_sources_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List data sources")
        .description("Lists the organization's data sources, excluding deleted ones.")
        .response::<200, Json<Vec<DataSource>>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Gets a data source by id.
#[tracing::instrument(
    skip_all,
    fields(
        organization_id = %auth_state.organization_id,
        data_source_id = %path_params.data_source_id,
    )
)]
async fn get_data_source(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    Path(path_params): Path<DataSourcePathParams>,
) -> Result<(StatusCode, Json<DataSource>)> {
    let mut conn = state.postgres.get_connection().await?;

    let source = find_data_source(
        &mut conn,
        auth_state.organization_id,
        path_params.data_source_id,
    )
    .await?;

    Ok((StatusCode::OK, Json(DataSource::from_model(source))))
}

fn get_data_source_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get data source")
        .description("Returns data source details by id.")
        .response::<200, Json<DataSource>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a data source.
///
/// Soft-deletes the row, removes every chunk, and drops the source's
/// vector collection. A later search over the id returns empty rather than
/// erroring, since missing collections are skipped during retrieval.
#[tracing::instrument(
    skip_all,
    fields(
        organization_id = %auth_state.organization_id,
        data_source_id = %path_params.data_source_id,
    )
)]
async fn delete_data_source(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    Path(path_params): Path<DataSourcePathParams>,
) -> Result<StatusCode> {
    tracing::debug!(target: TRACING_TARGET, "Deleting data source");

    let mut conn = state.postgres.get_connection().await?;

    let source = find_data_source(
        &mut conn,
        auth_state.organization_id,
        path_params.data_source_id,
    )
    .await?;

    conn.soft_delete_data_source(auth_state.organization_id, source.id)
        .await?;
    let chunks_removed = conn.delete_source_chunks(source.id).await?;

    // Collection removal is best-effort: the chunks are already gone and
    // retrieval skips missing collections either way
    if let Err(e) = state.vector.delete_collection(&source.collection_name).await {
        tracing::warn!(
            target: TRACING_TARGET,
            collection = %source.collection_name,
            error = %e,
            "Failed to drop vector collection"
        );
    }

    tracing::info!(
        target: TRACING_TARGET,
        chunks_removed,
        "Data source deleted",
    );

    Ok(StatusCode::NO_CONTENT)
}

fn delete_data_source_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete data source")
        .description("Soft-deletes the source and removes its chunks and vector collection.")
        .response_with::<204, (), _>(|res| res.description("Data source deleted."))
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Ingests the file backing a data source.
#[tracing::instrument(
    skip_all,
    fields(
        organization_id = %auth_state.organization_id,
        data_source_id = %path_params.data_source_id,
    )
)]
async fn ingest_data_source(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    Path(path_params): Path<DataSourcePathParams>,
) -> Result<(StatusCode, Json<IngestSummary>)> {
    tracing::debug!(target: TRACING_TARGET, "Starting ingestion");

    let report = state
        .ingestor
        .ingest(auth_state.organization_id, path_params.data_source_id)
        .await?;

    Ok((StatusCode::OK, Json(IngestSummary::from_report(report))))
}

fn ingest_data_source_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Ingest data source")
        .description(
            "Reads the backing file, embeds its records in batches, and \
             upserts them into the vector collection and chunk table.",
        )
        .response::<200, Json<IngestSummary>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
}

/// Finds a data source by id or returns NotFound.
async fn find_data_source(
    conn: &mut voltra_postgres::PgConnection,
    organization_id: i64,
    data_source_id: i64,
) -> Result<voltra_postgres::model::DataSource> {
    let source = conn
        .find_data_source_by_id(organization_id, data_source_id)
        .await?
        .filter(|source| !source.is_deleted())
        .ok_or_else(|| {
            ErrorKind::NotFound
                .with_message("Data source not found.")
                .with_resource("data_source")
        })?;

    Ok(source)
}

/// Returns a [`Router`] with all related routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/data-sources",
            get_with(list_data_sources, list_data_sources_docs),
        )
        .api_route(
            "/data-sources/{dataSourceId}",
            get_with(get_data_source, get_data_source_docs)
                .delete_with(delete_data_source, delete_data_source_docs),
        )
        .api_route(
            "/data-sources/{dataSourceId}/ingest",
            post_with(ingest_data_source, ingest_data_source_docs),
        )
        .with_path_items(|item| item.tag("DataSources"))
}
