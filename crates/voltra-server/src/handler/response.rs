//! Response types for all handlers.

use jiff::Timestamp;
use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;
use voltra_core::ServiceStatus;
use voltra_engine::pipeline::PipelineResult;
use voltra_engine::retrieval::RetrievedChunk;
use voltra_rig::router::RoutingDecision;

/// Error response body.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// HTTP status code.
    pub status: u16,
    /// User-facing message.
    pub message: String,
    /// The resource involved, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Debugging context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// A chat session.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Session id.
    pub id: Uuid,
    /// Attached dashboard, if any.
    pub dashboard_id: Option<i64>,
    /// Session title.
    pub title: String,
    /// Preview of the most recent message.
    pub last_message: Option<String>,
    /// Number of messages in the session.
    pub message_count: i32,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

impl ChatSession {
    /// Converts from the database model.
    pub fn from_model(model: voltra_postgres::model::ChatSession) -> Self {
        Self {
            id: model.id,
            dashboard_id: model.dashboard_id,
            title: model.title,
            last_message: model.last_message,
            message_count: model.message_count,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// A chat message.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message id.
    pub id: Uuid,
    /// Author role.
    pub role: String,
    /// Message content.
    pub content: String,
    /// Processing status.
    pub status: String,
    /// Model, token usage, routing decision, visualization payload.
    pub metadata: serde_json::Value,
    /// Creation time.
    pub created_at: Timestamp,
}

impl ChatMessage {
    /// Converts from the database model.
    pub fn from_model(model: voltra_postgres::model::ChatMessage) -> Self {
        Self {
            id: model.id,
            role: model.role,
            content: model.content,
            status: model.status,
            metadata: model.metadata,
            created_at: model.created_at.into(),
        }
    }
}

/// One message exchange: the stored user message and the assistant reply.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    /// The stored user message.
    pub user_message: ChatMessage,
    /// The assistant reply (complete or error status).
    pub assistant_message: ChatMessage,
}

/// A data source.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    /// Data source id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Source kind.
    pub source_type: String,
    /// Lifecycle status.
    pub status: String,
    /// Vector collection owned by this source.
    pub collection_name: String,
    /// Records ingested.
    pub record_count: i32,
    /// Chunks stored.
    pub chunk_count: i32,
    /// When the last processing completed.
    pub last_processed_at: Option<Timestamp>,
    /// Creation time.
    pub created_at: Timestamp,
}

impl DataSource {
    /// Converts from the database model.
    pub fn from_model(model: voltra_postgres::model::DataSource) -> Self {
        Self {
            id: model.id,
            name: model.name,
            source_type: model.source_type,
            status: model.status,
            collection_name: model.collection_name,
            record_count: model.record_count,
            chunk_count: model.chunk_count,
            last_processed_at: model.last_processed_at.map(Into::into),
            created_at: model.created_at.into(),
        }
    }
}

/// Result of an ingestion run.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    /// Records successfully processed.
    pub records_processed: usize,
    /// Chunks stored.
    pub chunks_stored: usize,
    /// Total records in the file.
    pub total_records: usize,
    /// Wall-clock seconds.
    pub elapsed_secs: f64,
}

impl IngestSummary {
    /// Converts from the engine report.
    pub fn from_report(report: voltra_engine::ingest::IngestReport) -> Self {
        Self {
            records_processed: report.records_processed,
            chunks_stored: report.chunks_stored,
            total_records: report.total_records,
            elapsed_secs: report.elapsed_secs,
        }
    }
}

/// Response of the dual-path query endpoint.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// How the query was classified.
    #[schemars(with = "serde_json::Value")]
    pub routing: RoutingDecision,
    /// Retrieved chunks (direct-retrieval path).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub chunks: Option<Vec<RetrievedChunk>>,
    /// Composed answer (direct-retrieval path).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Pipeline result (analytical path).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub pipeline: Option<PipelineResult>,
    /// Clarification prompt (clarification path).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification: Option<String>,
}

/// A single component's health in the health response.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    /// Component name.
    pub component: String,
    /// Component status.
    #[schemars(with = "String")]
    pub status: ServiceStatus,
    /// Optional detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Health response.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall status.
    #[schemars(with = "String")]
    pub status: ServiceStatus,
    /// Per-component statuses.
    pub components: Vec<ComponentHealth>,
}
