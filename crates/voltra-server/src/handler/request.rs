//! Request types for all handlers.

use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use voltra_postgres::types::OffsetPagination;

/// Path parameters for session-scoped routes.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionPathParams {
    /// Chat session id.
    pub session_id: Uuid,
}

/// Path parameters for data-source-scoped routes.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataSourcePathParams {
    /// Data source id, numeric.
    pub data_source_id: i64,
}

/// Offset pagination query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize, JsonSchema)]
pub struct PaginationParams {
    /// Maximum number of records to return.
    pub limit: Option<i64>,
    /// Number of records to skip.
    pub offset: Option<i64>,
}

impl From<PaginationParams> for OffsetPagination {
    fn from(params: PaginationParams) -> Self {
        OffsetPagination::new(params.limit.unwrap_or(50), params.offset.unwrap_or(0))
    }
}

/// Body for creating a chat session.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatSession {
    /// Session title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Optional dashboard to attach the session to.
    pub dashboard_id: Option<i64>,
}

/// Body for updating a chat session.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatSession {
    /// New session title.
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// New dashboard attachment.
    pub dashboard_id: Option<i64>,
}

/// Body for sending a chat message.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendChatMessage {
    /// The user's question.
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
    /// Data sources to answer over, as string ids.
    #[validate(length(min = 1, max = 20))]
    pub data_source_ids: Vec<String>,
    /// Maximum retrieved chunks.
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
    /// Minimum similarity for retrieved chunks.
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: Option<f32>,
}

/// Body for the dual-path query endpoint.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// The question to route and answer.
    #[validate(length(min = 1, max = 4000))]
    pub query: String,
    /// Data sources to answer over, as string ids.
    #[validate(length(min = 1, max = 20))]
    pub data_source_ids: Vec<String>,
    /// Maximum retrieved chunks.
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
    /// Minimum similarity for retrieved chunks.
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: Option<f32>,
    /// Return untruncated pipeline output.
    #[serde(default)]
    pub return_raw_output: bool,
}

impl QueryRequest {
    /// Effective retrieval limit.
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(10)
    }

    /// Effective similarity threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold.unwrap_or(0.5)
    }
}

impl SendChatMessage {
    /// Effective retrieval limit.
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(10)
    }

    /// Effective similarity threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold.unwrap_or(0.5)
    }
}
