//! Engine error types.

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors produced by the orchestration layer.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A data-source id could not be parsed to numeric form.
    #[error("invalid data source id: {0}")]
    InvalidDataSourceId(String),

    /// A referenced data source does not exist or is deleted.
    #[error("data source not found: {0}")]
    SourceNotFound(i64),

    /// A file-backed operation was requested on a source without a file.
    #[error("data source {0} has no backing file")]
    MissingFile(i64),

    /// Every retrieval tier failed.
    #[error("all {attempted} retrieval tiers failed")]
    RetrievalExhausted { attempted: usize },

    /// Database error.
    #[error(transparent)]
    Database(#[from] voltra_postgres::PgError),

    /// Vector store error.
    #[error(transparent)]
    Vector(#[from] voltra_vector::VectorError),

    /// LLM provider error.
    #[error(transparent)]
    Rig(#[from] voltra_rig::Error),

    /// Sandbox executor error.
    #[error(transparent)]
    Sandbox(#[from] voltra_sandbox::SandboxError),

    /// Embedding service error.
    #[error(transparent)]
    Embedding(#[from] voltra_core::Error),

    /// CSV parsing error during ingestion.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error during ingestion.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Returns true for caller-input errors that map to HTTP 400.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidDataSourceId(_))
    }
}
