//! Embedding service abstractions.
//!
//! This module provides the foundational abstractions for embedding services
//! in the Voltra ecosystem. It defines the provider trait and request/response
//! types for text embedding operations without depending on any concrete
//! implementation.

mod request;
mod response;

pub use request::{EmbeddingRequest, EncodingFormat};
pub use response::{EmbeddingData, EmbeddingResponse, EmbeddingUsage};

use crate::{Result, ServiceHealth};

/// Type alias for a boxed embedding provider.
pub type BoxedEmbeddingProvider = Box<dyn EmbeddingProvider + Send + Sync>;

/// Tracing target for embedding operations.
pub const TRACING_TARGET: &str = "voltra_core::emb";

/// Default embedding model used across the platform.
///
/// The ingestion pipeline and the vector collections are dimensioned for
/// this model; changing it requires re-embedding every collection.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Dimensions produced by [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// Core trait for embedding service operations.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generates embeddings for the provided inputs.
    ///
    /// Takes an [`EmbeddingRequest`] containing the input texts and model
    /// configuration, and returns an [`EmbeddingResponse`] with one embedding
    /// per input, in request order.
    async fn generate_embedding(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Performs a health check on the embedding service.
    async fn health_check(&self) -> Result<ServiceHealth>;
}
