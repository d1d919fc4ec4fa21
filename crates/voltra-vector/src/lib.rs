#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod pgvector;
pub mod qdrant;

mod config;
mod error;
mod store;

pub use config::VectorStoreConfig;
pub use error::{VectorError, VectorResult};
pub use pgvector::{PgVectorConfig, PgVectorDistanceMetric, PgVectorIndexType};
pub use qdrant::QdrantConfig;
pub use store::{
    ScrollPage, SearchOptions, SearchResult, VectorData, VectorStore, VectorStoreBackend,
    data_source_collection,
};

/// Tracing target for vector store operations.
pub const TRACING_TARGET: &str = "voltra_vector";

/// Dimensions of the embedding vectors stored across the platform.
///
/// Fixed by the `text-embedding-3-small` model used at ingestion time.
pub const EMBEDDING_DIMENSIONS: usize = 1536;
