//! PostgreSQL pgvector backend.

mod backend;
mod config;

pub use backend::{PgVectorBackend, format_vector, parse_vector};
pub use config::{PgVectorConfig, PgVectorDistanceMetric, PgVectorIndexType};
