//! Vector store configuration types.

use serde::{Deserialize, Serialize};

pub use crate::pgvector::{PgVectorConfig, PgVectorDistanceMetric, PgVectorIndexType};
pub use crate::qdrant::QdrantConfig;

/// Vector store backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum VectorStoreConfig {
    /// Qdrant vector database.
    Qdrant(QdrantConfig),
    /// PostgreSQL with pgvector extension.
    PgVector(PgVectorConfig),
}

impl VectorStoreConfig {
    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Qdrant(_) => "qdrant",
            Self::PgVector(_) => "pgvector",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_tag() {
        let config = VectorStoreConfig::Qdrant(QdrantConfig::new("http://localhost:6334"));
        let json = serde_json::to_value(&config).expect("serializable config");
        assert_eq!(json["type"], "qdrant");
    }
}
