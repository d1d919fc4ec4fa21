//! pgvector configuration.

use serde::{Deserialize, Serialize};

/// PostgreSQL pgvector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PgVectorConfig {
    /// PostgreSQL connection URL.
    pub connection_url: String,
    /// Vector dimensions.
    pub dimensions: usize,
    /// Distance metric.
    #[serde(default)]
    pub distance_metric: PgVectorDistanceMetric,
    /// Index type for similarity search.
    #[serde(default)]
    pub index_type: PgVectorIndexType,
    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl PgVectorConfig {
    /// Creates a new pgvector configuration.
    pub fn new(connection_url: impl Into<String>, dimensions: usize) -> Self {
        Self {
            connection_url: connection_url.into(),
            dimensions,
            distance_metric: PgVectorDistanceMetric::default(),
            index_type: PgVectorIndexType::default(),
            max_connections: default_max_connections(),
        }
    }

    /// Sets the distance metric.
    pub fn with_distance_metric(mut self, metric: PgVectorDistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    /// Sets the index type.
    pub fn with_index_type(mut self, index_type: PgVectorIndexType) -> Self {
        self.index_type = index_type;
        self
    }
}

fn default_max_connections() -> usize {
    4
}

/// Distance metric for pgvector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PgVectorDistanceMetric {
    /// L2 (Euclidean) distance.
    L2,
    /// Inner product (dot product).
    InnerProduct,
    /// Cosine distance.
    #[default]
    Cosine,
}

impl PgVectorDistanceMetric {
    /// Returns the pgvector operator for this metric.
    pub fn operator(&self) -> &'static str {
        match self {
            Self::L2 => "<->",
            Self::InnerProduct => "<#>",
            Self::Cosine => "<=>",
        }
    }
}

/// Index type for pgvector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PgVectorIndexType {
    /// IVFFlat index (faster build, good recall).
    #[default]
    IvfFlat,
    /// HNSW index (slower build, better recall).
    Hnsw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_is_default_metric() {
        let config = PgVectorConfig::new("postgres://localhost/voltra", 1536);
        assert_eq!(config.distance_metric, PgVectorDistanceMetric::Cosine);
        assert_eq!(config.distance_metric.operator(), "<=>");
    }
}
