//! pgvector backend implementation.
//!
//! Stores each collection as a dedicated table with a `vector` column and
//! executes raw SQL through diesel-async. Used where Qdrant is not deployed.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::sql_types::{Array, BigInt, Bool, Double, Nullable, Text};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use super::{PgVectorConfig, PgVectorDistanceMetric, PgVectorIndexType};
use crate::TRACING_TARGET;
use crate::error::{VectorError, VectorResult};
use crate::store::{ScrollPage, SearchOptions, SearchResult, VectorData, VectorStoreBackend};

/// pgvector backend implementation.
pub struct PgVectorBackend {
    pool: Pool<AsyncPgConnection>,
    config: PgVectorConfig,
}

#[derive(diesel::QueryableByName)]
struct SearchRow {
    #[diesel(sql_type = Text)]
    id: String,
    #[diesel(sql_type = Double)]
    score: f64,
    #[diesel(sql_type = Nullable<Text>)]
    vector_text: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    metadata_text: Option<String>,
}

#[derive(diesel::QueryableByName)]
struct ExistsRow {
    #[diesel(sql_type = Bool)]
    present: bool,
}

#[derive(diesel::QueryableByName)]
struct NameRow {
    #[diesel(sql_type = Text)]
    name: String,
}

#[derive(diesel::QueryableByName)]
struct VectorRow {
    #[diesel(sql_type = Text)]
    id: String,
    #[diesel(sql_type = Nullable<Text>)]
    vector_text: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    metadata_text: Option<String>,
}

impl PgVectorBackend {
    /// Creates a new pgvector backend with its own connection pool.
    pub async fn new(config: &PgVectorConfig) -> VectorResult<Self> {
        let manager =
            AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.connection_url);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .build()
            .map_err(|e| VectorError::connection(e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            dimensions = %config.dimensions,
            "Initialized pgvector backend"
        );

        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    async fn conn(
        &self,
    ) -> VectorResult<deadpool::managed::Object<AsyncDieselConnectionManager<AsyncPgConnection>>>
    {
        self.pool
            .get()
            .await
            .map_err(|e| VectorError::connection(e.to_string()))
    }

    /// Generates SQL for creating the vectors table.
    fn create_table_sql(&self, name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id VARCHAR(256) PRIMARY KEY, \
             vector vector({}), \
             metadata JSONB DEFAULT '{{}}'::jsonb, \
             created_at TIMESTAMPTZ DEFAULT NOW())",
            name, self.config.dimensions
        )
    }

    /// Generates SQL for creating the vector index.
    fn create_index_sql(&self, name: &str) -> String {
        let index_name = format!("{}_vector_idx", name);
        let opclass = match self.config.distance_metric {
            PgVectorDistanceMetric::L2 => "vector_l2_ops",
            PgVectorDistanceMetric::InnerProduct => "vector_ip_ops",
            PgVectorDistanceMetric::Cosine => "vector_cosine_ops",
        };

        match self.config.index_type {
            PgVectorIndexType::IvfFlat => format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} USING ivfflat (vector {}) WITH (lists = 100)",
                index_name, name, opclass
            ),
            PgVectorIndexType::Hnsw => format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} USING hnsw (vector {}) WITH (m = 16, ef_construction = 64)",
                index_name, name, opclass
            ),
        }
    }

    /// Generates SQL for searching vectors.
    fn search_sql(&self, name: &str) -> String {
        let operator = self.config.distance_metric.operator();

        let score_expr = match self.config.distance_metric {
            PgVectorDistanceMetric::L2 => format!("vector {} $1::vector", operator),
            // Inner product returns negative, so we negate for similarity
            PgVectorDistanceMetric::InnerProduct => format!("-(vector {} $1::vector)", operator),
            // Cosine distance, convert to similarity
            PgVectorDistanceMetric::Cosine => format!("1 - (vector {} $1::vector)", operator),
        };

        format!(
            "SELECT id, {} AS score, vector::text AS vector_text, metadata::text AS metadata_text \
             FROM {} ORDER BY vector {} $1::vector LIMIT $2",
            score_expr, name, operator
        )
    }
}

/// Rejects collection names that cannot be safely interpolated as
/// identifiers.
fn validate_collection_name(name: &str) -> VectorResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(VectorError::invalid_config(format!(
            "invalid collection name: {name}"
        )))
    }
}

#[async_trait]
impl VectorStoreBackend for PgVectorBackend {
    async fn create_collection(&self, name: &str, dimensions: usize) -> VectorResult<()> {
        validate_collection_name(name)?;

        if dimensions != self.config.dimensions {
            return Err(VectorError::dimension_mismatch(
                self.config.dimensions,
                dimensions,
            ));
        }

        let mut conn = self.conn().await?;

        diesel::sql_query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&mut conn)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        diesel::sql_query(self.create_table_sql(name))
            .execute(&mut conn)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        diesel::sql_query(self.create_index_sql(name))
            .execute(&mut conn)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET,
            collection = %name,
            dimensions = %dimensions,
            "Created pgvector table"
        );

        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> VectorResult<()> {
        validate_collection_name(name)?;

        let mut conn = self.conn().await?;

        diesel::sql_query(format!("DROP TABLE IF EXISTS {name}"))
            .execute(&mut conn)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET,
            collection = %name,
            "Dropped pgvector table"
        );

        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        validate_collection_name(name)?;

        let mut conn = self.conn().await?;

        let row: ExistsRow = diesel::sql_query(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name = $1) AS present",
        )
        .bind::<Text, _>(name)
        .get_result(&mut conn)
        .await
        .map_err(|e| VectorError::backend(e.to_string()))?;

        Ok(row.present)
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let mut conn = self.conn().await?;

        let rows: Vec<NameRow> = diesel::sql_query(
            "SELECT table_name AS name FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name LIKE 'datasource\\_%'",
        )
        .load(&mut conn)
        .await
        .map_err(|e| VectorError::backend(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    async fn upsert(&self, collection: &str, vectors: Vec<VectorData>) -> VectorResult<()> {
        if vectors.is_empty() {
            return Ok(());
        }

        validate_collection_name(collection)?;

        let dimensions = vectors[0].vector.len();
        self.create_collection(collection, dimensions).await?;

        let mut conn = self.conn().await?;
        let sql = format!(
            "INSERT INTO {collection} (id, vector, metadata) \
             VALUES ($1, $2::vector, $3::jsonb) \
             ON CONFLICT (id) DO UPDATE SET \
             vector = EXCLUDED.vector, metadata = EXCLUDED.metadata"
        );

        for data in vectors {
            let metadata = serde_json::to_string(&data.metadata)?;

            diesel::sql_query(&sql)
                .bind::<Text, _>(&data.id)
                .bind::<Text, _>(format_vector(&data.vector))
                .bind::<Text, _>(metadata)
                .execute(&mut conn)
                .await
                .map_err(|e| VectorError::backend(e.to_string()))?;
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
        _options: SearchOptions,
    ) -> VectorResult<Vec<SearchResult>> {
        validate_collection_name(collection)?;

        let mut conn = self.conn().await?;

        let rows: Vec<SearchRow> = diesel::sql_query(self.search_sql(collection))
            .bind::<Text, _>(format_vector(&query))
            .bind::<BigInt, _>(limit as i64)
            .load(&mut conn)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let vector = row.vector_text.as_deref().map(parse_vector).transpose()?;
                let metadata = parse_metadata(row.metadata_text.as_deref())?;

                Ok(SearchResult {
                    id: row.id,
                    score: row.score as f32,
                    vector,
                    metadata,
                })
            })
            .collect()
    }

    async fn delete(&self, collection: &str, ids: Vec<String>) -> VectorResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        validate_collection_name(collection)?;

        let mut conn = self.conn().await?;

        diesel::sql_query(format!("DELETE FROM {collection} WHERE id = ANY($1)"))
            .bind::<Array<Text>, _>(ids)
            .execute(&mut conn)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        Ok(())
    }

    async fn scroll(
        &self,
        collection: &str,
        offset: Option<String>,
        limit: usize,
    ) -> VectorResult<ScrollPage> {
        validate_collection_name(collection)?;

        let mut conn = self.conn().await?;

        let rows: Vec<VectorRow> = diesel::sql_query(format!(
            "SELECT id, vector::text AS vector_text, metadata::text AS metadata_text \
             FROM {collection} WHERE id > $1 ORDER BY id LIMIT $2"
        ))
        .bind::<Text, _>(offset.unwrap_or_default())
        .bind::<BigInt, _>(limit as i64)
        .load(&mut conn)
        .await
        .map_err(|e| VectorError::backend(e.to_string()))?;

        let vectors: Vec<VectorData> = rows
            .into_iter()
            .map(|row| {
                let vector = row
                    .vector_text
                    .as_deref()
                    .map(parse_vector)
                    .transpose()?
                    .unwrap_or_default();
                let metadata = parse_metadata(row.metadata_text.as_deref())?;

                Ok(VectorData {
                    id: row.id,
                    vector,
                    metadata,
                })
            })
            .collect::<VectorResult<_>>()?;

        let next_offset = (vectors.len() == limit)
            .then(|| vectors.last().map(|v| v.id.clone()))
            .flatten();

        Ok(ScrollPage {
            vectors,
            next_offset,
        })
    }
}

/// Formats a vector for PostgreSQL.
pub fn format_vector(v: &[f32]) -> String {
    format!(
        "[{}]",
        v.iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )
}

/// Parses a vector from PostgreSQL text representation.
pub fn parse_vector(s: &str) -> VectorResult<Vec<f32>> {
    let trimmed = s.trim_start_matches('[').trim_end_matches(']');
    if trimmed.is_empty() {
        return Ok(vec![]);
    }

    trimmed
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f32>()
                .map_err(|e| VectorError::serialization(e.to_string()))
        })
        .collect()
}

fn parse_metadata(text: Option<&str>) -> VectorResult<HashMap<String, serde_json::Value>> {
    match text {
        Some(text) => Ok(serde_json::from_str(text)?),
        None => Ok(HashMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_format_parse_round_trip() {
        let vector = vec![0.25, -1.5, 3.0];
        let formatted = format_vector(&vector);
        assert_eq!(formatted, "[0.25,-1.5,3]");
        assert_eq!(parse_vector(&formatted).unwrap(), vector);
    }

    #[test]
    fn test_parse_empty_vector() {
        assert_eq!(parse_vector("[]").unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn test_collection_name_validation() {
        assert!(validate_collection_name("datasource_42").is_ok());
        assert!(validate_collection_name("datasource_42; DROP TABLE x").is_err());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("DataSource").is_err());
    }

    #[test]
    fn test_search_sql_cosine_similarity() {
        let config = PgVectorConfig::new("postgres://localhost/voltra", 3);
        let sql = format!(
            "SELECT id, 1 - (vector {} $1::vector) AS score",
            config.distance_metric.operator()
        );
        assert!(sql.contains("<=>"));
    }
}
