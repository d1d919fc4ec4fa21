//! Qdrant backend implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfig;
use qdrant_client::qdrant::with_payload_selector::SelectorOptions;
use qdrant_client::qdrant::with_vectors_selector::SelectorOptions as VectorsSelectorOptions;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
    PointStruct, PointsIdsList, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};

use super::QdrantConfig;
use crate::TRACING_TARGET;
use crate::error::{VectorError, VectorResult};
use crate::store::{ScrollPage, SearchOptions, SearchResult, VectorData, VectorStoreBackend};

/// Qdrant backend implementation.
pub struct QdrantBackend {
    client: Qdrant,
    #[allow(dead_code)]
    config: QdrantConfig,
}

impl QdrantBackend {
    /// Creates a new Qdrant backend.
    pub async fn new(config: &QdrantConfig) -> VectorResult<Self> {
        let client = Qdrant::from_url(&config.url)
            .api_key(config.api_key.clone())
            .build()
            .map_err(|e| VectorError::connection(e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %config.url,
            "Connected to Qdrant"
        );

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Ensures a collection exists, creating it if necessary.
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> VectorResult<()> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        if !exists {
            let vectors_config = VectorsConfig::Params(
                VectorParamsBuilder::new(dimensions as u64, Distance::Cosine).build(),
            );

            self.client
                .create_collection(
                    CreateCollectionBuilder::new(name).vectors_config(vectors_config),
                )
                .await
                .map_err(|e| VectorError::backend(e.to_string()))?;

            tracing::info!(
                target: TRACING_TARGET,
                collection = %name,
                dimensions = %dimensions,
                "Created Qdrant collection"
            );
        }

        Ok(())
    }

    /// Extracts vector data from Qdrant's VectorsOutput.
    fn extract_vector(vectors: Option<qdrant_client::qdrant::VectorsOutput>) -> Option<Vec<f32>> {
        use qdrant_client::qdrant::vectors_output::VectorsOptions;

        vectors.and_then(|v| match v.vectors_options {
            #[allow(deprecated)]
            Some(VectorsOptions::Vector(vec)) => Some(vec.data),
            _ => None,
        })
    }

    /// Extracts point ID as a string.
    fn extract_point_id(id: Option<PointId>) -> Option<String> {
        use qdrant_client::qdrant::point_id::PointIdOptions;

        match id {
            Some(PointId {
                point_id_options: Some(id),
            }) => match id {
                PointIdOptions::Num(n) => Some(n.to_string()),
                PointIdOptions::Uuid(s) => Some(s),
            },
            _ => None,
        }
    }
}

#[async_trait]
impl VectorStoreBackend for QdrantBackend {
    async fn create_collection(&self, name: &str, dimensions: usize) -> VectorResult<()> {
        self.ensure_collection(name, dimensions).await
    }

    async fn delete_collection(&self, name: &str) -> VectorResult<()> {
        self.client
            .delete_collection(name)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET,
            collection = %name,
            "Deleted Qdrant collection"
        );

        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        self.client
            .collection_exists(name)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        Ok(response
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn upsert(&self, collection: &str, vectors: Vec<VectorData>) -> VectorResult<()> {
        if vectors.is_empty() {
            return Ok(());
        }

        let dimensions = vectors
            .first()
            .map(|v| v.vector.len())
            .ok_or_else(|| VectorError::backend("no vectors provided"))?;

        self.ensure_collection(collection, dimensions).await?;

        let points: Vec<PointStruct> = vectors
            .into_iter()
            .map(|v| {
                let payload: HashMap<String, qdrant_client::qdrant::Value> = v
                    .metadata
                    .into_iter()
                    .map(|(k, v)| (k, json_to_qdrant_value(v)))
                    .collect();

                PointStruct::new(v.id, v.vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points))
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: usize,
        options: SearchOptions,
    ) -> VectorResult<Vec<SearchResult>> {
        let mut search = SearchPointsBuilder::new(collection, query, limit as u64);

        if options.include_vectors {
            search = search.with_vectors(VectorsSelectorOptions::Enable(true));
        }

        if options.include_metadata {
            search = search.with_payload(SelectorOptions::Enable(true));
        }

        if let Some(filter_json) = options.filter
            && let Some(conditions) = parse_filter(&filter_json)
        {
            search = search.filter(Filter::must(conditions));
        }

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let id = Self::extract_point_id(point.id).unwrap_or_default();
                let vector = Self::extract_vector(point.vectors);

                let metadata: HashMap<String, serde_json::Value> = point
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, qdrant_value_to_json(v)))
                    .collect();

                SearchResult {
                    id,
                    score: point.score,
                    vector,
                    metadata,
                }
            })
            .collect();

        Ok(results)
    }

    async fn delete(&self, collection: &str, ids: Vec<String>) -> VectorResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let point_ids: Vec<PointId> = ids.into_iter().map(PointId::from).collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(collection).points(PointsIdsList { ids: point_ids }),
            )
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
        let mut scroll = ScrollPointsBuilder::new(collection)
            .limit(limit as u32)
            .with_payload(true)
            .with_vectors(true);

        if let Some(offset) = offset {
            scroll = scroll.offset(PointId::from(offset));
        }

        let response = self
            .client
            .scroll(scroll)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        let vectors = response
            .result
            .into_iter()
            .map(|point| {
                let id = Self::extract_point_id(point.id).unwrap_or_default();
                let vector = Self::extract_vector(point.vectors).unwrap_or_default();

                let metadata: HashMap<String, serde_json::Value> = point
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, qdrant_value_to_json(v)))
                    .collect();

                VectorData {
                    id,
                    vector,
                    metadata,
                }
            })
            .collect();

        Ok(ScrollPage {
            vectors,
            next_offset: Self::extract_point_id(response.next_page_offset),
        })
    }
}

/// Converts JSON value to Qdrant value.
fn json_to_qdrant_value(value: serde_json::Value) -> qdrant_client::qdrant::Value {
    use qdrant_client::qdrant::value::Kind;

    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Kind::IntegerValue(i)
            } else if let Some(f) = n.as_f64() {
                Kind::DoubleValue(f)
            } else {
                Kind::StringValue(n.to_string())
            }
        }
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(arr) => {
            let values: Vec<qdrant_client::qdrant::Value> =
                arr.into_iter().map(json_to_qdrant_value).collect();
            Kind::ListValue(qdrant_client::qdrant::ListValue { values })
        }
        serde_json::Value::Object(obj) => {
            let fields: HashMap<String, qdrant_client::qdrant::Value> = obj
                .into_iter()
                .map(|(k, v)| (k, json_to_qdrant_value(v)))
                .collect();
            Kind::StructValue(qdrant_client::qdrant::Struct { fields })
        }
    };

    qdrant_client::qdrant::Value { kind: Some(kind) }
}

/// Converts Qdrant value to JSON value.
fn qdrant_value_to_json(value: qdrant_client::qdrant::Value) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind;

    match value.kind {
        Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::json!(i),
        Some(Kind::DoubleValue(f)) => serde_json::json!(f),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            let arr: Vec<serde_json::Value> =
                list.values.into_iter().map(qdrant_value_to_json).collect();
            serde_json::Value::Array(arr)
        }
        Some(Kind::StructValue(obj)) => {
            let map: serde_json::Map<String, serde_json::Value> = obj
                .fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_value_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
        None => serde_json::Value::Null,
    }
}

/// Parses a JSON filter into Qdrant conditions.
fn parse_filter(filter: &serde_json::Value) -> Option<Vec<Condition>> {
    if let serde_json::Value::Object(obj) = filter {
        let conditions: Vec<Condition> = obj
            .iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(s) => Some(Condition::matches(key.clone(), s.clone())),
                serde_json::Value::Number(n) => {
                    n.as_i64().map(|i| Condition::matches(key.clone(), i))
                }
                serde_json::Value::Bool(b) => Some(Condition::matches(key.clone(), *b)),
                _ => None,
            })
            .collect();

        if conditions.is_empty() {
            None
        } else {
            Some(conditions)
        }
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_qdrant_value_round_trip() {
        let original = serde_json::json!({
            "source": "csv_processor",
            "record_index": 7,
            "nested": {"flag": true},
            "tags": ["usage", "billing"],
        });

        let converted = qdrant_value_to_json(json_to_qdrant_value(original.clone()));
        assert_eq!(converted, original);
    }

    #[test]
    fn test_parse_filter_skips_unsupported_values() {
        let filter = serde_json::json!({
            "data_source_id": 42,
            "source": "csv_processor",
            "unsupported": [1, 2, 3],
        });

        let conditions = parse_filter(&filter).expect("supported conditions present");
        assert_eq!(conditions.len(), 2);
    }

    #[test]
    fn test_parse_filter_non_object() {
        assert!(parse_filter(&serde_json::json!("not an object")).is_none());
    }
}
