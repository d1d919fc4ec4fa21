//! Response types for embedding operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response from an embedding generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Unique identifier for this response, matching the request ID.
    pub request_id: Uuid,

    /// The embedding data for each input.
    pub data: Vec<EmbeddingData>,

    /// The model used for generating embeddings.
    pub model: String,

    /// Usage statistics for this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<EmbeddingUsage>,

    /// Additional metadata about the response.
    #[serde(flatten)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Individual embedding data for a single input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingData {
    /// The embedding vector.
    pub embedding: Vec<f32>,

    /// The index of this embedding in the original request.
    pub index: usize,
}

/// Usage statistics for embedding generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    /// Number of tokens in the input(s).
    pub prompt_tokens: u32,

    /// Total number of tokens used.
    pub total_tokens: u32,
}

impl EmbeddingResponse {
    /// Creates a new embedding response.
    pub fn new(request_id: Uuid, data: Vec<EmbeddingData>, model: impl Into<String>) -> Self {
        Self {
            request_id,
            data,
            model: model.into(),
            usage: None,
            metadata: HashMap::new(),
        }
    }

    /// Attaches usage statistics.
    pub fn with_usage(mut self, usage: EmbeddingUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Returns the embedding vectors in request order.
    pub fn into_vectors(mut self) -> Vec<Vec<f32>> {
        self.data.sort_by_key(|d| d.index);
        self.data.into_iter().map(|d| d.embedding).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_vectors_sorts_by_index() {
        let response = EmbeddingResponse::new(
            Uuid::new_v4(),
            vec![
                EmbeddingData {
                    embedding: vec![0.2],
                    index: 1,
                },
                EmbeddingData {
                    embedding: vec![0.1],
                    index: 0,
                },
            ],
            "text-embedding-3-small",
        );

        let vectors = response.into_vectors();
        assert_eq!(vectors, vec![vec![0.1], vec![0.2]]);
    }
}
