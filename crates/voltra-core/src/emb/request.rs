//! Request types for embedding operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for generating embeddings.
///
/// Represents a complete embedding request with all necessary parameters for
/// generating embeddings from one or more text inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Unique identifier for this request.
    pub request_id: Uuid,

    /// The input text(s) to generate embeddings for.
    pub inputs: Vec<String>,

    /// The model to use for embedding generation.
    pub model: String,

    /// The format to return embeddings in.
    #[serde(default)]
    pub encoding_format: EncodingFormat,

    /// The number of dimensions the resulting output embeddings should have.
    /// Only supported in some models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,

    /// Additional parameters specific to the embedding provider.
    #[serde(flatten)]
    pub additional_params: HashMap<String, serde_json::Value>,
}

/// Format for returned embeddings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    /// Return embeddings as floating point numbers.
    #[default]
    Float,
    /// Return embeddings as base64-encoded strings.
    Base64,
}

impl EmbeddingRequest {
    /// Creates a new embedding request with the specified model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            inputs: Vec::new(),
            model: model.into(),
            encoding_format: EncodingFormat::default(),
            dimensions: None,
            additional_params: HashMap::new(),
        }
    }

    /// Adds a single input to the request.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Sets all inputs for the request.
    pub fn with_inputs(mut self, inputs: Vec<String>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Sets the output dimensions.
    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Returns whether the request has any inputs.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = EmbeddingRequest::new("text-embedding-3-small")
            .with_input("monthly usage by meter")
            .with_dimensions(1536);

        assert_eq!(request.model, "text-embedding-3-small");
        assert_eq!(request.inputs.len(), 1);
        assert_eq!(request.dimensions, Some(1536));
        assert!(!request.is_empty());
    }
}
