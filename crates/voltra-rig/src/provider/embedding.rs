//! Embedding provider abstraction.

use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use rig::prelude::EmbeddingsClient;
use rig::providers::openai;
use voltra_core::ServiceHealth;
use voltra_core::emb::{
    DEFAULT_EMBEDDING_DIMENSIONS, EmbeddingData, EmbeddingRequest, EmbeddingResponse,
};

use crate::Error;

/// Embedding provider that wraps different model implementations.
///
/// All providers use [`DEFAULT_EMBEDDING_DIMENSIONS`] to stay consistent
/// with the `document_chunks` embedding column and the per-source vector
/// collections.
#[derive(Clone)]
pub enum EmbeddingProvider {
    /// OpenAI embedding model.
    OpenAi {
        model: openai::EmbeddingModel,
        model_name: String,
    },
}

impl EmbeddingProvider {
    /// Creates a new OpenAI embedding provider.
    pub fn openai(api_key: &str, model: &str) -> crate::Result<Self> {
        let client = openai::Client::new(api_key)
            .map_err(|e| Error::provider("openai", e.to_string()))?;

        Ok(Self::OpenAi {
            model: client.embedding_model(model),
            model_name: model.to_string(),
        })
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        match self {
            Self::OpenAi { model_name, .. } => model_name,
        }
    }

    /// Returns the number of dimensions.
    pub fn ndims(&self) -> usize {
        DEFAULT_EMBEDDING_DIMENSIONS
    }

    /// Embeds a single text document.
    pub async fn embed_text(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        match self {
            Self::OpenAi { model, .. } => model.embed_text(text).await,
        }
    }

    /// Embeds multiple text documents.
    pub async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        match self {
            Self::OpenAi { model, .. } => model.embed_texts(texts).await,
        }
    }

    /// Embeds a query, returning the f32 vector the stores expect.
    pub async fn embed_query(&self, text: &str) -> crate::Result<Vec<f32>> {
        let embedding = self
            .embed_text(text)
            .await
            .map_err(|e| Error::embedding(e.to_string()))?;

        Ok(embedding.vec.into_iter().map(|v| v as f32).collect())
    }
}

#[async_trait::async_trait]
impl voltra_core::emb::EmbeddingProvider for EmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: &EmbeddingRequest,
    ) -> voltra_core::Result<EmbeddingResponse> {
        let embeddings = self
            .embed_texts(request.inputs.clone())
            .await
            .map_err(|e| {
                voltra_core::Error::external_error().with_message(e.to_string())
            })?;

        let data = embeddings
            .into_iter()
            .enumerate()
            .map(|(index, embedding)| EmbeddingData {
                embedding: embedding.vec.into_iter().map(|v| v as f32).collect(),
                index,
            })
            .collect();

        Ok(EmbeddingResponse::new(
            request.request_id,
            data,
            self.model_name(),
        ))
    }

    async fn health_check(&self) -> voltra_core::Result<ServiceHealth> {
        match self.embed_text("ping").await {
            Ok(_) => Ok(ServiceHealth::healthy()),
            Err(e) => Ok(ServiceHealth::unhealthy(e.to_string())),
        }
    }
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi { model_name, .. } => f
                .debug_struct("EmbeddingProvider::OpenAi")
                .field("model", model_name)
                .field("ndims", &DEFAULT_EMBEDDING_DIMENSIONS)
                .finish(),
        }
    }
}
