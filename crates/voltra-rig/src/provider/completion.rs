//! Completion provider abstraction.

use std::sync::Arc;

use rig::completion::{AssistantContent, CompletionError, CompletionModel as RigCompletionModel};
use rig::message::Message;
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::{anthropic, openai};

use crate::Error;

/// Completion provider that wraps different rig completion model
/// implementations.
///
/// This is a cheaply cloneable wrapper around an `Arc<CompletionService>`.
#[derive(Clone)]
pub struct CompletionProvider(Arc<CompletionService>);

enum CompletionService {
    OpenAi {
        model: openai::CompletionModel,
        model_name: String,
    },
    Anthropic {
        model: anthropic::completion::CompletionModel,
        model_name: String,
    },
}

impl CompletionProvider {
    /// Creates an OpenAI completion provider with a specific model.
    pub fn openai(api_key: &str, model: &str) -> crate::Result<Self> {
        let client = openai::Client::new(api_key)
            .map_err(|e| Error::provider("openai", e.to_string()))?
            .completions_api();

        Ok(Self(Arc::new(CompletionService::OpenAi {
            model: client.completion_model(model),
            model_name: model.to_string(),
        })))
    }

    /// Creates an Anthropic completion provider with a specific model.
    pub fn anthropic(api_key: &str, model: &str) -> crate::Result<Self> {
        let client = anthropic::Client::new(api_key)
            .map_err(|e| Error::provider("anthropic", e.to_string()))?;

        Ok(Self(Arc::new(CompletionService::Anthropic {
            model: client.completion_model(model),
            model_name: model.to_string(),
        })))
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        match self.0.as_ref() {
            CompletionService::OpenAi { model_name, .. } => model_name,
            CompletionService::Anthropic { model_name, .. } => model_name,
        }
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        match self.0.as_ref() {
            CompletionService::OpenAi { .. } => "openai",
            CompletionService::Anthropic { .. } => "anthropic",
        }
    }

    /// Sends a completion request with the given prompt and chat history.
    pub async fn complete(&self, prompt: &str, chat_history: Vec<Message>) -> crate::Result<String> {
        self.complete_with_temperature(prompt, chat_history, None)
            .await
    }

    /// Sends a completion request with an explicit sampling temperature.
    ///
    /// Classification and code generation run at temperature 0 for
    /// reproducible output.
    pub async fn complete_with_temperature(
        &self,
        prompt: &str,
        chat_history: Vec<Message>,
        temperature: Option<f64>,
    ) -> crate::Result<String> {
        let model_name = self.model_name().to_string();
        let map_err =
            |e: CompletionError| Error::provider(&model_name, e.to_string());

        match self.0.as_ref() {
            CompletionService::OpenAi { model, .. } => {
                let mut request = model.completion_request(prompt).messages(chat_history);
                if let Some(temperature) = temperature {
                    request = request.temperature(temperature);
                }
                request
                    .send()
                    .await
                    .map(|r| extract_text_content(&r.choice))
                    .map_err(map_err)
            }
            CompletionService::Anthropic { model, .. } => {
                let mut request = model.completion_request(prompt).messages(chat_history);
                if let Some(temperature) = temperature {
                    request = request.temperature(temperature);
                }
                request
                    .send()
                    .await
                    .map(|r| extract_text_content(&r.choice))
                    .map_err(map_err)
            }
        }
    }
}

/// Extracts text content from assistant content choices.
fn extract_text_content(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_ref() {
            CompletionService::OpenAi { model_name, .. } => f
                .debug_struct("CompletionProvider::OpenAi")
                .field("model", model_name)
                .finish(),
            CompletionService::Anthropic { model_name, .. } => f
                .debug_struct("CompletionProvider::Anthropic")
                .field("model", model_name)
                .finish(),
        }
    }
}
