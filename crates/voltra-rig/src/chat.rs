//! Answer composition for the direct-retrieval path.

use rig::message::Message;

use crate::TRACING_TARGET;
use crate::provider::CompletionProvider;

const PREAMBLE: &str = "\
You are a data assistant for an energy analytics platform. Answer the user's
question using only the provided context passages. When the context does not
contain the answer, say so plainly instead of guessing. Keep answers concise
and cite concrete numbers from the context where available.";

/// Composes grounded answers from retrieved context chunks.
#[derive(Debug, Clone)]
pub struct ChatComposer {
    provider: CompletionProvider,
}

impl ChatComposer {
    /// Creates a new composer.
    pub fn new(provider: CompletionProvider) -> Self {
        Self { provider }
    }

    /// Answers a question grounded in the given context passages.
    pub async fn answer_with_context(
        &self,
        query: &str,
        context: &[String],
        history: Vec<Message>,
    ) -> crate::Result<String> {
        let context_block = if context.is_empty() {
            "(no matching passages found)".to_string()
        } else {
            context
                .iter()
                .enumerate()
                .map(|(i, chunk)| format!("[{}] {}", i + 1, chunk))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let prompt = format!("{PREAMBLE}\n\nContext:\n{context_block}\n\nQuestion: {query}");

        tracing::debug!(
            target: TRACING_TARGET,
            context_chunks = context.len(),
            "Composing grounded answer"
        );

        self.provider.complete(&prompt, history).await
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &CompletionProvider {
        &self.provider
    }
}
