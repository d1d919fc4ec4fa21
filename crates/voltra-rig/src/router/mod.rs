//! Query routing between the retrieval and code-execution paths.
//!
//! Every incoming question is normalized, optionally spell-corrected, and
//! classified into one of three routes. Two classifiers exist: the LLM
//! classifier is authoritative when enabled and reachable; the keyword
//! heuristic is both the fallback and the pre-analysis fed into the LLM
//! prompt. Classification never fails — any LLM error degrades to the
//! heuristic result.

mod decision;
mod heuristic;
mod llm;
mod spell;

pub use decision::{PreprocessedQuery, QueryRoute, RoutingDecision};
pub use spell::SpellChecker;

use crate::TRACING_TARGET;
use crate::provider::CompletionProvider;

/// Router configuration.
///
/// Populated from `ROUTER_SPELLCHECK` / `ROUTER_MODEL` by the binary.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    /// Whether to spell-correct queries during preprocessing.
    pub spellcheck: bool,
    /// Whether to use the LLM classifier at all.
    pub use_llm: bool,
}

/// Classifies queries into processing routes.
pub struct QueryRouter {
    config: RouterConfig,
    provider: Option<CompletionProvider>,
    spell: SpellChecker,
}

impl QueryRouter {
    /// Creates a new router.
    ///
    /// A provider is only required when `config.use_llm` is set; without
    /// one, every query is classified heuristically.
    pub fn new(config: RouterConfig, provider: Option<CompletionProvider>) -> Self {
        Self {
            config,
            provider,
            spell: SpellChecker::with_default_dictionary(),
        }
    }

    /// Normalizes a raw query: trim, lowercase, optional spell correction.
    pub fn preprocess(&self, raw: &str) -> PreprocessedQuery {
        let mut normalized = raw.trim().to_lowercase();

        if self.config.spellcheck {
            normalized = self.spell.correct(&normalized);
        }

        PreprocessedQuery {
            original: raw.to_string(),
            normalized,
        }
    }

    /// Routes a query to a processing path.
    ///
    /// Never returns an error: provider failures, non-JSON output, and
    /// schema-invalid output all degrade to the heuristic classification.
    pub async fn route(&self, query: &PreprocessedQuery) -> RoutingDecision {
        let heuristic = heuristic::classify(&query.normalized);

        if !self.config.use_llm {
            return heuristic;
        }

        let Some(provider) = &self.provider else {
            tracing::warn!(
                target: TRACING_TARGET,
                "LLM routing enabled but no provider configured; using heuristic"
            );
            return heuristic;
        };

        match llm::classify(provider, &query.normalized, &heuristic).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %e,
                    "LLM classification failed; falling back to heuristic"
                );
                heuristic
            }
        }
    }

    /// Classifies a query with the keyword heuristic only.
    pub fn route_heuristic(&self, query: &PreprocessedQuery) -> RoutingDecision {
        heuristic::classify(&query.normalized)
    }
}

impl std::fmt::Debug for QueryRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRouter")
            .field("spellcheck", &self.config.spellcheck)
            .field("use_llm", &self.config.use_llm)
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(spellcheck: bool) -> QueryRouter {
        QueryRouter::new(
            RouterConfig {
                spellcheck,
                use_llm: false,
            },
            None,
        )
    }

    #[test]
    fn test_preprocess_normalizes() {
        let query = router(false).preprocess("  Show Monthly USAGE  ");
        assert_eq!(query.original, "  Show Monthly USAGE  ");
        assert_eq!(query.normalized, "show monthly usage");
    }

    #[test]
    fn test_preprocess_corrects_spelling() {
        let query = router(true).preprocess("helllo wrold");
        assert_eq!(query.normalized, "hello world");
    }

    #[test]
    fn test_preprocess_preserves_surrounding_text() {
        let query = router(true).preprocess("please show the totl usage");
        assert_eq!(query.normalized, "please show the total usage");
    }

    #[tokio::test]
    async fn test_sql_generation_routes_analytical() {
        let router = router(false);
        let query = router.preprocess("Generate SQL to find all users who signed up last month");
        let decision = router.route(&query).await;

        assert_eq!(decision.route, QueryRoute::AnalyticalTask);
        assert!((decision.confidence - 0.75).abs() < f64::EPSILON);
        assert!(!decision.requires_visualization);
    }

    #[tokio::test]
    async fn test_llm_enabled_without_provider_degrades_to_heuristic() {
        let router = QueryRouter::new(
            RouterConfig {
                spellcheck: false,
                use_llm: true,
            },
            None,
        );

        let query = router.preprocess("plot usage by month");
        let decision = router.route(&query).await;

        assert_eq!(decision.route, QueryRoute::AnalyticalTask);
        assert!(decision.requires_visualization);
    }
}
