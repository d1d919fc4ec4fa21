//! LLM-based query classification.

use serde::Deserialize;

use super::decision::{QueryRoute, RoutingDecision};
use crate::provider::CompletionProvider;
use crate::text::strip_code_fences;
use crate::{Error, Result};

const PREAMBLE: &str = "\
You are a query router for a data analytics assistant. Classify each user
query into exactly one route:

- \"direct_retrieval\": the answer can be read out of stored documents.
- \"analytical_task\": answering requires computation, aggregation, code
  generation, or producing a chart.
- \"clarification_needed\": the query is too vague to process.

Respond with strict JSON only, no explanations outside of it, no markdown:
{\"route\": \"...\", \"confidence\": 0.0, \"explanation\": \"...\",
 \"requires_visualization\": false}

Examples:
Query: what does my contract say about peak tariffs?
{\"route\": \"direct_retrieval\", \"confidence\": 0.9, \"explanation\": \"lookup in stored documents\", \"requires_visualization\": false}
Query: plot monthly consumption for 2024
{\"route\": \"analytical_task\", \"confidence\": 0.95, \"explanation\": \"requires aggregation and a chart\", \"requires_visualization\": true}
Query: energy stuff
{\"route\": \"clarification_needed\", \"confidence\": 0.8, \"explanation\": \"no concrete question\", \"requires_visualization\": false}";

/// The JSON shape the model is instructed to return.
#[derive(Debug, Deserialize)]
struct RawDecision {
    route: String,
    confidence: f64,
    explanation: String,
    #[serde(default)]
    requires_visualization: bool,
}

/// Classifies a query with the LLM, embedding the heuristic pre-analysis.
///
/// Returns an error on any provider failure or schema violation; the caller
/// downgrades those to the heuristic result.
pub(super) async fn classify(
    provider: &CompletionProvider,
    normalized: &str,
    heuristic: &RoutingDecision,
) -> Result<RoutingDecision> {
    let prompt = format!(
        "{PREAMBLE}\n\nHeuristic pre-analysis: route={}, confidence={:.2} ({})\n\nQuery: {}",
        heuristic.route.as_ref(),
        heuristic.confidence,
        heuristic.explanation,
        normalized,
    );

    let content = provider
        .complete_with_temperature(&prompt, vec![], Some(0.0))
        .await?;

    parse_decision(&content)
}

/// Parses and validates the model's JSON answer.
fn parse_decision(content: &str) -> Result<RoutingDecision> {
    let stripped = strip_code_fences(content);

    let raw: RawDecision = serde_json::from_str(stripped)
        .map_err(|e| Error::malformed_response(format!("non-JSON routing output: {e}")))?;

    let route: QueryRoute = raw
        .route
        .parse()
        .map_err(|_| Error::malformed_response(format!("unknown route label: {}", raw.route)))?;

    if !(0.0..=1.0).contains(&raw.confidence) {
        return Err(Error::malformed_response(format!(
            "confidence out of range: {}",
            raw.confidence
        )));
    }

    let mut decision = RoutingDecision::new(route, raw.confidence, raw.explanation);
    if raw.requires_visualization {
        decision = decision.with_visualization();
    }

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_decision() {
        let content = r#"{"route": "analytical_task", "confidence": 0.9,
            "explanation": "needs aggregation", "requires_visualization": true}"#;

        let decision = parse_decision(content).expect("valid decision");
        assert_eq!(decision.route, QueryRoute::AnalyticalTask);
        assert!(decision.requires_visualization);
    }

    #[test]
    fn test_parse_fenced_decision() {
        let content = "```json\n{\"route\": \"direct_retrieval\", \"confidence\": 0.8, \"explanation\": \"lookup\"}\n```";

        let decision = parse_decision(content).expect("valid fenced decision");
        assert_eq!(decision.route, QueryRoute::DirectRetrieval);
        assert!(!decision.requires_visualization);
    }

    #[test]
    fn test_parse_rejects_unknown_label() {
        let content = r#"{"route": "hybrid", "confidence": 0.8, "explanation": "?"}"#;
        assert!(parse_decision(content).is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_confidence() {
        let content = r#"{"route": "direct_retrieval", "confidence": 1.4, "explanation": "?"}"#;
        assert!(parse_decision(content).is_err());
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(parse_decision("I think this is analytical.").is_err());
    }
}
