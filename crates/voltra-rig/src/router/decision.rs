//! Routing decision types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// A query after preprocessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessedQuery {
    /// The query exactly as the user typed it.
    pub original: String,
    /// Trimmed, lowercased, optionally spell-corrected form.
    pub normalized: String,
}

/// The processing path chosen for a query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, IntoStaticStr,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueryRoute {
    /// Answer from retrieved chunks directly.
    DirectRetrieval,
    /// Generate and execute analysis code.
    AnalyticalTask,
    /// Ask the user to narrow the question.
    ClarificationNeeded,
}

/// The outcome of query classification.
///
/// Ephemeral: produced per query and consumed immediately by the caller to
/// pick a processing path; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Chosen processing path.
    pub route: QueryRoute,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    /// Free-text explanation of the choice.
    pub explanation: String,
    /// Whether the answer should include a visualization.
    pub requires_visualization: bool,
}

impl RoutingDecision {
    /// Creates a decision.
    pub fn new(route: QueryRoute, confidence: f64, explanation: impl Into<String>) -> Self {
        Self {
            route,
            confidence: confidence.clamp(0.0, 1.0),
            explanation: explanation.into(),
            requires_visualization: false,
        }
    }

    /// Flags the decision as requiring a visualization.
    pub fn with_visualization(mut self) -> Self {
        self.requires_visualization = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_route_serialization() {
        assert_eq!(QueryRoute::DirectRetrieval.as_ref(), "direct_retrieval");
        assert_eq!(QueryRoute::AnalyticalTask.as_ref(), "analytical_task");
        assert_eq!(
            QueryRoute::from_str("clarification_needed").unwrap(),
            QueryRoute::ClarificationNeeded
        );
    }

    #[test]
    fn test_confidence_clamped() {
        let decision = RoutingDecision::new(QueryRoute::DirectRetrieval, 1.7, "test");
        assert_eq!(decision.confidence, 1.0);
    }
}
