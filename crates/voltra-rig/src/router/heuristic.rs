//! Keyword-heuristic query classification.
//!
//! Confidence values are fixed per vocabulary rather than scaled by match
//! count: one strong keyword is as decisive as five.

use super::decision::{QueryRoute, RoutingDecision};

/// Confidence assigned to analytical-keyword matches.
const ANALYTICAL_CONFIDENCE: f64 = 0.75;

/// Confidence assigned to visualization-keyword matches.
const VISUALIZATION_CONFIDENCE: f64 = 0.8;

/// Confidence assigned to the default retrieval route.
const RETRIEVAL_CONFIDENCE: f64 = 0.6;

/// Confidence assigned to under-specified queries.
const CLARIFICATION_CONFIDENCE: f64 = 0.5;

/// Vocabulary indicating computation, aggregation, or code generation.
const ANALYTICAL_KEYWORDS: &[&str] = &[
    "calculate",
    "compute",
    "average",
    "mean",
    "median",
    "sum of",
    "total",
    "count",
    "generate",
    "sql",
    "trend",
    "forecast",
    "predict",
    "correlat",
    "regression",
    "compare",
    "distribution",
    "group by",
    "aggregate",
    "analyze",
    "analysis",
    "statistic",
    "percent",
    "growth",
    "outlier",
    "anomal",
];

/// Vocabulary indicating the answer should be a chart.
const VISUALIZATION_KEYWORDS: &[&str] = &[
    "plot",
    "chart",
    "graph",
    "visualize",
    "visualise",
    "visualization",
    "histogram",
    "heatmap",
    "scatter",
    "pie",
    "dashboard",
    "draw",
];

/// Classifies a normalized query by keyword membership.
pub(super) fn classify(normalized: &str) -> RoutingDecision {
    let word_count = normalized.split_whitespace().count();

    if word_count < 2 {
        return RoutingDecision::new(
            QueryRoute::ClarificationNeeded,
            CLARIFICATION_CONFIDENCE,
            "query is too short to classify",
        );
    }

    let visualization_hit = VISUALIZATION_KEYWORDS
        .iter()
        .find(|keyword| normalized.contains(*keyword));

    if let Some(keyword) = visualization_hit {
        return RoutingDecision::new(
            QueryRoute::AnalyticalTask,
            VISUALIZATION_CONFIDENCE,
            format!("visualization keyword match: {keyword}"),
        )
        .with_visualization();
    }

    let analytical_hit = ANALYTICAL_KEYWORDS
        .iter()
        .find(|keyword| normalized.contains(*keyword));

    if let Some(keyword) = analytical_hit {
        return RoutingDecision::new(
            QueryRoute::AnalyticalTask,
            ANALYTICAL_CONFIDENCE,
            format!("analytical keyword match: {keyword}"),
        );
    }

    RoutingDecision::new(
        QueryRoute::DirectRetrieval,
        RETRIEVAL_CONFIDENCE,
        "no analytical or visualization keywords matched",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visualization_keyword_wins_over_analytical() {
        let decision = classify("plot the average usage per month");
        assert_eq!(decision.route, QueryRoute::AnalyticalTask);
        assert_eq!(decision.confidence, VISUALIZATION_CONFIDENCE);
        assert!(decision.requires_visualization);
    }

    #[test]
    fn test_analytical_keyword() {
        let decision = classify("calculate the total cost for site a");
        assert_eq!(decision.route, QueryRoute::AnalyticalTask);
        assert_eq!(decision.confidence, ANALYTICAL_CONFIDENCE);
        assert!(!decision.requires_visualization);
    }

    #[test]
    fn test_plain_question_routes_to_retrieval() {
        let decision = classify("what does the tariff document say about peak hours");
        assert_eq!(decision.route, QueryRoute::DirectRetrieval);
    }

    #[test]
    fn test_single_word_needs_clarification() {
        let decision = classify("usage");
        assert_eq!(decision.route, QueryRoute::ClarificationNeeded);
    }
}
