//! Entity-name heuristics for analytical retrieval.
//!
//! Ingested records are stored as `key: value` lines, so entity names are
//! recognized both from naming columns and from capitalized multi-word
//! phrases in free text.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{ChunkMetadata, RetrievedChunk};

/// `name: Acme Energy` style lines from formatted records.
static NAMED_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^(?:name|customer|customer_name|entity|site|account|supplier)\s*:\s*(.+)$")
        .expect("valid named-field regex")
});

/// Capitalized multi-word phrases in free text.
static PROPER_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z0-9]+(?:\s+[A-Z][a-z0-9]+)+)\b").expect("valid proper-phrase regex")
});

/// `about <Entity>?` style references in a question.
static ABOUT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\babout\s+([\w][\w\s&'-]{1,40}?)\s*(?:\?|$)"#).expect("valid about regex")
});

/// Quoted names in a question.
static QUOTED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]{2,60})"|'([^']{2,60})'"#).expect("valid quoted regex"));

/// Extracts a probable entity name from a query for the text-search tier.
///
/// Tried in order: quoted name, `about <entity>`, trailing capitalized
/// phrase. Returns `None` when nothing matches; the caller then searches
/// for the raw query text.
pub(crate) fn extract_probable_entity(query: &str) -> Option<String> {
    if let Some(captures) = QUOTED_PATTERN.captures(query) {
        let name = captures.get(1).or_else(|| captures.get(2))?;
        return Some(name.as_str().trim().to_string());
    }

    if let Some(captures) = ABOUT_PATTERN.captures(query) {
        return Some(captures[1].trim().to_string());
    }

    PROPER_PHRASE
        .captures(query)
        .map(|captures| captures[1].trim().to_string())
}

/// Builds the synthetic entity-count summary pseudo-chunk.
///
/// Scans result content and metadata for entity names and reports
/// occurrence counts. Similarity 1.0 guarantees the summary sorts first.
/// Returns `None` when no entity was recognized.
pub(crate) fn entity_count_summary(results: &[RetrievedChunk]) -> Option<RetrievedChunk> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for chunk in results {
        // One count per entity per record, however many times it appears
        let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();

        for captures in NAMED_FIELD.captures_iter(&chunk.content) {
            seen.insert(captures[1].trim().to_string());
        }

        for captures in PROPER_PHRASE.captures_iter(&chunk.content) {
            seen.insert(captures[1].trim().to_string());
        }

        for entity in seen {
            *counts.entry(entity).or_default() += 1;
        }
    }

    if counts.is_empty() {
        return None;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let distinct = ranked.len();
    let top = ranked
        .iter()
        .take(10)
        .map(|(name, count)| format!("{name} ({count})"))
        .collect::<Vec<_>>()
        .join(", ");

    let source_id = results
        .first()
        .map(|chunk| chunk.metadata.source_id)
        .unwrap_or_default();

    Some(RetrievedChunk {
        id: format!("entity-summary-{distinct}"),
        content: format!(
            "Entity count summary: {distinct} distinct entities across \
             {} matching records. Counts: {top}",
            results.len()
        ),
        metadata: ChunkMetadata {
            similarity: 1.0,
            source: "entity_summary".into(),
            source_id,
            source_type: "synthetic".into(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> RetrievedChunk {
        RetrievedChunk {
            id: "1".into(),
            content: content.into(),
            metadata: ChunkMetadata {
                similarity: 0.9,
                source: "stub".into(),
                source_id: 1,
                source_type: "csv".into(),
            },
        }
    }

    #[test]
    fn test_extract_quoted_entity() {
        assert_eq!(
            extract_probable_entity(r#"how much did "Acme Energy" use?"#).as_deref(),
            Some("Acme Energy")
        );
    }

    #[test]
    fn test_extract_about_entity() {
        assert_eq!(
            extract_probable_entity("tell me about northwind utilities?").as_deref(),
            Some("northwind utilities")
        );
    }

    #[test]
    fn test_extract_proper_phrase() {
        assert_eq!(
            extract_probable_entity("usage for Harbor Point last month").as_deref(),
            Some("Harbor Point")
        );
    }

    #[test]
    fn test_extract_none_for_plain_query() {
        assert_eq!(extract_probable_entity("total usage last month"), None);
    }

    #[test]
    fn test_summary_counts_named_fields() {
        let results = vec![
            chunk("customer: Acme Energy\nusage_kwh: 412"),
            chunk("customer: Acme Energy\nusage_kwh: 13"),
            chunk("customer: Harbor Point\nusage_kwh: 99"),
        ];

        let summary = entity_count_summary(&results).expect("summary present");
        assert_eq!(summary.metadata.similarity, 1.0);
        assert!(summary.content.contains("Acme Energy (2)"));
        assert!(summary.content.contains("Harbor Point (1)"));
    }

    #[test]
    fn test_summary_absent_without_entities() {
        let results = vec![chunk("usage_kwh: 412")];
        assert!(entity_count_summary(&results).is_none());
    }
}
