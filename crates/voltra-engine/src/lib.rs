#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod ingest;
pub mod pipeline;
pub mod retrieval;

mod error;

pub use error::{EngineError, EngineResult};

/// Tracing target for engine operations.
pub const TRACING_TARGET: &str = "voltra_engine";

/// Parses raw data-source id strings to their numeric form.
///
/// Any unparsable id fails the whole call; this is the one input-validation
/// error the orchestration layer raises instead of degrading.
pub fn parse_data_source_ids(raw_ids: &[String]) -> EngineResult<Vec<i64>> {
    raw_ids
        .iter()
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .map_err(|_| EngineError::InvalidDataSourceId(raw.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_ids() {
        let ids = parse_data_source_ids(&["1".into(), " 42 ".into()]).unwrap();
        assert_eq!(ids, vec![1, 42]);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let result = parse_data_source_ids(&["1".into(), "abc".into()]);
        assert!(matches!(
            result,
            Err(EngineError::InvalidDataSourceId(id)) if id == "abc"
        ));
    }
}
