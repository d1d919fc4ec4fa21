//! Shared text helpers for model output handling.

/// Strips Markdown code fences from model output.
///
/// Models regularly wrap JSON or code in ```` ```lang ```` fences despite
/// instructions not to; parsing must tolerate both fenced and bare output.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the optional language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fences_with_language_tag() {
        let fenced = "```json\n{\"route\": \"direct_retrieval\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"route\": \"direct_retrieval\"}");
    }

    #[test]
    fn test_strips_bare_fences() {
        let fenced = "```\nprint('hi')\n```";
        assert_eq!(strip_code_fences(fenced), "print('hi')");
    }

    #[test]
    fn test_leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }
}
