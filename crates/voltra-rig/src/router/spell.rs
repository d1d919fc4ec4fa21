//! Spelling correction for query preprocessing.
//!
//! Tokens outside the dictionary are replaced with the closest dictionary
//! word within edit distance 2. Replacements are applied in reverse offset
//! order so earlier offsets stay valid while the string is rewritten.

/// Maximum edit distance for a suggestion to be applied.
const MAX_EDIT_DISTANCE: usize = 2;

/// Minimum token length considered for correction; short tokens produce
/// too many false positives.
const MIN_TOKEN_LENGTH: usize = 3;

/// Common English plus energy-analytics vocabulary.
const DEFAULT_DICTIONARY: &[&str] = &[
    "about", "account", "aggregate", "all", "analysis", "analyze", "and", "anomaly", "average",
    "bar", "between", "billing", "building", "carbon", "change", "chart", "column", "compare",
    "compute", "consumption", "cost", "count", "create", "customer", "daily", "dashboard", "data",
    "demand", "distribution", "draw", "electricity", "emission", "energy", "find", "first",
    "for", "forecast", "from", "gas", "generate", "graph", "grid", "group", "growth", "hello",
    "highest", "histogram", "hour", "how", "invoice", "kilowatt", "last", "list", "lowest",
    "many", "maximum", "mean", "median", "meter", "minimum", "month", "monthly", "much",
    "number", "outlier", "peak", "percent", "please", "plot", "power", "predict", "price",
    "rate", "reading", "records", "regression", "report", "row", "sensor", "show", "site",
    "solar", "source", "statistics", "sum", "summary", "table", "tariff", "that", "the",
    "this", "total", "trend", "usage", "value", "visualize", "water", "weekly", "what",
    "when", "where", "which", "with", "world", "year", "yearly",
];

/// Dictionary-based spell corrector.
#[derive(Clone)]
pub struct SpellChecker {
    dictionary: Vec<&'static str>,
}

impl SpellChecker {
    /// Creates a corrector with the built-in vocabulary.
    pub fn with_default_dictionary() -> Self {
        Self {
            dictionary: DEFAULT_DICTIONARY.to_vec(),
        }
    }

    /// Corrects a normalized (lowercase) text.
    ///
    /// Returns the text with each flagged token replaced by its top
    /// suggestion; untouched text and offsets are preserved.
    pub fn correct(&self, text: &str) -> String {
        let mut corrections: Vec<(usize, usize, &str)> = Vec::new();

        for (offset, token) in tokens(text) {
            if token.len() < MIN_TOKEN_LENGTH || self.dictionary.contains(&token) {
                continue;
            }

            if let Some(suggestion) = self.suggest(token) {
                corrections.push((offset, token.len(), suggestion));
            }
        }

        let mut corrected = text.to_string();

        // Substitute in reverse offset order to avoid shifting the indices
        // of earlier corrections.
        for (offset, len, suggestion) in corrections.into_iter().rev() {
            corrected.replace_range(offset..offset + len, suggestion);
        }

        corrected
    }

    /// Returns the closest dictionary word within the distance cutoff.
    fn suggest(&self, token: &str) -> Option<&'static str> {
        let mut best: Option<(usize, &'static str)> = None;

        for word in &self.dictionary {
            let distance = levenshtein(token, word);

            if distance <= MAX_EDIT_DISTANCE
                && best.is_none_or(|(best_distance, _)| distance < best_distance)
            {
                best = Some((distance, word));
            }
        }

        best.map(|(_, word)| word)
    }
}

impl std::fmt::Debug for SpellChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpellChecker")
            .field("dictionary_size", &self.dictionary.len())
            .finish()
    }
}

/// Iterates alphabetic tokens with their byte offsets.
fn tokens(text: &str) -> Vec<(usize, &str)> {
    let mut result = Vec::new();
    let mut start: Option<usize> = None;

    for (index, c) in text.char_indices() {
        if c.is_ascii_alphabetic() {
            start.get_or_insert(index);
        } else if let Some(s) = start.take() {
            result.push((s, &text[s..index]));
        }
    }

    if let Some(s) = start {
        result.push((s, &text[s..]));
    }

    result
}

/// Classic two-row Levenshtein distance.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;

        for (j, cb) in b.iter().enumerate() {
            let substitution_cost = usize::from(ca != cb);
            current[j + 1] = (previous[j] + substitution_cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }

        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("hello", "hello"), 0);
        assert_eq!(levenshtein("helllo", "hello"), 1);
        assert_eq!(levenshtein("wrold", "world"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn test_correct_both_tokens() {
        let checker = SpellChecker::with_default_dictionary();
        assert_eq!(checker.correct("helllo wrold"), "hello world");
    }

    #[test]
    fn test_correct_preserves_punctuation_and_offsets() {
        let checker = SpellChecker::with_default_dictionary();
        assert_eq!(
            checker.correct("show me the totl usage, please!"),
            "show me the total usage, please!"
        );
    }

    #[test]
    fn test_dictionary_words_untouched() {
        let checker = SpellChecker::with_default_dictionary();
        assert_eq!(
            checker.correct("average monthly consumption"),
            "average monthly consumption"
        );
    }

    #[test]
    fn test_distant_tokens_left_alone() {
        let checker = SpellChecker::with_default_dictionary();
        // No dictionary word within distance 2 of "xqzvw"
        assert_eq!(checker.correct("xqzvw usage"), "xqzvw usage");
    }

    #[test]
    fn test_short_tokens_skipped() {
        let checker = SpellChecker::with_default_dictionary();
        assert_eq!(checker.correct("ab usage"), "ab usage");
    }
}
