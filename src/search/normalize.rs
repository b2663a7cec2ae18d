//! Text normalization shared by queries and indexed text.

use regex::Regex;
use std::sync::LazyLock;

/// Every run of characters outside `[a-z0-9]` (after lower-casing).
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9]+").unwrap_or_else(|e| panic!("invalid separator pattern: {e}"))
});

/// Lower-case, collapse non-alphanumeric runs to one space, trim.
///
/// Non-ASCII letters count as separators: `"Café-Bar"` → `"caf bar"`.
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    SEPARATORS.replace_all(&lower, " ").trim().to_owned()
}

/// Normalized query split into terms, duplicates dropped, order kept.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in normalize(query).split(' ').filter(|t| !t.is_empty()) {
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_owned());
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_collapses() {
        assert_eq!(normalize("  Red  LIGHT!! -- on "), "red light on");
        assert_eq!(normalize("ENG-1 (fail)"), "eng 1 fail");
    }

    #[test]
    fn test_normalize_non_ascii_is_separator() {
        assert_eq!(normalize("Café-Bar"), "caf bar");
    }

    #[test]
    fn test_normalize_empty_and_symbols_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!.,"), "");
    }

    #[test]
    fn test_query_terms_dedup() {
        assert_eq!(query_terms("red Red light"), ["red", "light"]);
        assert!(query_terms("   ").is_empty());
    }

    #[test]
    fn test_query_terms_metacharacters_are_separators() {
        assert_eq!(query_terms("a.*b (c|d)"), ["a", "b", "c", "d"]);
    }
}
