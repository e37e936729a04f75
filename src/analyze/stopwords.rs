//! Default English stopword set for keyword extraction.
//!
//! Overridable at runtime via a TOML file (`words = [...]`), see
//! `config::load_stopwords_from`.

use std::collections::HashSet;

use once_cell::sync::Lazy;

const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "with", "from", "was", "are", "were", "been",
    "has", "have", "had", "does", "did", "will", "would", "could", "should",
    "may", "might", "shall", "can", "not", "nor", "yet", "both", "either",
    "neither", "each", "few", "more", "most", "other", "some", "such", "than",
    "too", "very", "just", "that", "this", "these", "those", "its", "our",
    "they", "their", "new", "also", "using", "based", "show", "shows",
    "paper", "study", "research", "results", "method", "methods", "approach",
    "proposed", "model", "models", "data", "use", "used", "two", "first",
    "second", "one", "three",
];

static DEFAULTS: Lazy<HashSet<String>> = Lazy::new(|| {
    DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect()
});

/// Owned copy of the built-in stopword set.
pub fn default_stopwords() -> HashSet<String> {
    DEFAULTS.clone()
}

pub fn is_default_stopword(token: &str) -> bool {
    DEFAULTS.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_fillers_are_stopwords() {
        assert!(is_default_stopword("the"));
        assert!(is_default_stopword("proposed"));
        assert!(!is_default_stopword("transformer"));
    }
}
