//! Keyword extraction: tokenize corpus items and rank by document frequency.
//!
//! Counts are document frequencies — a token is counted at most once per
//! corpus item, so one verbose abstract cannot dominate the ranking. Ties are
//! broken by the token's earliest appearance index across the corpus, which
//! makes the output fully deterministic for a given corpus snapshot.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;

const MIN_TOKEN_LEN: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

/// Unigrams and contiguous bigrams from pre-normalized text, in appearance
/// order. The length floor applies to the whole token, so a short word like
/// "ai" can still anchor a phrase ("ai safety"). A bigram is dropped when
/// either word is a stopword or the joined phrase itself is one.
pub fn tokenize(text: &str, stopwords: &HashSet<String>) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let is_stop = |w: &str| stopwords.contains(w);

    let mut tokens = Vec::with_capacity(words.len() * 2);
    for (i, w) in words.iter().enumerate() {
        if w.len() >= MIN_TOKEN_LEN && !is_stop(w) {
            tokens.push(w.to_string());
        }
        if let Some(next) = words.get(i + 1) {
            if !is_stop(w) && !is_stop(next) {
                let phrase = format!("{w} {next}");
                if phrase.len() >= MIN_TOKEN_LEN && !stopwords.contains(&phrase) {
                    tokens.push(phrase);
                }
            }
        }
    }
    tokens
}

/// Rank keywords across the corpus by document frequency.
pub fn rank_keywords(
    corpus: &Corpus,
    stopwords: &HashSet<String>,
    limit: usize,
) -> Vec<KeywordCount> {
    // token -> (document frequency, first-seen position)
    let mut counts: HashMap<String, (u64, usize)> = HashMap::new();
    let mut position = 0usize;

    for item in &corpus.items {
        let mut seen_in_item: HashSet<&str> = HashSet::new();
        let tokens = tokenize(&item.text, stopwords);
        for token in &tokens {
            position += 1;
            let entry = counts
                .entry(token.clone())
                .or_insert_with(|| (0, position));
            if seen_in_item.insert(token.as_str()) {
                entry.0 += 1;
            }
        }
    }

    let mut ranked: Vec<(String, u64, usize)> = counts
        .into_iter()
        .map(|(token, (count, first_seen))| (token, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(keyword, count, _)| KeywordCount { keyword, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::stopwords::default_stopwords;
    use crate::corpus::{CorpusItem, OriginType};
    use chrono::{TimeZone, Utc};

    fn item(text: &str) -> CorpusItem {
        CorpusItem {
            text: text.to_string(),
            published_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            origin: OriginType::News,
            source_label: "t".into(),
        }
    }

    fn corpus(texts: &[&str]) -> Corpus {
        Corpus {
            items: texts.iter().map(|t| item(t)).collect(),
        }
    }

    #[test]
    fn tokenize_emits_unigrams_and_bigrams() {
        let sw = default_stopwords();
        let toks = tokenize("ai safety matters", &sw);
        // "ai" is too short as a unigram but still anchors the phrase.
        assert_eq!(
            toks,
            vec!["ai safety", "safety", "safety matters", "matters"]
        );
    }

    #[test]
    fn bigrams_with_stopword_halves_are_dropped() {
        let sw = default_stopwords();
        let toks = tokenize("the transformer architecture", &sw);
        assert_eq!(
            toks,
            vec!["transformer", "transformer architecture", "architecture"]
        );
    }

    #[test]
    fn short_and_stopword_tokens_are_dropped() {
        let sw = default_stopwords();
        let toks = tokenize("the ml of transformer", &sw);
        assert_eq!(toks, vec!["transformer"]);
    }

    #[test]
    fn document_frequency_counts_once_per_item() {
        let sw = default_stopwords();
        let c = corpus(&["transformer transformer transformer transformer transformer"]);
        let ranked = rank_keywords(&c, &sw, 10);
        let t = ranked.iter().find(|k| k.keyword == "transformer").unwrap();
        assert_eq!(t.count, 1);
    }

    #[test]
    fn ties_break_by_first_seen_order() {
        let sw = HashSet::new();
        let c = corpus(&["zebra apple", "zebra apple"]);
        let ranked = rank_keywords(&c, &sw, 3);
        // All three tokens tie at count 2; appearance order decides.
        let names: Vec<&str> = ranked.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(names, vec!["zebra", "zebra apple", "apple"]);
        assert!(ranked.iter().all(|k| k.count == 2));
    }

    #[test]
    fn ranking_is_deterministic_across_runs() {
        let sw = default_stopwords();
        let c = corpus(&[
            "agents planning reasoning",
            "planning agents",
            "reasoning benchmarks",
        ]);
        let a = rank_keywords(&c, &sw, 20);
        let b = rank_keywords(&c, &sw, 20);
        assert_eq!(a, b);
    }
}
