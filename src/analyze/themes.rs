//! Theme derivation: cluster ranked keywords into coarse categories.
//!
//! The keyword→theme taxonomy is business configuration, not code — callers
//! can override the built-in map from a TOML file (see `config`).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::analyze::keywords::KeywordCount;

pub const GENERAL_THEME: &str = "general";

/// Many-to-one keyword→theme mapping over normalized tokens.
#[derive(Debug, Clone, Default)]
pub struct ThemeMap {
    by_keyword: BTreeMap<String, String>,
}

/// TOML shape: `[themes]` table mapping a theme label to its keywords.
#[derive(Debug, Deserialize)]
struct ThemeFile {
    themes: BTreeMap<String, Vec<String>>,
}

impl ThemeMap {
    pub fn from_groups(groups: &[(&str, &[&str])]) -> Self {
        let mut by_keyword = BTreeMap::new();
        for (theme, keywords) in groups {
            for kw in *keywords {
                by_keyword.insert(kw.to_lowercase(), theme.to_string());
            }
        }
        Self { by_keyword }
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let file: ThemeFile = toml::from_str(content)?;
        let mut by_keyword = BTreeMap::new();
        for (theme, keywords) in file.themes {
            for kw in keywords {
                let kw = kw.trim().to_lowercase();
                if !kw.is_empty() {
                    by_keyword.insert(kw, theme.clone());
                }
            }
        }
        Ok(Self { by_keyword })
    }

    pub fn theme_for(&self, keyword: &str) -> Option<&str> {
        self.by_keyword.get(keyword).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_keyword.is_empty()
    }
}

/// Built-in taxonomy over the usual AI coverage areas.
pub fn default_theme_map() -> ThemeMap {
    ThemeMap::from_groups(&[
        (
            "Large Language Models",
            &[
                "llm",
                "llms",
                "gpt",
                "language model",
                "language models",
                "chatgpt",
                "gemini",
                "claude",
                "llama",
            ][..],
        ),
        (
            "Computer Vision",
            &["vision", "image", "object detection", "cnn", "visual", "diffusion"][..],
        ),
        (
            "Reinforcement Learning",
            &[
                "reinforcement",
                "reinforcement learning",
                "reward",
                "policy",
                "agent",
                "agents",
            ][..],
        ),
        (
            "AI Safety & Alignment",
            &["safety", "ai safety", "alignment", "harmful", "bias", "ethics", "responsible"][..],
        ),
        (
            "Multimodal AI",
            &["multimodal", "audio", "video", "video generation", "speech"][..],
        ),
        (
            "AI Infrastructure",
            &["inference", "training", "gpu", "gpus", "compute", "deployment", "scalability"][..],
        ),
        (
            "Natural Language Processing",
            &["nlp", "sentiment", "translation", "summarization", "ner"][..],
        ),
        (
            "Generative AI",
            &["generative", "gen ai", "diffusion model", "stable diffusion", "midjourney"][..],
        ),
        (
            "AI in Healthcare",
            &["healthcare", "medical", "clinical", "diagnosis", "drug discovery"][..],
        ),
        (
            "Robotics & Automation",
            &["robot", "robots", "robotics", "automation", "autonomous", "drone"][..],
        ),
    ])
}

/// Cluster top keywords into ordered theme labels.
///
/// Theme score is the summed count of its mapped keywords; ordering is score
/// descending with alphabetical tie-break. An unmapped keyword lands in the
/// "general" bucket only when it appeared in at least `min_general_count`
/// distinct items, otherwise it is treated as noise and omitted.
pub fn derive_themes(
    top_keywords: &[KeywordCount],
    map: &ThemeMap,
    min_general_count: u64,
    max_themes: usize,
) -> Vec<String> {
    let mut scores: BTreeMap<&str, u64> = BTreeMap::new();
    for kc in top_keywords {
        match map.theme_for(&kc.keyword) {
            Some(theme) => *scores.entry(theme).or_default() += kc.count,
            None if kc.count >= min_general_count => {
                *scores.entry(GENERAL_THEME).or_default() += kc.count;
            }
            None => {}
        }
    }

    let mut ordered: Vec<(&str, u64)> = scores.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ordered.truncate(max_themes);
    ordered.into_iter().map(|(t, _)| t.to_string()).collect()
}
