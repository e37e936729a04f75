//! Explicit pipeline configuration.
//!
//! Everything the run needs is enumerated here and resolved once at startup —
//! core logic never reads the process environment. Taxonomy and stopword
//! overrides load from TOML with an env-path override and `config/` fallback.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::analyze::{stopwords, themes, AnalyzerOptions, ThemeMap};

const ENV_THEMES_PATH: &str = "TREND_THEMES_PATH";
const ENV_STOPWORDS_PATH: &str = "TREND_STOPWORDS_PATH";

const REQUIRED_VARS: &[&str] = &[
    "NEWS_API_KEY",
    "SMTP_HOST",
    "SMTP_USER",
    "SMTP_PASS",
    "REPORT_EMAIL_FROM",
    "REPORT_EMAIL_RECIPIENTS",
    "SHEET_WEBHOOK_URL",
];

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub from: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub news_api_key: String,
    pub news_query: String,
    pub paper_query: String,
    pub days_back: u32,
    pub max_articles: usize,
    pub max_papers: usize,
    pub email: EmailConfig,
    pub sheet_webhook: String,
    /// Root for charts/, reports/, logs/ artifacts.
    pub out_dir: PathBuf,
    pub email_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_exponential: bool,
    pub analyzer: AnalyzerOptions,
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow!("{name} has an unparseable value `{raw}`")),
        None => Ok(default),
    }
}

impl PipelineConfig {
    /// Build from the process environment, reporting every missing required
    /// variable at once.
    pub fn from_env() -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| optional(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(anyhow!(
                "missing required environment variables: {}",
                missing.join(", ")
            ));
        }

        let recipients: Vec<String> = optional("REPORT_EMAIL_RECIPIENTS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(anyhow!("REPORT_EMAIL_RECIPIENTS contains no addresses"));
        }

        Ok(Self {
            news_api_key: optional("NEWS_API_KEY").unwrap_or_default(),
            news_query: optional("TREND_NEWS_QUERY")
                .unwrap_or_else(|| "artificial intelligence machine learning".to_string()),
            paper_query: optional("TREND_PAPER_QUERY").unwrap_or_else(|| {
                "artificial intelligence large language models deep learning".to_string()
            }),
            days_back: parse_or("TREND_DAYS_BACK", 7)?,
            max_articles: parse_or("TREND_MAX_ARTICLES", 50)?,
            max_papers: parse_or("TREND_MAX_PAPERS", 30)?,
            email: EmailConfig {
                host: optional("SMTP_HOST").unwrap_or_default(),
                user: optional("SMTP_USER").unwrap_or_default(),
                password: optional("SMTP_PASS").unwrap_or_default(),
                from: optional("REPORT_EMAIL_FROM").unwrap_or_default(),
                recipients,
            },
            sheet_webhook: optional("SHEET_WEBHOOK_URL").unwrap_or_default(),
            out_dir: optional("TREND_OUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("temp")),
            email_retries: parse_or("TREND_EMAIL_RETRIES", 1)?,
            backoff_base_ms: parse_or("TREND_BACKOFF_MS", 500)?,
            backoff_exponential: parse_or("TREND_BACKOFF_EXPONENTIAL", true)?,
            analyzer: load_analyzer_options()?,
        })
    }
}

/// Analyzer knobs: built-in defaults, with taxonomy/stopword TOML overrides
/// when present.
pub fn load_analyzer_options() -> Result<AnalyzerOptions> {
    Ok(AnalyzerOptions {
        stopwords: load_stopwords_default()?,
        theme_map: load_theme_map_default()?,
        ..AnalyzerOptions::default()
    })
}

/// Theme taxonomy resolution:
/// 1) $TREND_THEMES_PATH (must exist when set)
/// 2) config/themes.toml
/// 3) built-in default map
pub fn load_theme_map_default() -> Result<ThemeMap> {
    if let Some(p) = optional(ENV_THEMES_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_THEMES_PATH} points to a non-existent path"));
        }
        return load_theme_map_from(&pb);
    }
    let fallback = PathBuf::from("config/themes.toml");
    if fallback.exists() {
        return load_theme_map_from(&fallback);
    }
    Ok(themes::default_theme_map())
}

pub fn load_theme_map_from(path: &Path) -> Result<ThemeMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading theme map from {}", path.display()))?;
    ThemeMap::from_toml(&content)
        .with_context(|| format!("parsing theme map from {}", path.display()))
}

/// Stopword resolution mirrors the theme map: env path, `config/` fallback,
/// then the built-in list.
pub fn load_stopwords_default() -> Result<HashSet<String>> {
    if let Some(p) = optional(ENV_STOPWORDS_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_STOPWORDS_PATH} points to a non-existent path"));
        }
        return load_stopwords_from(&pb);
    }
    let fallback = PathBuf::from("config/stopwords.toml");
    if fallback.exists() {
        return load_stopwords_from(&fallback);
    }
    Ok(stopwords::default_stopwords())
}

pub fn load_stopwords_from(path: &Path) -> Result<HashSet<String>> {
    #[derive(Deserialize)]
    struct StopwordFile {
        words: Vec<String>,
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading stopwords from {}", path.display()))?;
    let file: StopwordFile = toml::from_str(&content)
        .with_context(|| format!("parsing stopwords from {}", path.display()))?;
    Ok(file
        .words
        .into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn stopword_file_parses_and_normalizes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stopwords.toml");
        fs::write(&path, r#"words = [" The ", "Very", "", "week"]"#).unwrap();
        let words = load_stopwords_from(&path).unwrap();
        assert!(words.contains("the"));
        assert!(words.contains("week"));
        assert_eq!(words.len(), 3);
    }

    #[test]
    fn theme_file_parses() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("themes.toml");
        fs::write(&path, "[themes]\n\"Edge AI\" = [\"edge\"]\n").unwrap();
        let map = load_theme_map_from(&path).unwrap();
        assert_eq!(map.theme_for("edge"), Some("Edge AI"));
    }

    #[serial_test::serial]
    #[test]
    fn from_env_reports_every_missing_variable() {
        for name in REQUIRED_VARS {
            std::env::remove_var(name);
        }
        let err = PipelineConfig::from_env().unwrap_err().to_string();
        assert!(err.contains("NEWS_API_KEY"));
        assert!(err.contains("SHEET_WEBHOOK_URL"));
    }

    #[serial_test::serial]
    #[test]
    fn from_env_builds_with_defaults() {
        for (name, value) in [
            ("NEWS_API_KEY", "k"),
            ("SMTP_HOST", "smtp.example.test"),
            ("SMTP_USER", "u"),
            ("SMTP_PASS", "p"),
            ("REPORT_EMAIL_FROM", "reports@example.test"),
            ("REPORT_EMAIL_RECIPIENTS", "a@example.test, b@example.test"),
            ("SHEET_WEBHOOK_URL", "https://hooks.example.test/sheet"),
        ] {
            std::env::set_var(name, value);
        }
        std::env::remove_var("TREND_DAYS_BACK");
        std::env::remove_var(ENV_THEMES_PATH);
        std::env::remove_var(ENV_STOPWORDS_PATH);

        let cfg = PipelineConfig::from_env().unwrap();
        assert_eq!(cfg.days_back, 7);
        assert_eq!(cfg.email.recipients.len(), 2);
        assert_eq!(cfg.email_retries, 1);

        for name in REQUIRED_VARS {
            std::env::remove_var(name);
        }
    }
}
