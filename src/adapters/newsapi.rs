//! NewsAPI adapter: fetch recent AI coverage for the trailing window.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::NewsFetcher;
use crate::corpus::NewsItem;

const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

pub struct NewsApiFetcher {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    source: Option<RawSource>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl NewsApiFetcher {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: NEWS_API_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Point at a different endpoint (test servers).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn map_articles(raw: Vec<RawArticle>) -> Vec<NewsItem> {
        let total = raw.len();
        let items: Vec<NewsItem> = raw
            .into_iter()
            .filter_map(|a| {
                let title = a.title.filter(|t| !t.trim().is_empty())?;
                let url = a.url.filter(|u| !u.trim().is_empty())?;
                let published_at = a.published_at?;
                Some(NewsItem {
                    title,
                    source: a
                        .source
                        .and_then(|s| s.name)
                        .unwrap_or_else(|| "unknown".to_string()),
                    url,
                    published_at,
                    description: a.description.unwrap_or_default(),
                })
            })
            .collect();
        if items.len() < total {
            tracing::debug!(dropped = total - items.len(), "skipped incomplete articles");
        }
        items
    }
}

#[async_trait]
impl NewsFetcher for NewsApiFetcher {
    async fn fetch_news(
        &self,
        days_back: u32,
        query: &str,
        max_items: usize,
    ) -> Result<Vec<NewsItem>> {
        let now = Utc::now();
        let from = (now - ChronoDuration::days(days_back as i64))
            .format("%Y-%m-%d")
            .to_string();
        let to = now.format("%Y-%m-%d").to_string();
        let page_size = max_items.min(100).to_string();

        let response = self
            .client
            .get(&self.base_url)
            .timeout(self.timeout)
            .query(&[
                ("q", query),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("newsapi request")?
            .error_for_status()
            .context("newsapi http status")?;

        let body: NewsResponse = response.json().await.context("newsapi response body")?;
        if body.status != "ok" {
            return Err(anyhow!(
                "newsapi error: {}",
                body.message.unwrap_or_else(|| "unknown".to_string())
            ));
        }

        let items = Self::map_articles(body.articles);
        tracing::info!(count = items.len(), "fetched news articles");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_articles_are_skipped() {
        let raw = vec![
            RawArticle {
                title: Some("AI week".into()),
                source: Some(RawSource {
                    name: Some("Wire".into()),
                }),
                url: Some("https://example.test/1".into()),
                published_at: Some(Utc::now()),
                description: None,
            },
            RawArticle {
                title: None,
                source: None,
                url: Some("https://example.test/2".into()),
                published_at: Some(Utc::now()),
                description: Some("no title".into()),
            },
        ];
        let items = NewsApiFetcher::map_articles(raw);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "Wire");
        assert_eq!(items[0].description, "");
    }

    #[test]
    fn response_parses_newsapi_shape() {
        let json = r#"{
            "status": "ok",
            "articles": [{
                "title": "Model released",
                "source": {"name": "TechWire"},
                "url": "https://example.test/a",
                "publishedAt": "2024-05-01T10:00:00Z",
                "description": "big"
            }]
        }"#;
        let parsed: NewsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, "ok");
        assert_eq!(parsed.articles.len(), 1);
    }
}
