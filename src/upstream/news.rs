// src/upstream/news.rs
//! Top-headlines client (newsapi wire format).

use anyhow::{bail, Result};
use reqwest::Client;
use serde::Deserialize;

use super::types::{Headline, HeadlineFeed};
use super::{fetch_json, record_failure};
use crate::config::AppConfig;

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    #[serde(default)]
    name: Option<String>,
}

impl From<Article> for Headline {
    fn from(a: Article) -> Self {
        Headline {
            title: a.title.unwrap_or_default(),
            url: a.url.unwrap_or_default(),
            source: a.source.and_then(|s| s.name).unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct NewsClient {
    http: Client,
    url: String,
    api_key: String,
    category: String,
    language: String,
}

impl NewsClient {
    pub fn new(http: Client, cfg: &AppConfig) -> Self {
        Self {
            http,
            url: cfg.upstream.news_url.clone(),
            api_key: cfg.secrets.news_api_key.clone(),
            category: cfg.news.category.clone(),
            language: cfg.news.language.clone(),
        }
    }

    /// At most `limit` headlines, in upstream order.
    pub async fn try_top_headlines(
        &self,
        category: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<Headline>> {
        let req = self.http.get(&self.url).query(&[
            ("category", category),
            ("language", language),
            ("apiKey", self.api_key.as_str()),
        ]);
        let body: HeadlinesResponse = fetch_json(req, "headlines").await?;
        if body.status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("error")) {
            bail!(
                "headlines: provider reported error ({})",
                body.message.as_deref().unwrap_or("unknown")
            );
        }
        Ok(body
            .articles
            .into_iter()
            .take(limit)
            .map(Headline::from)
            .collect())
    }

    /// Empty on any upstream problem.
    pub async fn top_headlines(
        &self,
        category: &str,
        language: &str,
        limit: usize,
    ) -> Vec<Headline> {
        match self.try_top_headlines(category, language, limit).await {
            Ok(v) => v,
            Err(e) => {
                record_failure("news", &e);
                Vec::new()
            }
        }
    }

    pub fn default_category(&self) -> &str {
        &self.category
    }

    pub fn default_language(&self) -> &str {
        &self.language
    }
}

#[async_trait::async_trait]
impl HeadlineFeed for NewsClient {
    async fn latest_headline(&self) -> Result<Option<String>> {
        let top = self
            .try_top_headlines(&self.category, &self.language, 1)
            .await?;
        Ok(top.into_iter().next().map(|h| h.title))
    }
}
