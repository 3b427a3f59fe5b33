//! Syft curated-digest API adapter.
//!
//! A small authenticated JSON endpoint serving hand-curated articles for a
//! given date. Missing credentials disable the source silently; a response
//! without `success` is treated as a rejection.

use crate::config::Settings;
use crate::errors::SourceError;
use crate::models::Article;
use crate::utils::today_ymd;
use serde::Deserialize;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct SyftResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    articles: Vec<SyftArticle>,
}

#[derive(Debug, Deserialize)]
struct SyftArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
}

#[instrument(level = "info", skip_all)]
pub async fn fetch(cfg: &Settings) -> Result<Vec<Article>, SourceError> {
    if cfg.syft.web_app_url.is_empty() || cfg.syft.secret_key.is_empty() {
        debug!("Syft credentials not configured; skipping");
        return Ok(Vec::new());
    }

    let date = today_ymd();
    let response = reqwest::Client::new()
        .get(&cfg.syft.web_app_url)
        .query(&[
            ("secret", cfg.syft.secret_key.as_str()),
            ("date", date.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let body: SyftResponse = response.json().await?;
    if !body.success {
        return Err(SourceError::Api(
            "digest endpoint reported failure".to_string(),
        ));
    }

    let articles: Vec<Article> = body
        .articles
        .into_iter()
        .take(cfg.limits.max_articles)
        .map(|a| Article::new(a.title, a.link, a.description))
        .collect();
    info!(count = articles.len(), "Fetched Syft digest");
    Ok(articles)
}
