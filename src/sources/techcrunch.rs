//! TechCrunch homepage scraper.
//!
//! Headlines are linked from the homepage with dated URLs like
//! `https://techcrunch.com/2026/08/07/article-slug/`; the date baked into
//! the path is the only recency signal needed, so no per-article fetch
//! happens here.

use crate::config::Settings;
use crate::errors::SourceError;
use crate::models::Article;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{info, instrument};
use url::Url;

const BASE_URL: &str = "https://techcrunch.com";

static BASE: Lazy<Url> = Lazy::new(|| Url::parse(BASE_URL).unwrap());
static DATED_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{4})/(\d{2})/(\d{2})/").unwrap());

#[instrument(level = "info", skip_all)]
pub async fn fetch(cfg: &Settings) -> Result<Vec<Article>, SourceError> {
    let html = reqwest::get(BASE_URL).await?.text().await?;
    let today = Local::now().date_naive();
    let articles = parse_homepage(&html, today, cfg.limits.max_articles);
    info!(count = articles.len(), source = BASE_URL, "Indexed TechCrunch articles");
    Ok(articles)
}

fn parse_homepage(html: &str, today: NaiveDate, max_articles: usize) -> Vec<Article> {
    let document = Html::parse_document(html);
    let headline = Selector::parse("h2 a[href], h3 a[href]").unwrap();

    let mut seen: HashSet<String> = HashSet::new();
    let mut articles = Vec::new();

    for element in document.select(&headline) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = BASE.join(href) else {
            continue;
        };
        let link = resolved.to_string();
        let title = element.text().collect::<Vec<_>>().join(" ").trim().to_string();

        if title.chars().count() < 10 || !link.contains("techcrunch.com") {
            continue;
        }
        let Some(date) = extract_date(&link) else {
            continue;
        };
        if !is_recent(date, today) {
            continue;
        }
        if !seen.insert(link.clone()) {
            continue;
        }

        articles.push(Article::new(title, link, ""));
        if articles.len() >= max_articles {
            break;
        }
    }

    articles
}

/// Publication date from the `/YYYY/MM/DD/` URL segment.
fn extract_date(link: &str) -> Option<NaiveDate> {
    let caps = DATED_PATH.captures(link)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

/// Anything older than 48 hours is stale for a daily digest.
fn is_recent(date: NaiveDate, today: NaiveDate) -> bool {
    today.signed_duration_since(date).num_days() <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_extract_date() {
        assert_eq!(
            extract_date("https://techcrunch.com/2026/08/07/some-story/"),
            Some(date(2026, 8, 7))
        );
        assert_eq!(extract_date("https://techcrunch.com/category/ai/"), None);
    }

    #[test]
    fn test_is_recent_boundaries() {
        let today = date(2026, 8, 7);
        assert!(is_recent(date(2026, 8, 7), today));
        assert!(is_recent(date(2026, 8, 6), today));
        assert!(!is_recent(date(2026, 8, 5), today));
    }

    #[test]
    fn test_parse_homepage() {
        let html = r#"
            <html><body>
            <h2><a href="/2026/08/07/fresh-ai-story/">A fresh AI story worth reading</a></h2>
            <h3><a href="https://techcrunch.com/2026/08/06/yesterday-story/">Yesterday's story, still recent</a></h3>
            <h2><a href="/2026/08/01/old-story/">An old story from last week</a></h2>
            <h2><a href="/2026/08/07/fresh-ai-story/">A fresh AI story worth reading</a></h2>
            <h2><a href="/category/ai/">AI</a></h2>
            <h2><a href="https://elsewhere.example/2026/08/07/offsite/">A story hosted somewhere else</a></h2>
            </body></html>
        "#;
        let articles = parse_homepage(html, date(2026, 8, 7), 14);
        let links: Vec<&str> = articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://techcrunch.com/2026/08/07/fresh-ai-story/",
                "https://techcrunch.com/2026/08/06/yesterday-story/",
            ]
        );
    }

    #[test]
    fn test_parse_homepage_honors_cap() {
        let html = r#"
            <h2><a href="/2026/08/07/story-one/">The first headline of the day</a></h2>
            <h2><a href="/2026/08/07/story-two/">The second headline of the day</a></h2>
            <h2><a href="/2026/08/07/story-three/">The third headline of the day</a></h2>
        "#;
        let articles = parse_homepage(html, date(2026, 8, 7), 2);
        assert_eq!(articles.len(), 2);
    }
}
