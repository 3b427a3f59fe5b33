//! AIBase daily-digest adapter.
//!
//! AIBase publishes one digest article per day. The listing page links every
//! digest with a numeric id under `/daily/`; the highest id is the newest.
//! The digest's detail page supplies the title and the opening paragraphs,
//! yielding at most one Article per run.

use crate::config::Settings;
use crate::errors::SourceError;
use crate::models::Article;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

const BASE_URL: &str = "https://news.aibase.com";
const DAILY_URL: &str = "https://news.aibase.com/daily";

static BASE: Lazy<Url> = Lazy::new(|| Url::parse(BASE_URL).unwrap());
static DIGEST_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/daily/(\d+)").unwrap());

#[instrument(level = "info", skip_all)]
pub async fn fetch(_cfg: &Settings) -> Result<Vec<Article>, SourceError> {
    let listing = reqwest::get(DAILY_URL).await?.text().await?;
    let Some(link) = find_latest_digest(&listing) else {
        debug!(source = DAILY_URL, "No digest link found on listing page");
        return Ok(Vec::new());
    };

    let detail = reqwest::get(&link).await?.text().await?;
    let articles: Vec<Article> = parse_detail(&detail, &link).into_iter().collect();
    info!(count = articles.len(), source = DAILY_URL, "Indexed AIBase digest");
    Ok(articles)
}

/// Pick the newest digest link on the listing page: largest numeric id wins.
fn find_latest_digest(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let anchor = Selector::parse("a[href]").unwrap();

    let mut best: Option<(u64, String)> = None;
    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = BASE.join(href) else {
            continue;
        };
        let link = resolved.to_string();
        let Some(caps) = DIGEST_ID.captures(&link) else {
            continue;
        };
        let Ok(id) = caps[1].parse::<u64>() else {
            continue;
        };
        if best.as_ref().is_none_or(|(b, _)| id > *b) {
            best = Some((id, link));
        }
    }

    best.map(|(_, link)| link)
}

/// Title and opening paragraphs from the digest's detail page.
fn parse_detail(html: &str, link: &str) -> Option<Article> {
    let document = Html::parse_document(html);
    let h1 = Selector::parse("h1").unwrap();
    let p = Selector::parse("article p, .post-content p, p").unwrap();

    let title = document.select(&h1).next().map(|e| collect_text(&e))?;
    if title.is_empty() {
        return None;
    }

    let desc = document
        .select(&p)
        .map(|e| collect_text(&e))
        .filter(|t| !t.is_empty())
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");

    Some(Article::new(title, link, desc))
}

fn collect_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
