//! News source adapters and the parallel fetch join.
//!
//! Each adapter is a no-argument-style async fetch returning a list of
//! `{title, link, desc}` records. Expected failure modes surface as a
//! [`SourceError`] which the join converts into an empty contribution plus
//! a logged warning; one slow or broken source never blocks or fails the
//! others.
//!
//! # Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | AIBase | [`aibase`] | Daily-digest listing page, then detail page |
//! | TechCrunch | [`techcrunch`] | Homepage headline scraping |
//! | The Verge | [`theverge`] | AI-section feed (Atom/RSS) |
//! | Syft | [`syft`] | Authenticated JSON API |
//!
//! Adapters run concurrently through an order-preserving bounded pool, so
//! the merged article set always lists sources in registry order no matter
//! which one finishes first.

pub mod aibase;
pub mod syft;
pub mod techcrunch;
pub mod theverge;

use crate::config::Settings;
use crate::errors::SourceError;
use crate::models::Article;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Upper bound on concurrently running adapters.
const FETCH_CONCURRENCY: usize = 4;

/// Per-adapter deadline. A hung source turns into an isolated failure
/// instead of stalling the join.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed identifiers for the configurable sources. The enabled-sources map
/// in the configuration is resolved against these at startup; there is no
/// runtime plugin loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceId {
    Aibase,
    Techcrunch,
    Theverge,
    Syft,
}

impl SourceId {
    pub const ALL: [SourceId; 4] = [
        SourceId::Aibase,
        SourceId::Techcrunch,
        SourceId::Theverge,
        SourceId::Syft,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::Aibase => "aibase",
            SourceId::Techcrunch => "techcrunch",
            SourceId::Theverge => "theverge",
            SourceId::Syft => "syft",
        }
    }

    pub fn from_name(name: &str) -> Option<SourceId> {
        SourceId::ALL.into_iter().find(|id| id.as_str() == name)
    }
}

async fn fetch_one(id: SourceId, cfg: &Settings) -> Result<Vec<Article>, SourceError> {
    match id {
        SourceId::Aibase => aibase::fetch(cfg).await,
        SourceId::Techcrunch => techcrunch::fetch(cfg).await,
        SourceId::Theverge => theverge::fetch(cfg).await,
        SourceId::Syft => syft::fetch(cfg).await,
    }
}

/// Resolve the enabled adapters from configuration, in registry order.
pub fn enabled_sources(cfg: &Settings) -> Vec<SourceId> {
    for name in cfg.sources.keys() {
        if SourceId::from_name(name).is_none() {
            warn!(source = %name, "Unknown source in configuration; ignoring");
        }
    }
    SourceId::ALL
        .into_iter()
        .filter(|id| cfg.sources.get(id.as_str()).copied().unwrap_or(false))
        .collect()
}

/// Fetch from every enabled source concurrently and merge the results into
/// one article set in first-seen order.
#[instrument(level = "info", skip_all)]
pub async fn fetch_all(cfg: &Settings) -> Vec<Article> {
    let enabled = enabled_sources(cfg);
    if enabled.is_empty() {
        warn!("No sources enabled in configuration");
        return Vec::new();
    }
    info!(count = enabled.len(), "Fetching from enabled sources");

    let width = enabled.len().min(FETCH_CONCURRENCY);
    let results: Vec<(SourceId, Result<Vec<Article>, SourceError>)> = stream::iter(enabled)
        .map(|id| async move {
            match tokio::time::timeout(FETCH_TIMEOUT, fetch_one(id, cfg)).await {
                Ok(result) => (id, result),
                Err(_) => (id, Err(SourceError::Timeout(FETCH_TIMEOUT))),
            }
        })
        .buffered(width)
        .collect()
        .await;

    merge_results(results)
}

/// Join per-source results. A failed source contributes nothing beyond a
/// warning; it never aborts the merge.
pub fn merge_results(results: Vec<(SourceId, Result<Vec<Article>, SourceError>)>) -> Vec<Article> {
    let mut merged = Vec::new();
    for (id, result) in results {
        match result {
            Ok(articles) => {
                info!(source = id.as_str(), count = articles.len(), "Source fetch completed");
                merged.extend(articles);
            }
            Err(e) => {
                warn!(source = id.as_str(), error = %e, "Source fetch failed; continuing without it");
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_names_roundtrip() {
        for id in SourceId::ALL {
            assert_eq!(SourceId::from_name(id.as_str()), Some(id));
        }
        assert_eq!(SourceId::from_name("mystery"), None);
    }

    #[test]
    fn test_enabled_sources_follow_registry_order() {
        let mut cfg = Settings::default();
        cfg.sources.clear();
        cfg.sources.insert("theverge".to_string(), true);
        cfg.sources.insert("aibase".to_string(), true);
        cfg.sources.insert("techcrunch".to_string(), false);

        let enabled = enabled_sources(&cfg);
        assert_eq!(enabled, vec![SourceId::Aibase, SourceId::Theverge]);
    }

    #[test]
    fn test_merge_isolates_failed_source() {
        let results = vec![
            (
                SourceId::Aibase,
                Ok(vec![Article::new("A", "https://a.example/1", "")]),
            ),
            (
                SourceId::Techcrunch,
                Err(SourceError::Api("boom".to_string())),
            ),
            (
                SourceId::Theverge,
                Ok(vec![
                    Article::new("B", "https://b.example/1", ""),
                    Article::new("C", "https://b.example/2", ""),
                ]),
            ),
        ];

        let merged = merge_results(results);
        let titles: Vec<&str> = merged.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_merge_of_all_failures_is_empty() {
        let results = vec![
            (SourceId::Aibase, Err(SourceError::Api("x".to_string()))),
            (SourceId::Syft, Err(SourceError::Feed("y".to_string()))),
        ];
        assert!(merge_results(results).is_empty());
    }
}
