//! Core data types shared across the pipeline.
//!
//! - [`Article`]: one fetched news item, immutable once fetched
//! - [`DailySnapshot`]: the persisted JSON artifact for one calendar day
//!
//! Both types tolerate partially populated records: every string field
//! defaults to empty on deserialization rather than failing.

use serde::{Deserialize, Serialize};

/// One fetched news item.
///
/// Identity for deduplication purposes is derived from `link` (exact match)
/// and `title` (fuzzy match); `desc` is carried along untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub desc: String,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        desc: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            desc: desc.into(),
        }
    }
}

/// The deduplicated article set for one calendar day, as persisted to
/// `data/<date>.json`. Article order is first-seen order across sources and
/// is preserved through serialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DailySnapshot {
    pub date: String,
    #[serde(default)]
    pub articles: Vec<Article>,
}
