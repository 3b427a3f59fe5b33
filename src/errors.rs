//! Error taxonomy for the pipeline.
//!
//! Three tiers, matching how far a failure is allowed to travel:
//!
//! - [`SourceError`]: per-adapter failures. Caught at the fetch join and
//!   degraded to an empty article list plus a warning; never fatal.
//! - [`SummarizeError`]: a live summarization call that could not complete.
//!   Fatal to live mode; the orchestrator decides whether to downgrade to
//!   the offline formatter.
//! - [`PipelineError`]: unrecoverable conditions. Reported by `main` and
//!   mapped to a non-zero exit code.
//!
//! [`DocumentError`] sits apart: a single unreadable report document is
//! skipped during the site build without aborting it.

use thiserror::Error;

/// A source adapter failed. Isolated at the fetch join; degrades the
/// article count, never the run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse failed: {0}")]
    Feed(String),

    #[error("api response rejected: {0}")]
    Api(String),

    #[error("fetch timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// A live summarization call failed. Terminal for that invocation; the
/// engine never retries on its own.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarization endpoint rejected the credential: {0}")]
    Auth(String),

    #[error("summarization call failed: {0}")]
    Remote(String),
}

/// One report document could not be turned into a [`crate::site::SiteDocument`].
/// The site build skips the document with a warning.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unreadable: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("not valid UTF-8")]
    Encoding,

    #[error("metadata block is not terminated")]
    UnterminatedMetadata,

    #[error("metadata line {0:?} is not `key: value`")]
    MalformedMetadata(String),
}

/// Unrecoverable failures surfaced to `main`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no source produced any articles")]
    NoArticles,

    #[error("no snapshot found for {date}; run `fetch` first")]
    NoSnapshot { date: String },

    #[error("site build produced zero documents")]
    EmptySite,

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}
