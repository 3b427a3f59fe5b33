//! # Daily Digest
//!
//! A news aggregation and summarization pipeline that fetches short items
//! from several independent sources, removes duplicates and near-duplicates,
//! turns the surviving set into a single formatted daily report, and renders
//! the report plus a browsable archive as static pages.
//!
//! ## Usage
//!
//! ```sh
//! daily_digest run            # fetch → summarize → build
//! daily_digest run --offline  # skip the remote call, format locally
//! daily_digest fetch          # write today's JSON snapshot only
//! daily_digest summarize      # report from an existing snapshot
//! daily_digest build          # regenerate the HTML site
//! daily_digest test           # probe the summarization endpoint
//! ```
//!
//! ## Architecture
//!
//! One linear pipeline:
//! 1. **Fetch**: enabled source adapters run concurrently; a failing source
//!    degrades the article count, never the run
//! 2. **Dedupe**: exact link match plus fuzzy title match, earliest seen wins
//! 3. **Snapshot**: the unique set is persisted as dated JSON
//! 4. **Summarize**: remote streaming call, or the deterministic offline
//!    formatter when no credential is present or `--offline` is given
//! 5. **Report**: the summary is persisted as a dated Markdown document
//! 6. **Build**: every report on disk is re-rendered into a static site
//!
//! Re-running on the same calendar day overwrites that day's artifacts
//! rather than creating a second report.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dedupe;
mod errors;
mod models;
mod outputs;
mod site;
mod sources;
mod summarizer;
mod utils;

use cli::{Cli, Command};
use config::Settings;
use errors::PipelineError;
use models::{Article, DailySnapshot};
use summarizer::Summarizer;
use utils::{ensure_writable_dir, today_ymd};

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();

    match dispatch(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(args: Cli) -> Result<(), PipelineError> {
    let settings = Settings::load(args.config.as_deref())?;

    match args.command {
        Command::Run { offline } => cmd_run(&settings, offline).await,
        Command::Fetch => cmd_fetch(&settings).await,
        Command::Summarize { offline } => cmd_summarize(&settings, offline).await,
        Command::Build => cmd_build(&settings).await,
        Command::Test => cmd_test(&settings).await,
    }
}

/// Full pipeline for one calendar day.
async fn cmd_run(cfg: &Settings, offline: bool) -> Result<(), PipelineError> {
    let start_time = std::time::Instant::now();
    let date = today_ymd();
    info!(%date, "Starting full pipeline");

    // Early check: every output location must be writable before any
    // network work happens
    for dir in [
        &cfg.output.data_dir,
        &cfg.output.content_dir,
        &cfg.output.docs_dir,
    ] {
        ensure_writable_dir(dir).await.map_err(|e| PipelineError::Io {
            path: dir.to_string(),
            source: e,
        })?;
    }

    // ---- Fetch & dedupe ----
    let snapshot = fetch_snapshot(cfg, &date).await?;

    // ---- Summarize ----
    let (body, mode) = summarize_articles(cfg, &snapshot.articles, offline).await?;
    info!(mode, "Summary generated");

    // ---- Report ----
    outputs::markdown::write_report(&cfg.output.content_dir, &date, &body).await?;

    // ---- Site ----
    let report = site::build(cfg).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = snapshot.articles.len(),
        mode,
        documents = report.documents,
        "Pipeline complete"
    );
    Ok(())
}

/// Fetch-only mode: everything up to and including the JSON snapshot.
async fn cmd_fetch(cfg: &Settings) -> Result<(), PipelineError> {
    let date = today_ymd();
    info!(%date, "Fetching articles");
    let snapshot = fetch_snapshot(cfg, &date).await?;
    info!(count = snapshot.articles.len(), "Fetch completed");
    Ok(())
}

/// Summarize-only mode: pick up the snapshot a previous run left behind.
async fn cmd_summarize(cfg: &Settings, offline: bool) -> Result<(), PipelineError> {
    let date = today_ymd();
    let snapshot = outputs::json::load_snapshot(&cfg.output.data_dir, &date)
        .await?
        .ok_or_else(|| PipelineError::NoSnapshot { date: date.clone() })?;
    info!(count = snapshot.articles.len(), %date, "Summarizing from snapshot");

    let (body, mode) = summarize_articles(cfg, &snapshot.articles, offline).await?;
    info!(mode, "Summary generated");

    outputs::markdown::write_report(&cfg.output.content_dir, &date, &body).await?;
    Ok(())
}

/// Build-only mode: regenerate the site from whatever reports exist.
async fn cmd_build(cfg: &Settings) -> Result<(), PipelineError> {
    let report = site::build(cfg).await?;
    info!(documents = report.documents, skipped = report.skipped, "Build completed");
    Ok(())
}

/// Probe the summarization endpoint and print the model's reply.
async fn cmd_test(cfg: &Settings) -> Result<(), PipelineError> {
    if cfg.api.key.is_empty() {
        return Err(errors::SummarizeError::Auth(
            "no credential configured; set DIGEST_API_KEY".to_string(),
        )
        .into());
    }

    let engine = Summarizer::new(cfg)?;
    let reply = engine.test_connection().await?;
    info!(model = %cfg.api.model, "Endpoint reachable");
    println!("{reply}");
    Ok(())
}

/// Fetch from all enabled sources, dedupe, cap, and persist the snapshot.
async fn fetch_snapshot(cfg: &Settings, date: &str) -> Result<DailySnapshot, PipelineError> {
    let fetched = sources::fetch_all(cfg).await;
    info!(count = fetched.len(), "Fetched articles across sources");
    if fetched.is_empty() {
        return Err(PipelineError::NoArticles);
    }

    // dedupe sees the complete merged set; the cap applies only after it
    let mut articles = dedupe::dedupe(fetched, cfg.limits.similarity_threshold);
    info!(count = articles.len(), "Articles after deduplication");
    if articles.len() > cfg.limits.max_articles {
        warn!(
            count = articles.len(),
            max = cfg.limits.max_articles,
            "Capping article set"
        );
        articles.truncate(cfg.limits.max_articles);
    }

    let snapshot = DailySnapshot {
        date: date.to_string(),
        articles,
    };
    outputs::json::write_snapshot(&cfg.output.data_dir, &snapshot).await?;
    Ok(snapshot)
}

/// Summarization mode selection: live only when a credential is present; a
/// live failure downgrades to the offline formatter only when configuration
/// allows it.
async fn summarize_articles(
    cfg: &Settings,
    articles: &[Article],
    force_offline: bool,
) -> Result<(String, &'static str), PipelineError> {
    let offline =
        || summarizer::offline_summary(articles, cfg.summarize.title_max, cfg.summarize.desc_max);

    if force_offline {
        return Ok((offline(), "offline"));
    }
    if cfg.api.key.is_empty() {
        warn!("No API credential configured; using offline formatter");
        return Ok((offline(), "offline"));
    }

    let engine = Summarizer::new(cfg)?;
    match engine.summarize_live(articles).await {
        Ok(text) => Ok((text, "live")),
        Err(e) if cfg.summarize.fallback_offline => {
            warn!(error = %e, "Live summarization failed; falling back to offline formatter");
            Ok((offline(), "offline"))
        }
        Err(e) => Err(e.into()),
    }
}
