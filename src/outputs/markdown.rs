//! The dated Markdown report.
//!
//! A report document is a metadata block (`---` delimited `key: value`
//! lines) followed by the body the summarization engine produced. The site
//! build later parses these documents back; nothing else reads them.

use crate::errors::PipelineError;
use tokio::fs;
use tracing::{info, instrument};

/// Render the full document: metadata block first, body after one blank
/// line, exactly one trailing newline.
pub fn render_document(date: &str, body: &str) -> String {
    format!(
        "---\ntitle: AI Daily Digest {date}\ndate: {date}\n---\n\n{}\n",
        body.trim_end()
    )
}

/// Write the day's report, overwriting any earlier report for the same date.
#[instrument(level = "info", skip_all, fields(content_dir = %content_dir, date = %date))]
pub async fn write_report(
    content_dir: &str,
    date: &str,
    body: &str,
) -> Result<String, PipelineError> {
    fs::create_dir_all(content_dir)
        .await
        .map_err(|e| PipelineError::Io {
            path: content_dir.to_string(),
            source: e,
        })?;

    let path = format!("{}/{}.md", content_dir.trim_end_matches('/'), date);
    fs::write(&path, render_document(date, body))
        .await
        .map_err(|e| PipelineError::Io {
            path: path.clone(),
            source: e,
        })?;

    info!(path = %path, "Wrote daily report");
    Ok(path)
}
