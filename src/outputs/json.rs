//! Dated JSON snapshots of the deduplicated article set.
//!
//! The snapshot is what makes partial invocation possible: `summarize` can
//! pick up where a previous `fetch` left off on the same calendar day.

use crate::errors::PipelineError;
use crate::models::DailySnapshot;
use tokio::fs;
use tracing::{info, instrument};

fn snapshot_path(data_dir: &str, date: &str) -> String {
    format!("{}/{}.json", data_dir.trim_end_matches('/'), date)
}

/// Write the day's snapshot, overwriting any earlier snapshot for the same
/// date.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir, date = %snapshot.date))]
pub async fn write_snapshot(
    data_dir: &str,
    snapshot: &DailySnapshot,
) -> Result<String, PipelineError> {
    let json = serde_json::to_string_pretty(snapshot)?;

    fs::create_dir_all(data_dir).await.map_err(|e| PipelineError::Io {
        path: data_dir.to_string(),
        source: e,
    })?;

    let path = snapshot_path(data_dir, &snapshot.date);
    fs::write(&path, json).await.map_err(|e| PipelineError::Io {
        path: path.clone(),
        source: e,
    })?;

    info!(path = %path, count = snapshot.articles.len(), "Wrote article snapshot");
    Ok(path)
}

/// Load the snapshot for `date` if one exists.
pub async fn load_snapshot(
    data_dir: &str,
    date: &str,
) -> Result<Option<DailySnapshot>, PipelineError> {
    let path = snapshot_path(data_dir, date);
    match fs::read_to_string(&path).await {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PipelineError::Io { path, source: e }),
    }
}
