//! Utility functions for calendar dates, string truncation, and file system
//! preflight checks.

use chrono::Local;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Today's date in `YYYY-MM-DD`, local time.
///
/// Every per-day artifact (snapshot, report, rendered page) is keyed by this
/// string, so re-running on the same calendar day overwrites rather than
/// duplicates.
pub fn today_ymd() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Hard-truncate a string to at most `max` characters.
///
/// Cuts on a character boundary with no reflow and no ellipsis; multi-byte
/// input is never split mid-character.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and byte count
/// indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let head = truncate_chars(s, max);
    let dropped = s.len() - head.len();
    format!("{}…(+{} bytes)", head, dropped)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file. Called before the
/// pipeline does any network work, so a read-only output location fails the
/// run up front.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), std::io::Error> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_string() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_chars_cuts_at_limit() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        // 4 characters, 12 bytes; a byte-based cut at 5 would split mid-character
        assert_eq!(truncate_chars("日本語だ", 2), "日本");
        assert_eq!(truncate_chars("日本語だ", 10), "日本語だ");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b").display().to_string();
        ensure_writable_dir(&nested).await.unwrap();
        assert!(std::path::Path::new(&nested).is_dir());
    }
}
