//! Utility functions for timestamps, staleness, rounding and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - ISO-8601 parsing that treats offset-less timestamps as UTC
//! - The staleness classifier deciding whether an article is "old"
//! - Importance score rounding
//! - String truncation for logging
//! - File system validation for the output location

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Default retention window for [`is_old`], in days.
pub const DEFAULT_RETENTION_DAYS: i64 = 3;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp.
///
/// Timestamps carrying an offset keep it. Timestamps without one are read as
/// UTC, and a bare date is midnight UTC. Returns `None` for anything else.
///
/// # Examples
///
/// ```ignore
/// assert!(parse_timestamp("2024-01-09T10:30:00+06:00").is_some());
/// assert!(parse_timestamp("2024-01-09T10:30:00").is_some());
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    // "+0600" style offsets are not RFC 3339 but are valid ISO-8601
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt);
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some(naive.and_utc().fixed_offset())
}

/// Decide whether an article is older than the retention window.
///
/// Returns `true` iff `published_at < now - retention_days`. Pure; callers
/// pass `now` explicitly so the result never depends on the wall clock.
///
/// A window reaching past the representable date range marks nothing old.
pub fn is_old(
    published_at: DateTime<FixedOffset>,
    now: DateTime<Utc>,
    retention_days: i64,
) -> bool {
    TimeDelta::try_days(retention_days)
        .and_then(|window| now.checked_sub_signed(window))
        .is_some_and(|cutoff| published_at.with_timezone(&Utc) < cutoff)
}

/// Round an importance score to two decimal places, half away from zero.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(round_score(5.500000000000001), 5.5);
/// assert_eq!(round_score(0.125), 0.13);
/// ```
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a char boundary)
/// with an ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure the directory that will hold `file_path` exists and is writable.
///
/// Creates the directory if needed, then creates and removes a scratch file.
/// Checked before any page is fetched so a bad output path fails fast.
#[instrument(level = "info", skip_all, fields(path = %file_path.display()))]
pub async fn ensure_writable_parent(file_path: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;
    // Try a small sync write using std fs (simpler error surface)
    let scratch_path = dir.join("..__write_check__");
    stdfs::File::create(&scratch_path)?;
    let _ = stdfs::remove_file(&scratch_path);
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}
