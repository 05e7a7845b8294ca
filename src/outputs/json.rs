//! JSON output of scraped articles.
//!
//! The records are written as a single JSON array. The file is first written
//! next to the target under a temporary name and then renamed over it, so a
//! failed run never leaves a truncated or half-written file behind.

use crate::error::PipelineError;
use crate::models::ArticleRecord;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `records` to `path` as a JSON array, all or nothing.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_articles(records: &[ArticleRecord], path: &Path) -> Result<(), PipelineError> {
    let output_err = |message: String| PipelineError::Output {
        path: path.display().to_string(),
        message,
    };

    let json = serde_json::to_string(records).map_err(|e| output_err(e.to_string()))?;
    let tmp_path = temp_path(path);

    if let Err(e) = fs::write(&tmp_path, json).await {
        error!(tmp = %tmp_path.display(), error = %e, "Failed to write temporary JSON file");
        let _ = fs::remove_file(&tmp_path).await;
        return Err(output_err(e.to_string()));
    }
    if let Err(e) = fs::rename(&tmp_path, path).await {
        error!(error = %e, "Failed to move JSON file into place");
        let _ = fs::remove_file(&tmp_path).await;
        return Err(output_err(e.to_string()));
    }

    info!("Wrote JSON file");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data.json".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;
    use chrono::{TimeZone, Utc};

    fn record(url: &str) -> ArticleRecord {
        let published = Utc.with_ymd_and_hms(2024, 1, 9, 4, 30, 0).unwrap();
        ArticleRecord {
            url: url.to_string(),
            title: "Title".to_string(),
            meta_description: "Description".to_string(),
            news_type: "POLITICS".to_string(),
            media_type: "NewsArticle".to_string(),
            image_url: "https://example.com/a.jpg".to_string(),
            published_date: published.fixed_offset(),
            updated_date: Some(published.fixed_offset()),
            source: "Somoy News".to_string(),
            last_scraped: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
            is_old: false,
            views: 0,
            rating: 0,
            engagement: 0,
            author: "Desk".to_string(),
            content: "Bangladesh".to_string(),
            keywords: vec!["Bangladesh".to_string()],
            international_perspective: false,
            sentiment: Sentiment::Neutral,
            news_importance_score: 2.0,
        }
    }

    #[tokio::test]
    async fn test_write_articles_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let records = vec![record("https://example.com/1"), record("https://example.com/2")];

        write_articles(&records, &path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let back: Vec<ArticleRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, records);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_articles_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "stale").unwrap();

        write_articles(&[], &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_write_articles_missing_dir_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("data.json");

        let err = write_articles(&[record("u")], &path).await.unwrap_err();
        assert!(matches!(err, PipelineError::Output { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/data/out/data.json"));
        assert_eq!(tmp.parent(), Some(Path::new("/data/out")));
        assert!(tmp.file_name().unwrap().to_string_lossy().starts_with(".data.json."));
    }
}
