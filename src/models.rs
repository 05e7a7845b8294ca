//! Data models for discovered categories, scraped articles and their scores.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Category`]: A site section the scraper is pointed at
//! - [`ArticleRecord`]: The canonical output unit, one per accepted article
//! - [`ScoreResult`]: Keywords, sentiment and importance computed from an article
//! - [`EntityMention`]: A named entity returned by the NER collaborator
//! - [`StructuredArticle`]: The JSON-LD block embedded in article pages
//!
//! Output field names are snake_case to stay compatible with previously
//! exported `data.json` files.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A news category, identified by its slug.
///
/// The display name is what the site prints in the article's news-type label,
/// and is compared case-insensitively during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Category {
    /// Numeric id used for selection on the command line.
    pub id: u32,
    /// URL slug, e.g. `"science-tech"`.
    pub slug: String,
    /// Human readable name, e.g. `"Science & Tech"`.
    pub display_name: String,
}

impl Category {
    pub fn new(id: u32, slug: &str, display_name: &str) -> Self {
        Self {
            id,
            slug: slug.to_string(),
            display_name: display_name.to_string(),
        }
    }

    /// Whether a page's news-type label belongs to this category.
    pub fn matches_label(&self, label: &str) -> bool {
        label.trim().to_lowercase() == self.display_name.trim().to_lowercase()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} ({})", self.id, self.slug, self.display_name)
    }
}

/// Sentiment label of a whole article.
///
/// Labels other than positive or negative collapse to [`Sentiment::Neutral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Map a classifier label to a sentiment.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "POSITIVE" | "POS" => Sentiment::Positive,
            "NEGATIVE" | "NEG" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    /// Multiplier applied to the raw importance score.
    pub fn weight(self) -> f64 {
        match self {
            Sentiment::Positive => 1.1,
            Sentiment::Negative => 0.9,
            Sentiment::Neutral => 1.0,
        }
    }
}

/// A named entity as returned by the NER collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMention {
    /// Literal surface text of the mention.
    pub text: String,
    /// Set by the scorer when the text contains a known country name.
    pub is_country: bool,
}

impl EntityMention {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_country: false,
        }
    }
}

/// Output of the relevance scorer, merged into an [`ArticleRecord`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreResult {
    pub keywords: Vec<String>,
    pub international_perspective: bool,
    pub sentiment: Sentiment,
    pub news_importance_score: f64,
}

/// A fully extracted and scored article.
///
/// Records are only ever constructed complete: extraction either returns a
/// record with every field populated and scored, or nothing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub news_type: String,
    pub media_type: String,
    pub image_url: String,
    pub published_date: DateTime<FixedOffset>,
    /// `None` when the page carries no `dateModified`.
    pub updated_date: Option<DateTime<FixedOffset>>,
    /// Site-level attribution from the `author` meta tag.
    pub source: String,
    pub last_scraped: DateTime<Utc>,
    #[serde(rename = "old")]
    pub is_old: bool,
    pub views: u64,
    pub rating: u64,
    pub engagement: u64,
    /// Byline from the structured data.
    pub author: String,
    pub content: String,
    pub keywords: Vec<String>,
    pub international_perspective: bool,
    pub sentiment: Sentiment,
    pub news_importance_score: f64,
}

/// The `image` object of the JSON-LD block.
#[derive(Debug, Clone, Deserialize)]
pub struct StructuredImage {
    pub url: Option<String>,
}

/// The `author` object of the JSON-LD block.
#[derive(Debug, Clone, Deserialize)]
pub struct StructuredAuthor {
    pub name: Option<String>,
}

/// The JSON-LD (`application/ld+json`) description of an article page.
///
/// Every field is optional here; the extractor decides which ones are required
/// and reports the first missing one.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize)]
pub struct StructuredArticle {
    #[serde(rename = "@type")]
    pub kind: Option<String>,
    pub image: Option<StructuredImage>,
    pub datePublished: Option<String>,
    pub dateModified: Option<String>,
    pub author: Option<StructuredAuthor>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> ArticleRecord {
        let offset = FixedOffset::east_opt(6 * 3600).unwrap();
        ArticleRecord {
            url: "https://en.somoynews.tv/news/2024-01-09/abc123".to_string(),
            title: "Dhaka hosts regional summit".to_string(),
            meta_description: "Leaders meet in Dhaka".to_string(),
            news_type: "BANGLADESH".to_string(),
            media_type: "NewsArticle".to_string(),
            image_url: "https://en.somoynews.tv/img/abc123.jpg".to_string(),
            published_date: offset.with_ymd_and_hms(2024, 1, 9, 10, 30, 0).unwrap(),
            updated_date: None,
            source: "Somoy News".to_string(),
            last_scraped: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
            is_old: false,
            views: 0,
            rating: 0,
            engagement: 0,
            author: "Staff Reporter".to_string(),
            content: "Bangladesh and India signed an accord.".to_string(),
            keywords: vec!["Bangladesh".to_string(), "India".to_string()],
            international_perspective: true,
            sentiment: Sentiment::Positive,
            news_importance_score: 3.3,
        }
    }

    #[test]
    fn test_category_matches_label_case_insensitive() {
        let category = Category::new(9, "science-tech", "Science & Tech");
        assert!(category.matches_label("SCIENCE & TECH"));
        assert!(category.matches_label(" science & tech "));
        assert!(!category.matches_label("SPORTS"));
    }

    #[test]
    fn test_sentiment_from_label() {
        assert_eq!(Sentiment::from_label("POSITIVE"), Sentiment::Positive);
        assert_eq!(Sentiment::from_label("negative"), Sentiment::Negative);
        assert_eq!(Sentiment::from_label("NEUTRAL"), Sentiment::Neutral);
        assert_eq!(Sentiment::from_label("LABEL_1"), Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Sentiment::Negative).unwrap(), "\"NEGATIVE\"");
    }

    #[test]
    fn test_article_record_round_trip() {
        let record = sample_record();
        let json = serde_json::to_string(&vec![record.clone()]).unwrap();
        let back: Vec<ArticleRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![record]);
    }

    #[test]
    fn test_article_record_field_names() {
        let value = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(value["old"], serde_json::json!(false));
        assert_eq!(value["sentiment"], serde_json::json!("POSITIVE"));
        assert_eq!(value["updated_date"], serde_json::Value::Null);
        assert!(value.get("is_old").is_none());
    }

    #[test]
    fn test_structured_article_deserialization() {
        let json = r#"{
            "@context": "https://schema.org",
            "@type": "NewsArticle",
            "image": {"@type": "ImageObject", "url": "https://example.com/a.jpg"},
            "datePublished": "2024-01-09T10:30:00+06:00",
            "author": {"@type": "Person", "name": "Staff Reporter"},
            "description": "Body"
        }"#;
        let data: StructuredArticle = serde_json::from_str(json).unwrap();
        assert_eq!(data.kind.as_deref(), Some("NewsArticle"));
        assert_eq!(data.image.unwrap().url.as_deref(), Some("https://example.com/a.jpg"));
        assert!(data.dateModified.is_none());
    }
}
