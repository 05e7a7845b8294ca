//! Runtime configuration.
//!
//! [`ScraperConfig::default`] describes the reference deployment
//! (`en.somoynews.tv`). A YAML file can override any section; missing keys
//! fall back to the defaults, so a file containing only a `scoring.countries`
//! list is valid.
//!
//! ```yaml
//! site:
//!   base_url: https://en.somoynews.tv
//!   url_pattern: 'https://en\.somoynews\.tv/news/\d{4}-\d{2}-\d{2}/[A-Za-z0-9]+'
//! scoring:
//!   home_country: Bangladesh
//!   countries: [Bangladesh, India, Nepal]
//! concurrency: 4
//! ```

use crate::error::PipelineError;
use crate::models::Category;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Largest accepted `scoring.retention_days` (about a century).
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Site specific locations and selectors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme and host, without a trailing slash.
    pub base_url: String,
    /// Listing path template; `{slug}` is replaced with the category slug.
    pub listing_path: String,
    /// Article URL pattern, matched from the start of each candidate.
    pub url_pattern: Option<String>,
    /// CSS selector of the element holding the news-type label.
    pub news_type_container: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.somoynews.tv".to_string(),
            listing_path: "/categories/{slug}".to_string(),
            url_pattern: Some(
                r"https://en\.somoynews\.tv/news/\d{4}-\d{2}-\d{2}/[A-Za-z0-9]+".to_string(),
            ),
            news_type_container: "div#news1".to_string(),
        }
    }
}

/// Inputs of the relevance scorer and the staleness classifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Country whose mentions weigh double and gate the importance score.
    pub home_country: String,
    /// Country names matched as substrings of entity mentions.
    pub countries: Vec<String>,
    /// Articles published longer ago than this are flagged old.
    pub retention_days: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            home_country: "Bangladesh".to_string(),
            countries: [
                "Bangladesh", "America", "India", "China", "Japan", "Germany", "France", "Italy",
                "UK", "Canada",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            retention_days: crate::utils::DEFAULT_RETENTION_DAYS,
        }
    }
}

/// Where the NER and sentiment models are served.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub ner_model: String,
    pub sentiment_model: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co".to_string(),
            ner_model: "dbmdz/bert-large-cased-finetuned-conll03-english".to_string(),
            sentiment_model: "distilbert/distilbert-base-uncased-finetuned-sst-2-english"
                .to_string(),
            token: None,
            timeout_secs: 60,
        }
    }
}

/// How pages are rendered.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Browserless base URL; pages are fetched directly when unset.
    pub browserless_url: Option<String>,
    #[serde(skip_serializing)]
    pub browserless_token: Option<String>,
    /// Upper bound on a single page render. Zero means the 30 second default.
    pub timeout_secs: u64,
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            Duration::from_secs(30)
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }
}

/// Complete, immutable configuration handed to the pipeline at construction.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub site: SiteConfig,
    pub categories: Vec<Category>,
    pub scoring: ScoringConfig,
    pub inference: InferenceConfig,
    pub render: RenderConfig,
    /// Number of article pages extracted at once.
    pub concurrency: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            categories: default_categories(),
            scoring: ScoringConfig::default(),
            inference: InferenceConfig::default(),
            render: RenderConfig::default(),
            concurrency: 2,
        }
    }
}

/// Categories published by the reference site.
pub fn default_categories() -> Vec<Category> {
    [
        (1, "bangladesh", "Bangladesh"),
        (2, "politics", "Politics"),
        (3, "international", "International"),
        (4, "sports", "Sports"),
        (5, "entertainment-lifestyle", "Entertainment & Lifestyle"),
        (6, "health", "Health"),
        (7, "business", "Business"),
        (8, "jobs", "Jobs"),
        (9, "science-tech", "Science & Tech"),
        (10, "education", "Education"),
        (11, "weather", "Weather"),
        (12, "environment-and-climate-crisis", "Environment and Climate Crisis"),
        (13, "power-energy", "Power & Energy"),
    ]
    .iter()
    .map(|(id, slug, name)| Category::new(*id, slug, name))
    .collect()
}

impl ScraperConfig {
    /// Load defaults, overridden by the YAML file at `path` when given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    PipelineError::Config(format!("reading {}: {e}", path.display()))
                })?;
                let config = Self::from_yaml(&raw)?;
                info!(path = %path.display(), "Loaded configuration file");
                config
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, PipelineError> {
        serde_yaml::from_str(raw).map_err(|e| PipelineError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.categories.is_empty() {
            return Err(PipelineError::Config("no categories configured".to_string()));
        }
        if self.concurrency == 0 {
            return Err(PipelineError::Config("concurrency must be at least 1".to_string()));
        }
        if !(0..=MAX_RETENTION_DAYS).contains(&self.scoring.retention_days) {
            return Err(PipelineError::Config(format!(
                "scoring.retention_days must be between 0 and {MAX_RETENTION_DAYS}, got {}",
                self.scoring.retention_days
            )));
        }
        self.url_pattern()?;
        Ok(())
    }

    /// Resolve a category by numeric id or slug.
    pub fn category(&self, selector: &str) -> Option<&Category> {
        let selector = selector.trim();
        match selector.parse::<u32>() {
            Ok(id) => self.categories.iter().find(|c| c.id == id),
            Err(_) => self
                .categories
                .iter()
                .find(|c| c.slug.eq_ignore_ascii_case(selector)),
        }
    }

    /// URL of the listing page for `category`.
    pub fn listing_url(&self, category: &Category) -> String {
        let path = self
            .site
            .listing_path
            .replace("{slug}", &urlencoding::encode(&category.slug));
        format!("{}{}", self.site.base_url.trim_end_matches('/'), path)
    }

    /// Compile the article URL pattern, anchored at the start of the string.
    pub fn url_pattern(&self) -> Result<Option<Regex>, PipelineError> {
        self.site
            .url_pattern
            .as_deref()
            .map(|p| {
                Regex::new(&format!("^(?:{p})"))
                    .map_err(|e| PipelineError::Config(format!("url_pattern: {e}")))
            })
            .transpose()
    }
}
