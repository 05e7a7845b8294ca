//! Article page extraction.
//!
//! Turns one candidate URL into a complete [`ArticleRecord`]:
//!
//! - page `<title>`, `meta[name=description]` and `meta[name=author]` (the
//!   site-level source)
//! - the embedded `application/ld+json` block for media type, image, dates,
//!   byline and body text
//! - the news-type label (first `span` of the first link inside the
//!   configured container), which must match the requested category
//! - staleness and relevance score
//!
//! Outcomes are `Ok(Some(record))`, `Ok(None)` for expected filtering (URL not
//! matching the pattern, category mismatch) and `Err` for fetch, page or
//! scorer failures. A partially filled record is never returned.

use crate::error::{ExtractError, MalformedPageError};
use crate::models::{ArticleRecord, Category, StructuredArticle};
use crate::render::{Page, Renderer, element_text, query_one};
use crate::scoring::Analyzer;
use crate::utils::{is_old, parse_timestamp};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static AUTHOR: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"meta[name="author"]"#).unwrap());
static LD_JSON: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

/// Everything read from an article page before scoring.
#[derive(Debug, Clone)]
pub struct PageFields {
    pub title: String,
    pub meta_description: String,
    pub news_type: String,
    /// `meta[name=author]`; only required once the category gate passes.
    pub source: Option<String>,
    pub structured: StructuredArticle,
}

/// Extracts and scores article pages for one site.
#[derive(Clone)]
pub struct ArticleExtractor {
    renderer: Arc<dyn Renderer>,
    analyzer: Analyzer,
    pattern: Option<Regex>,
    news_type_container: String,
    retention_days: i64,
}

impl ArticleExtractor {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        analyzer: Analyzer,
        pattern: Option<Regex>,
        news_type_container: impl Into<String>,
        retention_days: i64,
    ) -> Self {
        Self {
            renderer,
            analyzer,
            pattern,
            news_type_container: news_type_container.into(),
            retention_days,
        }
    }

    /// Extract one article.
    ///
    /// # Arguments
    ///
    /// * `url` - Candidate article URL
    /// * `category` - Requested category; the page's news-type label must match it
    /// * `now` - Stamps `last_scraped` and is the reference for staleness
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: a complete, scored record
    /// - `Ok(None)`: the URL does not match the article pattern, or the page
    ///   belongs to another category
    ///
    /// # Errors
    ///
    /// [`ExtractError::Fetch`] when the page cannot be rendered,
    /// [`ExtractError::Malformed`] when required metadata or structured data
    /// is missing, [`ExtractError::Scorer`] when NER or sentiment fails.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// if let Some(record) = extractor.extract(&url, &category, Utc::now()).await? {
    ///     println!("{} scored {}", record.title, record.news_importance_score);
    /// }
    /// ```
    #[instrument(level = "info", skip(self, category, now), fields(category = %category.slug))]
    pub async fn extract(
        &self,
        url: &str,
        category: &Category,
        now: DateTime<Utc>,
    ) -> Result<Option<ArticleRecord>, ExtractError> {
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(url) {
                debug!(%url, "URL does not match article pattern");
                return Ok(None);
            }
        }

        let page = self.renderer.open(url).await?;
        let fields = read_page(&page, &self.news_type_container)?;

        if !category.matches_label(&fields.news_type) {
            debug!(%url, news_type = %fields.news_type, expected = %category.display_name, "Category mismatch");
            return Ok(None);
        }

        let mut record = build_record(url, fields, now, self.retention_days)?;
        let score = self.analyzer.analyze(&record.content).await?;
        record.keywords = score.keywords;
        record.international_perspective = score.international_perspective;
        record.sentiment = score.sentiment;
        record.news_importance_score = score.news_importance_score;

        info!(%url, score = record.news_importance_score, old = record.is_old, "Extracted article");
        Ok(Some(record))
    }
}

/// Read the metadata, structured data and news-type label of an article page.
pub fn read_page(page: &Page, news_type_container: &str) -> Result<PageFields, MalformedPageError> {
    let document = page.document();

    let title = document
        .select(&TITLE)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let meta_description = meta_content(&document, &DESCRIPTION)
        .ok_or_else(|| MalformedPageError::MissingElement(r#"meta[name="description"]"#.to_string()))?;
    let structured = structured_data(&document)?;
    let news_type = news_type_label(&document, news_type_container)?;
    let source = meta_content(&document, &AUTHOR);

    Ok(PageFields {
        title,
        meta_description,
        news_type,
        source,
        structured,
    })
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(|c| c.trim().to_string())
}

fn news_type_label(document: &Html, container: &str) -> Result<String, MalformedPageError> {
    let missing = || MalformedPageError::MissingElement(format!("{container} a span"));
    let container_el = query_one(document.root_element(), container).ok_or_else(missing)?;
    let link = query_one(container_el, "a").ok_or_else(missing)?;
    let span = query_one(link, "span").ok_or_else(missing)?;
    Ok(element_text(span))
}

/// Parse the first JSON-LD block into a [`StructuredArticle`].
///
/// Arrays and `@graph` wrappers are unwrapped to the first object that
/// carries `datePublished`, falling back to the first object.
fn structured_data(document: &Html) -> Result<StructuredArticle, MalformedPageError> {
    let script = document
        .select(&LD_JSON)
        .next()
        .ok_or_else(|| MalformedPageError::MissingElement(r#"script[type="application/ld+json"]"#.to_string()))?;
    let raw: String = script.text().collect();
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| MalformedPageError::InvalidJson(e.to_string()))?;

    let candidates = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("@graph") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                obj.insert("@graph".to_string(), other);
                vec![Value::Object(obj)]
            }
            None => vec![Value::Object(obj)],
        },
        _ => Vec::new(),
    };
    let chosen = candidates
        .iter()
        .position(|v| v.get("datePublished").is_some())
        .or_else(|| candidates.iter().position(Value::is_object))
        .map(|i| candidates[i].clone())
        .ok_or_else(|| MalformedPageError::InvalidJson("no JSON object in structured data".to_string()))?;

    serde_json::from_value(chosen).map_err(|e| MalformedPageError::InvalidJson(e.to_string()))
}

/// Derive an unscored record from page fields.
///
/// Scoring fields start empty and are filled in by the caller.
pub fn build_record(
    url: &str,
    fields: PageFields,
    now: DateTime<Utc>,
    retention_days: i64,
) -> Result<ArticleRecord, MalformedPageError> {
    use MalformedPageError::{InvalidTimestamp, MissingField};

    let data = fields.structured;
    let published_raw = data.datePublished.ok_or(MissingField("datePublished"))?;
    let published_date = parse_timestamp(&published_raw).ok_or(InvalidTimestamp {
        field: "datePublished",
        value: published_raw.clone(),
    })?;
    let updated_date = match data.dateModified {
        Some(raw) => Some(parse_timestamp(&raw).ok_or(InvalidTimestamp {
            field: "dateModified",
            value: raw.clone(),
        })?),
        None => None,
    };

    Ok(ArticleRecord {
        url: url.to_string(),
        title: fields.title,
        meta_description: fields.meta_description,
        news_type: fields.news_type,
        media_type: data.kind.ok_or(MissingField("@type"))?,
        image_url: data.image.and_then(|i| i.url).ok_or(MissingField("image.url"))?,
        published_date,
        updated_date,
        source: fields
            .source
            .ok_or(MissingField("meta author"))?,
        last_scraped: now,
        is_old: is_old(published_date, now, retention_days),
        views: 0,
        rating: 0,
        engagement: 0,
        author: data.author.and_then(|a| a.name).ok_or(MissingField("author.name"))?,
        content: data.description.ok_or(MissingField("description"))?,
        keywords: Vec::new(),
        international_perspective: false,
        sentiment: Default::default(),
        news_importance_score: 0.0,
    })
}
