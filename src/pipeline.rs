//! Discovery → extraction → scoring orchestration.
//!
//! [`Pipeline::run`] discovers candidate URLs once, then extracts them with a
//! bounded number in flight (`concurrency`). Each URL gets exactly one
//! attempt. Results are collected by the single stream consumer, so the
//! accumulator needs no lock.
//!
//! Per-URL failures are logged and recorded in the [`RunReport`]; only a
//! failed discovery aborts the run. Dropping the future returned by `run`
//! cancels in-flight extractions and emits nothing.

use crate::config::ScraperConfig;
use crate::error::{ExtractError, PipelineError};
use crate::models::{ArticleRecord, Category};
use crate::render::Renderer;
use crate::scoring::Analyzer;
use crate::scrapers::article::ArticleExtractor;
use crate::scrapers::discover::discover;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A candidate URL that produced no record because of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUrl {
    pub url: String,
    /// Error class: `fetch`, `malformed_page` or `scorer`.
    pub kind: &'static str,
    pub reason: String,
}

/// Counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub discovered: usize,
    pub extracted: usize,
    /// URLs dropped by the pattern or the category gate.
    pub filtered: usize,
    pub skipped: Vec<SkippedUrl>,
}

impl RunReport {
    /// Skipped URLs per error class, sorted by class.
    pub fn skipped_by_kind(&self) -> Vec<(&'static str, usize)> {
        self.skipped
            .iter()
            .counts_by(|s| s.kind)
            .into_iter()
            .sorted()
            .collect()
    }

    pub fn log_summary(&self) {
        info!(
            discovered = self.discovered,
            extracted = self.extracted,
            filtered = self.filtered,
            skipped = self.skipped.len(),
            by_reason = %self
                .skipped_by_kind()
                .iter()
                .map(|(kind, n)| format!("{kind}={n}"))
                .join(", "),
            "Run summary"
        );
        for skip in &self.skipped {
            warn!(url = %skip.url, kind = skip.kind, reason = %skip.reason, "Skipped URL");
        }
    }
}

/// Records plus the report describing how they were obtained.
#[derive(Debug)]
pub struct RunOutput {
    pub records: Vec<ArticleRecord>,
    pub report: RunReport,
}

impl RunOutput {
    /// The records to hand to the output sink.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoResults`] when the run produced no record at all,
    /// whether every URL was filtered, skipped, or none was discovered.
    pub fn into_records(self) -> Result<Vec<ArticleRecord>, PipelineError> {
        if self.records.is_empty() {
            return Err(PipelineError::NoResults {
                discovered: self.report.discovered,
            });
        }
        Ok(self.records)
    }
}

enum Outcome {
    Extracted(Box<ArticleRecord>),
    Filtered,
    Skipped(SkippedUrl),
}

/// The scraping pipeline for one site.
pub struct Pipeline {
    config: Arc<ScraperConfig>,
    renderer: Arc<dyn Renderer>,
    extractor: ArticleExtractor,
    pattern: Option<Regex>,
}

impl Pipeline {
    pub fn new(
        config: Arc<ScraperConfig>,
        renderer: Arc<dyn Renderer>,
        analyzer: Analyzer,
    ) -> Result<Self, PipelineError> {
        let pattern = config.url_pattern()?;
        let extractor = ArticleExtractor::new(
            Arc::clone(&renderer),
            analyzer,
            pattern.clone(),
            config.site.news_type_container.clone(),
            config.scoring.retention_days,
        );
        Ok(Self {
            config,
            renderer,
            extractor,
            pattern,
        })
    }

    /// Scrape the listing page of `category` and every article on it.
    ///
    /// # Arguments
    ///
    /// * `category` - Category whose listing page is scraped and whose display
    ///   name every kept article must carry
    ///
    /// # Returns
    ///
    /// A [`RunOutput`] with the extracted records in completion order and a
    /// [`RunReport`] of discovered, extracted, filtered and skipped URLs. An
    /// empty record list is not an error here; see [`RunOutput::into_records`].
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let output = pipeline.run(&category).await?;
    /// output.report.log_summary();
    /// let records = output.into_records()?;
    /// ```
    ///
    /// # Errors
    ///
    /// [`PipelineError::Discovery`] when the listing page cannot be rendered.
    /// Individual article failures never fail the run.
    #[instrument(level = "info", skip_all, fields(category = %category.slug))]
    pub async fn run(&self, category: &Category) -> Result<RunOutput, PipelineError> {
        let t0 = Instant::now();
        let listing_url = self.config.listing_url(category);
        let urls = discover(self.renderer.as_ref(), &listing_url, self.pattern.as_ref())
            .await
            .map_err(PipelineError::Discovery)?;

        let mut report = RunReport {
            discovered: urls.len(),
            ..RunReport::default()
        };
        let concurrency = self.config.concurrency.max(1);
        info!(count = urls.len(), concurrency, "Starting article extraction");

        let outcomes: Vec<Outcome> = stream::iter(urls)
            .map(|url| async move {
                match self.extractor.extract(&url, category, Utc::now()).await {
                    Ok(Some(record)) => Outcome::Extracted(Box::new(record)),
                    Ok(None) => Outcome::Filtered,
                    Err(e) => {
                        warn!(%url, kind = e.kind(), error = %e, "Skipping article");
                        Outcome::Skipped(skipped(url, &e))
                    }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut records = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Extracted(record) => records.push(*record),
                Outcome::Filtered => report.filtered += 1,
                Outcome::Skipped(skip) => report.skipped.push(skip),
            }
        }
        report.extracted = records.len();

        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Pipeline finished");
        Ok(RunOutput { records, report })
    }
}

fn skipped(url: String, err: &ExtractError) -> SkippedUrl {
    SkippedUrl {
        url,
        kind: err.kind(),
        reason: err.to_string(),
    }
}
