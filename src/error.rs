//! Error taxonomy for the scraping pipeline.
//!
//! Errors are split by how the orchestrator treats them:
//!
//! - **Recoverable per URL**: [`FetchError`] during extraction, [`MalformedPageError`]
//!   and [`ScorerError`]. They are wrapped in [`ExtractError`], logged with the
//!   offending URL and the URL is skipped.
//! - **Fatal**: [`PipelineError`]. Discovery failures, a rendering session that
//!   cannot be established, bad configuration, output failures and the
//!   no-results condition abort the run.
//!
//! A category mismatch is not an error at all; the extractor returns `Ok(None)`.

use thiserror::Error;

/// Rendering a page failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Http { url: String, message: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("timed out after {secs}s rendering {url}")]
    Timeout { url: String, secs: u64 },

    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("could not build rendering client: {0}")]
    Client(String),
}

/// A page was fetched but its required metadata or structured data is unusable.
#[derive(Debug, Error)]
pub enum MalformedPageError {
    #[error("missing element matching `{0}`")]
    MissingElement(String),

    #[error("structured data is missing `{0}`")]
    MissingField(&'static str),

    #[error("structured data is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("`{field}` is not an ISO-8601 timestamp: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// The NER or sentiment collaborator failed.
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("inference request failed: {0}")]
    Request(String),

    #[error("inference service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode inference response: {0}")]
    Decode(String),

    #[error("sentiment classifier returned no labels")]
    Empty,
}

impl From<reqwest::Error> for ScorerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ScorerError::Decode(err.to_string())
        } else {
            ScorerError::Request(err.to_string())
        }
    }
}

/// Why a single candidate URL produced no record.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Malformed(#[from] MalformedPageError),

    #[error(transparent)]
    Scorer(#[from] ScorerError),
}

impl ExtractError {
    /// Short label used when tallying skipped URLs.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::Fetch(_) => "fetch",
            ExtractError::Malformed(_) => "malformed_page",
            ExtractError::Scorer(_) => "scorer",
        }
    }
}

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not establish rendering session: {0}")]
    Session(#[source] FetchError),

    #[error("listing page discovery failed: {0}")]
    Discovery(#[source] FetchError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write output to {path}: {message}")]
    Output { path: String, message: String },

    #[error("no articles were produced ({discovered} URLs discovered)")]
    NoResults { discovered: usize },
}
