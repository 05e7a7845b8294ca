//! Named-entity and sentiment inference collaborators.
//!
//! The scorer depends on two small traits rather than a concrete model:
//! - [`EntityRecognizer`]: text -> ordered entity mentions
//! - [`SentimentClassifier`]: text -> sentiment label
//!
//! [`HfInferenceClient`] implements both against a Hugging Face style
//! inference endpoint (`POST {endpoint}/models/{model}` with `{"inputs": ...}`).
//! It is built once at startup and shared behind an `Arc` for the whole run;
//! there is no per-call model setup.
//!
//! There is no retry: a failed call surfaces as a [`ScorerError`] and the
//! article it belonged to is skipped.

use crate::config::InferenceConfig;
use crate::error::ScorerError;
use crate::models::{EntityMention, Sentiment};
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Produces named-entity mentions in the order they occur in the text.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn infer(&self, text: &str) -> Result<Vec<EntityMention>, ScorerError>;
}

/// Classifies the overall sentiment of a text.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Sentiment, ScorerError>;
}

/// One token or grouped span from a token-classification model.
#[derive(Debug, Deserialize)]
struct NerSpan {
    word: String,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Sentiment models answer either `[[{..}]]` or `[{..}]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SentimentResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl SentimentResponse {
    fn best(self) -> Option<LabelScore> {
        let labels = match self {
            SentimentResponse::Nested(outer) => outer.into_iter().next().unwrap_or_default(),
            SentimentResponse::Flat(labels) => labels,
        };
        labels
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// HTTP client for a hosted inference service.
pub struct HfInferenceClient {
    client: reqwest::Client,
    endpoint: String,
    ner_model: String,
    sentiment_model: String,
    token: Option<String>,
}

impl std::fmt::Debug for HfInferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfInferenceClient")
            .field("endpoint", &self.endpoint)
            .field("ner_model", &self.ner_model)
            .field("sentiment_model", &self.sentiment_model)
            .finish()
    }
}

impl HfInferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, ScorerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ScorerError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            ner_model: config.ner_model.clone(),
            sentiment_model: config.sentiment_model.clone(),
            token: config.token.clone(),
        })
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.endpoint, model)
    }

    async fn post(&self, model: &str, text: &str) -> Result<String, ScorerError> {
        let t0 = Instant::now();
        let mut request = self
            .client
            .post(self.model_url(model))
            .json(&serde_json::json!({ "inputs": text }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(%model, status = status.as_u16(), body = %truncate_for_log(&body, 300), "Inference call failed");
            return Err(ScorerError::Status {
                status: status.as_u16(),
                message: truncate_for_log(&body, 300),
            });
        }
        debug!(%model, elapsed_ms = t0.elapsed().as_millis() as u64, "Inference call succeeded");
        Ok(body)
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ScorerError> {
    serde_json::from_str(body)
        .map_err(|e| ScorerError::Decode(format!("{e}: {}", truncate_for_log(body, 200))))
}

fn parse_entities(body: &str) -> Result<Vec<EntityMention>, ScorerError> {
    let spans: Vec<NerSpan> = decode(body)?;
    Ok(spans.into_iter().map(|s| EntityMention::new(s.word)).collect())
}

fn parse_sentiment(body: &str) -> Result<Sentiment, ScorerError> {
    let response: SentimentResponse = decode(body)?;
    let best = response.best().ok_or(ScorerError::Empty)?;
    Ok(Sentiment::from_label(&best.label))
}

#[async_trait]
impl EntityRecognizer for HfInferenceClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.ner_model))]
    async fn infer(&self, text: &str) -> Result<Vec<EntityMention>, ScorerError> {
        let body = self.post(&self.ner_model, text).await?;
        parse_entities(&body)
    }
}

#[async_trait]
impl SentimentClassifier for HfInferenceClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.sentiment_model))]
    async fn classify(&self, text: &str) -> Result<Sentiment, ScorerError> {
        let body = self.post(&self.sentiment_model, text).await?;
        parse_sentiment(&body)
    }
}
