//! Relevance scoring.
//!
//! [`Scorer`] turns entity mentions and a sentiment label into a
//! [`ScoreResult`]:
//!
//! 1. `keywords` are the surface texts of every mention, in model order,
//!    repeats included.
//! 2. A mention is a country mention when its text contains any configured
//!    country name as a substring. Mentions containing the home country are
//!    tallied separately from the other country mentions.
//! 3. `international_perspective` holds when there is at least one home
//!    country mention and more than one country mention overall.
//! 4. Without a home country mention the importance score is 0. Otherwise
//!    `home * 2 + other`, times 1.1 for positive or 0.9 for negative
//!    sentiment, rounded half away from zero to two decimals.
//!
//! Substring matching means "North America" counts as a mention of
//! "America". That is kept for compatibility with existing scores.
//!
//! [`Analyzer`] wires the scorer to the inference collaborators.

use crate::api::{EntityRecognizer, SentimentClassifier};
use crate::config::ScoringConfig;
use crate::error::ScorerError;
use crate::models::{EntityMention, ScoreResult, Sentiment};
use crate::utils::round_score;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Country mention tallies for one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountryTally {
    pub home: usize,
    pub other: usize,
}

impl CountryTally {
    pub fn total(&self) -> usize {
        self.home + self.other
    }
}

/// Computes [`ScoreResult`]s from entity mentions.
#[derive(Debug, Clone)]
pub struct Scorer {
    home_country: String,
    countries: Vec<String>,
}

impl Scorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            home_country: config.home_country.clone(),
            countries: config.countries.clone(),
        }
    }

    /// Mark each mention whose text contains a known country name.
    pub fn tag_countries(&self, entities: &mut [EntityMention]) {
        for entity in entities.iter_mut() {
            entity.is_country = self
                .countries
                .iter()
                .any(|country| entity.text.contains(country.as_str()));
        }
    }

    pub fn tally(&self, entities: &[EntityMention]) -> CountryTally {
        entities
            .iter()
            .filter(|e| e.is_country)
            .fold(CountryTally::default(), |mut tally, e| {
                if e.text.contains(self.home_country.as_str()) {
                    tally.home += 1;
                } else {
                    tally.other += 1;
                }
                tally
            })
    }

    /// Score an article from its (untagged) entity mentions and sentiment.
    ///
    /// # Arguments
    ///
    /// * `entities` - Mentions in the order the NER model returned them
    /// * `sentiment` - Classification of the full article text
    ///
    /// # Returns
    ///
    /// A [`ScoreResult`] whose keywords keep every mention, repeats included.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mentions = ["Bangladesh", "Bangladesh", "India"].map(EntityMention::new).to_vec();
    /// let result = scorer.score(mentions, Sentiment::Positive);
    /// assert_eq!(result.news_importance_score, 5.5); // (2 * 2 + 1) * 1.1
    /// assert!(result.international_perspective);
    /// ```
    pub fn score(&self, mut entities: Vec<EntityMention>, sentiment: Sentiment) -> ScoreResult {
        self.tag_countries(&mut entities);
        let tally = self.tally(&entities);
        let result = ScoreResult {
            international_perspective: tally.home > 0 && tally.total() > 1,
            news_importance_score: importance(tally, sentiment),
            sentiment,
            keywords: entities.into_iter().map(|e| e.text).collect(),
        };
        debug!(?tally, ?sentiment, score = result.news_importance_score, "Scored article");
        result
    }
}

/// Importance score for a tally and sentiment, rounded to two decimals.
pub fn importance(tally: CountryTally, sentiment: Sentiment) -> f64 {
    if tally.home == 0 {
        return 0.0;
    }
    let raw = (tally.home * 2 + tally.other) as f64;
    round_score(raw * sentiment.weight())
}

/// Runs NER and sentiment over an article and scores it.
///
/// Holds the process-wide inference collaborators; clone freely.
#[derive(Clone)]
pub struct Analyzer {
    scorer: Scorer,
    recognizer: Arc<dyn EntityRecognizer>,
    classifier: Arc<dyn SentimentClassifier>,
}

impl Analyzer {
    pub fn new(
        scorer: Scorer,
        recognizer: Arc<dyn EntityRecognizer>,
        classifier: Arc<dyn SentimentClassifier>,
    ) -> Self {
        Self {
            scorer,
            recognizer,
            classifier,
        }
    }

    #[instrument(level = "debug", skip_all, fields(bytes = text.len()))]
    pub async fn analyze(&self, text: &str) -> Result<ScoreResult, ScorerError> {
        let entities = self.recognizer.infer(text).await?;
        let sentiment = self.classifier.classify(text).await?;
        Ok(self.scorer.score(entities, sentiment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn scorer() -> Scorer {
        Scorer::new(&ScoringConfig::default())
    }

    fn mentions(words: &[&str]) -> Vec<EntityMention> {
        words.iter().map(|w| EntityMention::new(*w)).collect()
    }

    #[test]
    fn test_importance_positive() {
        let tally = CountryTally { home: 2, other: 1 };
        assert_eq!(importance(tally, Sentiment::Positive), 5.5);
    }

    #[test]
    fn test_importance_negative() {
        let tally = CountryTally { home: 2, other: 1 };
        assert_eq!(importance(tally, Sentiment::Negative), 4.5);
    }

    #[test]
    fn test_importance_neutral_unchanged() {
        let tally = CountryTally { home: 1, other: 3 };
        assert_eq!(importance(tally, Sentiment::Neutral), 5.0);
    }

    #[test]
    fn test_importance_zero_without_home_country() {
        let tally = CountryTally { home: 0, other: 4 };
        assert_eq!(importance(tally, Sentiment::Positive), 0.0);
    }

    #[test]
    fn test_score_full_article() {
        let result = scorer().score(
            mentions(&["Bangladesh", "Dhaka", "India", "Bangladesh", "Sheikh"]),
            Sentiment::Positive,
        );
        assert_eq!(
            result.keywords,
            vec!["Bangladesh", "Dhaka", "India", "Bangladesh", "Sheikh"]
        );
        assert!(result.international_perspective);
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert_eq!(result.news_importance_score, 5.5);
    }

    #[test]
    fn test_international_perspective_requires_home_country() {
        let result = scorer().score(mentions(&["India", "China", "Japan"]), Sentiment::Neutral);
        assert!(!result.international_perspective);
        assert_eq!(result.news_importance_score, 0.0);
    }

    #[test]
    fn test_international_perspective_one_home_one_other() {
        let result = scorer().score(mentions(&["Bangladesh", "Canada"]), Sentiment::Neutral);
        assert!(result.international_perspective);
        assert_eq!(result.news_importance_score, 3.0);
    }

    #[test]
    fn test_repeated_home_mentions_are_international() {
        // two mentions overall, both Bangladesh
        let result = scorer().score(mentions(&["Bangladesh", "Bangladesh"]), Sentiment::Neutral);
        assert!(result.international_perspective);
        assert_eq!(result.news_importance_score, 4.0);
    }

    #[test]
    fn test_single_home_mention_is_not_international() {
        let result = scorer().score(mentions(&["Bangladesh", "Dhaka"]), Sentiment::Negative);
        assert!(!result.international_perspective);
        assert_eq!(result.news_importance_score, 1.8);
    }

    #[test]
    fn test_substring_matching_over_matches() {
        let scorer = scorer();
        let mut entities = mentions(&["North America", "UKRAINE", "Bangladeshi"]);
        scorer.tag_countries(&mut entities);
        assert!(entities.iter().all(|e| e.is_country));
        assert_eq!(scorer.tally(&entities), CountryTally { home: 1, other: 2 });
    }

    #[test]
    fn test_custom_country_list() {
        let config = ScoringConfig {
            countries: vec!["Bangladesh".to_string(), "Nepal".to_string()],
            ..ScoringConfig::default()
        };
        let result = Scorer::new(&config).score(mentions(&["Nepal", "Bangladesh", "India"]), Sentiment::Neutral);
        assert_eq!(result.news_importance_score, 3.0);
    }

    struct FakeRecognizer(Vec<&'static str>);

    #[async_trait]
    impl EntityRecognizer for FakeRecognizer {
        async fn infer(&self, _text: &str) -> Result<Vec<EntityMention>, ScorerError> {
            Ok(mentions(&self.0))
        }
    }

    struct FakeClassifier(Option<Sentiment>);

    #[async_trait]
    impl SentimentClassifier for FakeClassifier {
        async fn classify(&self, _text: &str) -> Result<Sentiment, ScorerError> {
            self.0.ok_or(ScorerError::Empty)
        }
    }

    #[tokio::test]
    async fn test_analyzer_combines_collaborators() {
        let analyzer = Analyzer::new(
            scorer(),
            Arc::new(FakeRecognizer(vec!["Bangladesh", "Bangladesh", "China"])),
            Arc::new(FakeClassifier(Some(Sentiment::Negative))),
        );
        let result = analyzer.analyze("text").await.unwrap();
        assert_eq!(result.news_importance_score, 4.5);
        assert_eq!(result.sentiment, Sentiment::Negative);
    }

    #[tokio::test]
    async fn test_analyzer_propagates_classifier_failure() {
        let analyzer = Analyzer::new(
            scorer(),
            Arc::new(FakeRecognizer(vec!["Bangladesh"])),
            Arc::new(FakeClassifier(None)),
        );
        assert!(matches!(analyzer.analyze("text").await, Err(ScorerError::Empty)));
    }
}
