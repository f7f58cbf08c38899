//! Storage layer for analyzed review persistence.
//!
//! This module defines the review domain types and the [`ReviewStore`] trait
//! backed by SQLite.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

/// Sentiment classification of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(format!("Unknown sentiment: {}", s)),
        }
    }
}

/// Outcome of a review analysis, derived from the two analyzer results.
///
/// Fixed at record construction; a stored review never transitions between
/// statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Both analyzers succeeded.
    Completed,
    /// Exactly one analyzer succeeded.
    Partial,
    /// Both analyzers failed; the record is still persisted.
    Failed,
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisStatus::Completed => write!(f, "completed"),
            AnalysisStatus::Partial => write!(f, "partial"),
            AnalysisStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(AnalysisStatus::Completed),
            "partial" => Ok(AnalysisStatus::Partial),
            "failed" => Ok(AnalysisStatus::Failed),
            _ => Err(format!("Unknown analysis status: {}", s)),
        }
    }
}

/// A persisted review with its analysis results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Unique review identifier, assigned by the store.
    pub id: i64,
    /// The raw review text as submitted.
    pub review_text: String,
    /// Optional product name supplied with the review.
    pub product_name: Option<String>,
    /// Sentiment classification; absent when sentiment analysis failed.
    pub sentiment: Option<Sentiment>,
    /// Classifier confidence (0.0-1.0); absent iff sentiment is absent.
    pub sentiment_score: Option<f64>,
    /// Extracted key points, empty when extraction failed or found nothing.
    pub key_points: Vec<String>,
    /// Derived analysis outcome.
    pub analysis_status: AnalysisStatus,
    /// Failure summary; present iff the status is partial or failed.
    pub error_message: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// An analysis outcome not yet assigned an id or persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub review_text: String,
    pub product_name: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub sentiment_score: Option<f64>,
    pub key_points: Vec<String>,
    pub analysis_status: AnalysisStatus,
    pub error_message: Option<String>,
}

impl ReviewDraft {
    /// Create a fully-successful draft
    pub fn completed(
        review_text: impl Into<String>,
        sentiment: Sentiment,
        sentiment_score: f64,
        key_points: Vec<String>,
    ) -> Self {
        Self {
            review_text: review_text.into(),
            product_name: None,
            sentiment: Some(sentiment),
            sentiment_score: Some(sentiment_score.clamp(0.0, 1.0)),
            key_points,
            analysis_status: AnalysisStatus::Completed,
            error_message: None,
        }
    }

    /// Set the product name
    pub fn with_product(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = Some(product_name.into());
        self
    }
}

/// Filter and page parameters for listing reviews.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewQuery {
    /// Exact-match sentiment filter; records without a sentiment never match.
    pub sentiment: Option<Sentiment>,
    /// Number of records to skip.
    pub offset: i64,
    /// Maximum number of records to return.
    pub limit: i64,
}

/// Storage trait for review persistence.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persist a draft, assigning its id and creation timestamp. Returns the
    /// record exactly as a subsequent `get` would observe it.
    async fn create(&self, draft: &ReviewDraft) -> StorageResult<Review>;

    /// Get a review by id.
    async fn get(&self, id: i64) -> StorageResult<Option<Review>>;

    /// List reviews ordered by creation time descending, newest first,
    /// together with the total count of records matching the filter.
    async fn list(&self, query: &ReviewQuery) -> StorageResult<(Vec<Review>, i64)>;

    /// Delete a review by id. Fails with `ReviewNotFound` when the id is
    /// absent, including a repeated delete of the same id.
    async fn delete(&self, id: i64) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sentiment_display_round_trip() {
        for s in [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral] {
            assert_eq!(Sentiment::from_str(&s.to_string()).unwrap(), s);
        }
    }

    #[test]
    fn test_sentiment_from_str_rejects_unknown() {
        assert!(Sentiment::from_str("mixed").is_err());
        assert!(Sentiment::from_str("").is_err());
    }

    #[test]
    fn test_sentiment_from_str_is_case_insensitive() {
        assert_eq!(Sentiment::from_str("Positive").unwrap(), Sentiment::Positive);
        assert_eq!(Sentiment::from_str("NEGATIVE").unwrap(), Sentiment::Negative);
    }

    #[test]
    fn test_analysis_status_display_round_trip() {
        for s in [
            AnalysisStatus::Completed,
            AnalysisStatus::Partial,
            AnalysisStatus::Failed,
        ] {
            assert_eq!(AnalysisStatus::from_str(&s.to_string()).unwrap(), s);
        }
    }

    #[test]
    fn test_sentiment_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Sentiment::Positive).unwrap(),
            "\"positive\""
        );
        assert_eq!(
            serde_json::from_str::<AnalysisStatus>("\"partial\"").unwrap(),
            AnalysisStatus::Partial
        );
    }

    #[test]
    fn test_draft_completed_clamps_score() {
        let draft = ReviewDraft::completed("Great product", Sentiment::Positive, 1.7, vec![]);
        assert_eq!(draft.sentiment_score, Some(1.0));
        assert_eq!(draft.analysis_status, AnalysisStatus::Completed);
        assert!(draft.error_message.is_none());
    }
}
