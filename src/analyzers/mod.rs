//! Analyzer adapters for the two upstream analysis services.
//!
//! Sentiment classification and key point extraction sit behind narrow trait
//! seams so the pipeline and HTTP tests can substitute fakes.

mod keypoints;
mod sentiment;

pub use keypoints::{GeminiExtractor, HeuristicExtractor};
pub use sentiment::HuggingFaceSentiment;

use async_trait::async_trait;

use crate::error::AnalyzerResult;
use crate::storage::Sentiment;

/// Maximum number of key points returned by any extractor.
pub const MAX_KEY_POINTS: usize = 5;

/// A sentiment classification with its confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub sentiment: Sentiment,
    /// Classifier confidence in [0.0, 1.0].
    pub score: f64,
}

impl SentimentScore {
    pub fn new(sentiment: Sentiment, score: f64) -> Self {
        Self {
            sentiment,
            score: score.clamp(0.0, 1.0),
        }
    }
}

/// Sentiment classifier contract.
///
/// Input text is already validated by the gateway; implementations must not
/// re-check its length.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn classify(&self, text: &str) -> AnalyzerResult<SentimentScore>;
}

/// Key point extractor contract.
///
/// The product name, when present, biases extraction but is never required.
/// An empty result is a valid success.
#[async_trait]
pub trait KeyPointExtractor: Send + Sync {
    async fn extract(&self, text: &str, product_name: Option<&str>)
        -> AnalyzerResult<Vec<String>>;
}

/// Map a classifier label to a sentiment.
///
/// Star-rating labels (`"1 star"`..`"5 stars"`) map low/high to
/// negative/positive with 3 stars neutral; pos/neg label families cover the
/// remaining models.
pub(crate) fn sentiment_from_label(label: &str) -> Sentiment {
    let label = label.to_lowercase();

    if label.contains("1 star") || label.contains("2 star") {
        Sentiment::Negative
    } else if label.contains("4 star") || label.contains("5 star") {
        Sentiment::Positive
    } else if label.contains("3 star") {
        Sentiment::Neutral
    } else if label.contains("positive") || label == "pos" || label == "label_2" || label == "2" {
        Sentiment::Positive
    } else if label.contains("negative") || label == "neg" || label == "label_0" || label == "0" {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Clean up raw extractor output: strip bullet markers, trim, drop noise and
/// "nothing found" sentinels, deduplicate case-insensitively preserving
/// first-seen order, and cap at [`MAX_KEY_POINTS`].
pub(crate) fn normalize_key_points(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut points = Vec::new();

    for line in raw {
        let mut point = line.trim().trim_start_matches(['*', '-', '•']).trim_start();

        // Strip "1." / "2)" numbering without eating digits that start a real
        // point ("4K display").
        let digits = point.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 {
            let rest = &point[digits..];
            if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
                point = stripped;
            }
        }

        let point = point.trim().to_string();

        if point.len() <= 3 {
            continue;
        }
        if point.to_lowercase().contains("no clear key points") {
            continue;
        }
        if !seen.insert(point.to_lowercase()) {
            continue;
        }

        points.push(point);
        if points.len() >= MAX_KEY_POINTS {
            break;
        }
    }

    points
}
