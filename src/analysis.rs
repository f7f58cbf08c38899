//! Review analysis pipeline.
//!
//! Fans out to the sentiment classifier and the key point extractor
//! concurrently, bounds each call with its own timeout, and reconciles the
//! two outcomes into a single draft record. Analyzer failures are folded into
//! the draft's status; this module never returns an error to its caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{info, warn};

use crate::analyzers::{KeyPointExtractor, SentimentAnalyzer, SentimentScore};
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::storage::{AnalysisStatus, ReviewDraft};

/// Orchestrates the two analyzers for one review.
pub struct AnalysisOrchestrator {
    sentiment: Arc<dyn SentimentAnalyzer>,
    keypoints: Arc<dyn KeyPointExtractor>,
    sentiment_timeout: Duration,
    keypoints_timeout: Duration,
}

impl AnalysisOrchestrator {
    /// Create a new orchestrator over the given analyzers.
    ///
    /// The timeouts are independent per-call budgets; neither bounds the
    /// other, and both come from configuration.
    pub fn new(
        sentiment: Arc<dyn SentimentAnalyzer>,
        keypoints: Arc<dyn KeyPointExtractor>,
        sentiment_timeout: Duration,
        keypoints_timeout: Duration,
    ) -> Self {
        Self {
            sentiment,
            keypoints,
            sentiment_timeout,
            keypoints_timeout,
        }
    }

    /// Analyze one review into an unsaved draft.
    ///
    /// Both analyzer calls run concurrently and are awaited jointly; a slow
    /// or failed side never cancels the other. Always returns a draft - an
    /// incomplete analysis is a representable outcome, not an error.
    pub async fn analyze(&self, review_text: &str, product_name: Option<&str>) -> ReviewDraft {
        let start = Instant::now();

        let sentiment_fut = timeout(self.sentiment_timeout, self.sentiment.classify(review_text));
        let keypoints_fut = timeout(
            self.keypoints_timeout,
            self.keypoints.extract(review_text, product_name),
        );

        let (sentiment_out, keypoints_out) = tokio::join!(sentiment_fut, keypoints_fut);

        let sentiment_res = flatten_timeout(sentiment_out, self.sentiment_timeout);
        let keypoints_res = flatten_timeout(keypoints_out, self.keypoints_timeout);

        let draft = reconcile(review_text, product_name, sentiment_res, keypoints_res);

        let latency = start.elapsed().as_millis() as u64;
        match draft.analysis_status {
            AnalysisStatus::Completed => {
                info!(latency_ms = latency, "Review analysis completed");
            }
            AnalysisStatus::Partial | AnalysisStatus::Failed => {
                warn!(
                    status = %draft.analysis_status,
                    error = draft.error_message.as_deref().unwrap_or(""),
                    latency_ms = latency,
                    "Review analysis did not fully complete"
                );
            }
        }

        draft
    }
}

fn flatten_timeout<T>(
    outcome: Result<AnalyzerResult<T>, tokio::time::error::Elapsed>,
    budget: Duration,
) -> AnalyzerResult<T> {
    outcome.unwrap_or(Err(AnalyzerError::Timeout {
        timeout_ms: budget.as_millis() as u64,
    }))
}

/// Merge the two analyzer outcomes into a draft with its derived status.
fn reconcile(
    review_text: &str,
    product_name: Option<&str>,
    sentiment: AnalyzerResult<SentimentScore>,
    keypoints: AnalyzerResult<Vec<String>>,
) -> ReviewDraft {
    let (sentiment, sentiment_err) = match sentiment {
        Ok(s) => (Some(s), None),
        Err(e) => (None, Some(format!("Sentiment analysis failed: {}", e))),
    };
    let (key_points, keypoints_err) = match keypoints {
        Ok(points) => (Some(points), None),
        Err(e) => (None, Some(format!("Key point extraction failed: {}", e))),
    };

    let analysis_status = match (&sentiment, &key_points) {
        (Some(_), Some(_)) => AnalysisStatus::Completed,
        (None, None) => AnalysisStatus::Failed,
        _ => AnalysisStatus::Partial,
    };

    let error_message = match (sentiment_err, keypoints_err) {
        (None, None) => None,
        (Some(s), None) => Some(s),
        (None, Some(k)) => Some(k),
        (Some(s), Some(k)) => Some(format!("{}; {}", s, k)),
    };

    ReviewDraft {
        review_text: review_text.to_string(),
        product_name: product_name.map(|p| p.to_string()),
        sentiment: sentiment.map(|s| s.sentiment),
        sentiment_score: sentiment.map(|s| s.score),
        key_points: key_points.unwrap_or_default(),
        analysis_status,
        error_message,
    }
}
