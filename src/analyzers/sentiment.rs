use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::{sentiment_from_label, SentimentAnalyzer, SentimentScore};
use crate::config::ProviderConfig;
use crate::error::{AnalyzerError, AnalyzerResult};

/// Classifier input longer than this is truncated before the upstream call.
const MAX_CLASSIFIER_INPUT: usize = 4000;

/// Floor for the warm-up probe timeout. Loading a model on the inference
/// backend can take minutes on a cold start.
const WARMUP_TIMEOUT_MS: u64 = 120_000;

/// Short input used to force model loading before the first real request.
const WARMUP_PROBE: &str = "ok";

/// Sentiment classifier backed by the Hugging Face Inference API.
pub struct HuggingFaceSentiment {
    client: Client,
    model_url: String,
    api_key: Option<String>,
    config: ProviderConfig,
    ready: OnceCell<()>,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
    options: ClassifyOptions,
}

#[derive(Serialize)]
struct ClassifyOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// The inference API nests candidates one level deeper for single inputs;
/// some deployments return a flat list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassifyResponse {
    fn into_candidates(self) -> Vec<LabelScore> {
        match self {
            ClassifyResponse::Nested(mut nested) => {
                if nested.is_empty() {
                    Vec::new()
                } else {
                    nested.swap_remove(0)
                }
            }
            ClassifyResponse::Flat(flat) => flat,
        }
    }
}

impl HuggingFaceSentiment {
    /// Create a new classifier adapter
    pub fn new(config: &ProviderConfig) -> AnalyzerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(AnalyzerError::Http)?;

        Ok(Self {
            client,
            model_url: format!(
                "{}/models/{}",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
            config: config.clone(),
            ready: OnceCell::new(),
        })
    }

    /// One-time model warm-up, shared by all callers.
    ///
    /// Concurrent first calls serialize here; the probe is issued exactly once
    /// on the success path. A failed probe leaves the cell unset so a later
    /// call retries it.
    async fn ensure_ready(&self) -> AnalyzerResult<()> {
        self.ready
            .get_or_try_init(|| async {
                info!(url = %self.model_url, "Warming up sentiment model");
                let start = Instant::now();

                let timeout = self.config.timeout_ms.max(WARMUP_TIMEOUT_MS);
                let request = ClassifyRequest {
                    inputs: WARMUP_PROBE,
                    options: ClassifyOptions {
                        wait_for_model: true,
                    },
                };

                let mut builder = self
                    .client
                    .post(&self.model_url)
                    .timeout(Duration::from_millis(timeout))
                    .json(&request);
                if let Some(key) = &self.api_key {
                    builder = builder.header("Authorization", format!("Bearer {}", key));
                }

                let response = builder.send().await.map_err(|e| {
                    if e.is_timeout() {
                        AnalyzerError::Timeout {
                            timeout_ms: timeout,
                        }
                    } else {
                        AnalyzerError::Http(e)
                    }
                })?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(AnalyzerError::Api {
                        status: status.as_u16(),
                        message: body,
                    });
                }

                info!(
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Sentiment model ready"
                );
                Ok(())
            })
            .await
            .map(|_| ())
    }

    async fn execute_request(&self, text: &str) -> AnalyzerResult<SentimentScore> {
        debug!(chars = text.len(), "Classifying review text");

        let request = ClassifyRequest {
            inputs: text,
            options: ClassifyOptions {
                wait_for_model: false,
            },
        };

        let mut builder = self.client.post(&self.model_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AnalyzerError::Timeout {
                    timeout_ms: self.config.timeout_ms,
                }
            } else {
                AnalyzerError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ClassifyResponse =
            response
                .json()
                .await
                .map_err(|e| AnalyzerError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        let top = parsed
            .into_candidates()
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| AnalyzerError::InvalidResponse {
                message: "Classifier returned no candidates".to_string(),
            })?;

        Ok(SentimentScore::new(
            sentiment_from_label(&top.label),
            top.score,
        ))
    }
}

#[async_trait::async_trait]
impl SentimentAnalyzer for HuggingFaceSentiment {
    async fn classify(&self, text: &str) -> AnalyzerResult<SentimentScore> {
        self.ensure_ready().await?;

        let truncated: String;
        let text = if text.chars().count() > MAX_CLASSIFIER_INPUT {
            truncated = text.chars().take(MAX_CLASSIFIER_INPUT).collect();
            &truncated
        } else {
            text
        };

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    retry = retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying sentiment request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(text).await {
                Ok(result) => {
                    info!(
                        sentiment = %result.sentiment,
                        score = result.score,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Sentiment classification succeeded"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    error!(
                        error = %e,
                        latency_ms = start.elapsed().as_millis() as u64,
                        retry = retries,
                        "Sentiment classification failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(AnalyzerError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }
}
