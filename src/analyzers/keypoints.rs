use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::{normalize_key_points, KeyPointExtractor, MAX_KEY_POINTS};
use crate::config::ProviderConfig;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::prompts::KEY_POINT_INSTRUCTIONS;

/// Key point extractor backed by the Google Generative Language API.
pub struct GeminiExtractor {
    client: Client,
    generate_url: String,
    api_key: Option<String>,
    config: ProviderConfig,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiExtractor {
    /// Create a new extractor adapter
    pub fn new(config: &ProviderConfig) -> AnalyzerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(AnalyzerError::Http)?;

        Ok(Self {
            client,
            generate_url: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
            config: config.clone(),
        })
    }

    fn build_prompt(text: &str, product_name: Option<&str>) -> String {
        let instructions = match product_name {
            Some(name) => KEY_POINT_INSTRUCTIONS
                .replacen("product review", &format!("product review for '{}'", name), 1),
            None => KEY_POINT_INSTRUCTIONS.to_string(),
        };

        format!("{}\n\nReview: \"{}\"", instructions, text)
    }

    async fn execute_request(&self, prompt: &str) -> AnalyzerResult<String> {
        debug!(chars = prompt.len(), "Requesting key point extraction");

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let mut builder = self.client.post(&self.generate_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-goog-api-key", key);
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

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| AnalyzerError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        let completion = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .ok_or_else(|| AnalyzerError::InvalidResponse {
                message: "Generation returned no candidates".to_string(),
            })?;

        Ok(completion)
    }
}

#[async_trait::async_trait]
impl KeyPointExtractor for GeminiExtractor {
    async fn extract(
        &self,
        text: &str,
        product_name: Option<&str>,
    ) -> AnalyzerResult<Vec<String>> {
        let prompt = Self::build_prompt(text, product_name);

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
                    "Retrying key point request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&prompt).await {
                Ok(completion) => {
                    let points =
                        normalize_key_points(completion.lines().map(|l| l.to_string()));
                    info!(
                        count = points.len(),
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Key point extraction succeeded"
                    );
                    return Ok(points);
                }
                Err(e) => {
                    error!(
                        error = %e,
                        latency_ms = start.elapsed().as_millis() as u64,
                        retry = retries,
                        "Key point extraction failed"
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

/// Local keyword-scoring extractor, used when no generative API key is
/// configured. Never fails and never touches the network.
pub struct HeuristicExtractor;

const POSITIVE_KEYWORDS: &[&str] = &[
    "great", "excellent", "amazing", "love", "best", "good", "nice", "recommend", "happy",
    "perfect", "fantastic", "awesome", "wonderful", "satisfied", "worth", "fast", "quick", "easy",
    "bagus", "mantap", "suka", "puas", "keren", "recommended",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "bad", "poor", "terrible", "hate", "worst", "disappointed", "broken", "slow", "expensive",
    "waste", "horrible", "awful", "regret", "useless", "cheap", "fake", "defective", "damaged",
    "jelek", "kecewa", "rusak", "mahal", "lambat",
];

const FEATURE_KEYWORDS: &[&str] = &[
    "battery", "screen", "camera", "design", "quality", "price", "delivery", "shipping", "size",
    "color", "package", "packaging", "performance", "speed", "material", "build", "baterai",
    "layar", "kamera", "kualitas", "harga", "pengiriman",
];

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }

    fn capitalize(sentence: &str) -> String {
        let mut chars = sentence.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }

    fn extract_sync(text: &str, product_name: Option<&str>) -> Vec<String> {
        let sentences: Vec<&str> = text
            .split(['.', '!', '?'])
            .map(|s| s.trim())
            .filter(|s| s.len() > 5)
            .collect();

        // A single short sentence is its own key point.
        if sentences.len() == 1 && sentences[0].len() < 100 {
            return normalize_key_points(vec![Self::capitalize(sentences[0])]);
        }

        let product_lower = product_name.map(|p| p.to_lowercase());

        let mut scored: Vec<(&str, i32)> = sentences
            .iter()
            .map(|sentence| {
                let lower = sentence.to_lowercase();
                let mut score = 0;

                for kw in POSITIVE_KEYWORDS.iter().chain(NEGATIVE_KEYWORDS) {
                    if lower.contains(kw) {
                        score += 2;
                    }
                }
                for kw in FEATURE_KEYWORDS {
                    if lower.contains(kw) {
                        score += 1;
                    }
                }
                if let Some(product) = &product_lower {
                    if lower.contains(product.as_str()) {
                        score += 1;
                    }
                }
                if sentence.len() < 20 {
                    score -= 1;
                }

                (*sentence, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let mut picked: Vec<String> = scored
            .iter()
            .filter(|(sentence, score)| *score > 0 && sentence.len() < 300)
            .take(MAX_KEY_POINTS)
            .map(|(sentence, _)| Self::capitalize(sentence))
            .collect();

        // Nothing scored: fall back to the longest sentences, which usually
        // carry the most information.
        if picked.is_empty() {
            let mut by_len: Vec<&str> = sentences.clone();
            by_len.sort_by_key(|s| std::cmp::Reverse(s.len()));
            picked = by_len
                .into_iter()
                .filter(|s| s.len() < 300)
                .take(3)
                .map(Self::capitalize)
                .collect();
        }

        normalize_key_points(picked)
    }
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KeyPointExtractor for HeuristicExtractor {
    async fn extract(
        &self,
        text: &str,
        product_name: Option<&str>,
    ) -> AnalyzerResult<Vec<String>> {
        let points = Self::extract_sync(text, product_name);
        info!(count = points.len(), "Key points extracted heuristically");
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_product_context() {
        let prompt = GeminiExtractor::build_prompt("Solid laptop", Some("ThinkBook 14"));
        assert!(prompt.contains("for 'ThinkBook 14'"));
        assert!(prompt.contains("Review: \"Solid laptop\""));
    }

    #[test]
    fn test_prompt_without_product() {
        let prompt = GeminiExtractor::build_prompt("Solid laptop", None);
        assert!(!prompt.contains("for '"));
        assert!(prompt.contains("Review: \"Solid laptop\""));
    }

    #[test]
    fn test_heuristic_single_sentence() {
        let points = HeuristicExtractor::extract_sync("the battery lasts two full days", None);
        assert_eq!(points, vec!["The battery lasts two full days"]);
    }

    #[test]
    fn test_heuristic_picks_keyword_sentences() {
        let text = "The battery life is excellent. It rained on Tuesday. \
                    Shipping was fast and the packaging was intact.";
        let points = HeuristicExtractor::extract_sync(text, None);

        assert!(points.iter().any(|p| p.contains("battery life is excellent")));
        assert!(points.iter().any(|p| p.contains("Shipping was fast")));
        assert!(!points.iter().any(|p| p.contains("rained on Tuesday")));
    }

    #[test]
    fn test_heuristic_product_name_bonus() {
        let text = "The Zephyr G14 arrived on Monday morning. Weather was cloudy outside today.";
        let points = HeuristicExtractor::extract_sync(text, Some("Zephyr G14"));
        assert!(points[0].contains("Zephyr G14"));
    }

    #[test]
    fn test_heuristic_falls_back_to_longest_sentences() {
        let text = "Mmm okay then. It arrived within the window they promised originally.";
        let points = HeuristicExtractor::extract_sync(text, None);
        assert!(!points.is_empty());
        assert!(points[0].contains("arrived within the window"));
    }

    #[test]
    fn test_adapter_creation() {
        let config = ProviderConfig {
            api_key: Some("test-key".to_string()),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-pro".to_string(),
            timeout_ms: 5000,
            max_retries: 0,
            retry_delay_ms: 100,
        };
        let extractor = GeminiExtractor::new(&config).unwrap();
        assert_eq!(
            extractor.generate_url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
    }
}
