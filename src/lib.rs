//! # Review Analyzer
//!
//! An HTTP service that analyzes free-text product reviews by delegating to
//! two independent upstream analyzers - a sentiment classifier and a key
//! point extractor - and persists the reconciled outcome in a queryable
//! history.
//!
//! ## Features
//!
//! - **Sentiment Analysis**: classification via a hosted inference model
//! - **Key Point Extraction**: generative extraction with a local heuristic
//!   fallback when no API key is configured
//! - **Partial Results**: one analyzer failing degrades the record's status
//!   instead of failing the request
//! - **History**: filterable, paginated listing with deletion
//!
//! ## Architecture
//!
//! ```text
//! HTTP Client → axum API → Analysis Pipeline → Upstream analyzers (HTTP)
//!                   ↓
//!             SQLite (History)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use review_analyzer::{AppState, Config};
//! use review_analyzer::analysis::AnalysisOrchestrator;
//! use review_analyzer::analyzers::{GeminiExtractor, HuggingFaceSentiment};
//! use review_analyzer::storage::SqliteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(SqliteStore::new(&config.database).await?);
//!     let sentiment = Arc::new(HuggingFaceSentiment::new(&config.sentiment)?);
//!     let keypoints = Arc::new(GeminiExtractor::new(&config.keypoints)?);
//!     let orchestrator = AnalysisOrchestrator::new(
//!         sentiment,
//!         keypoints,
//!         Duration::from_millis(config.sentiment.timeout_ms),
//!         Duration::from_millis(config.keypoints.timeout_ms),
//!     );
//!     let state = Arc::new(AppState::new(config, store, orchestrator));
//!     review_analyzer::server::serve(state).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Review analysis pipeline: concurrent fan-out and reconciliation.
pub mod analysis;
/// Upstream analyzer adapters and their trait contracts.
pub mod analyzers;
/// Configuration management for the service.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// History queries: filtering, pagination, ordering.
pub mod history;
/// Prompt text for the generative extractor.
pub mod prompts;
/// HTTP server, routing, and request handling.
pub mod server;
/// SQLite storage layer for persistence.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, SharedState};
