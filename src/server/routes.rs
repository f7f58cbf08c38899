use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::SharedState;
use crate::error::StorageError;
use crate::storage::{AnalysisStatus, Review, ReviewStore, Sentiment};

/// Bounds for the submitted review text, measured after trimming.
const REVIEW_TEXT_MIN_CHARS: usize = 10;
const REVIEW_TEXT_MAX_CHARS: usize = 5000;

/// Longest accepted product name.
const PRODUCT_NAME_MAX_CHARS: usize = 255;

// ── Request payload types ─────────────────────────────────────────────

/// Body of the analyze endpoint.
#[derive(Debug, Deserialize)]
pub struct AnalyzeReviewRequest {
    pub review_text: String,
    pub product_name: Option<String>,
}

/// Query parameters for the history listing.
#[derive(Debug, Deserialize)]
pub struct ListReviewsParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub sentiment: Option<String>,
}

// ── Response envelopes ────────────────────────────────────────────────

/// Envelope for single-review responses.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Review>,
}

/// Envelope for the history listing.
#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub success: bool,
    pub total: i64,
    pub reviews: Vec<Review>,
}

// ── Error handling ────────────────────────────────────────────────────

/// Client-visible request failures.
///
/// Analyzer failures never appear here; they are folded into the stored
/// record. Only invalid input, missing records, and persistence problems
/// surface as error responses.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (
            status,
            Json(serde_json::json!({ "success": false, "error": message })),
        )
            .into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ReviewNotFound { id } => {
                ApiError::NotFound(format!("Review with id {} not found", id))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// ── Validation ────────────────────────────────────────────────────────

fn validate_review_text(raw: &str) -> Result<String, ApiError> {
    let text = raw.trim();
    let chars = text.chars().count();

    if chars < REVIEW_TEXT_MIN_CHARS {
        return Err(ApiError::Validation(format!(
            "review_text must be at least {} characters",
            REVIEW_TEXT_MIN_CHARS
        )));
    }
    if chars > REVIEW_TEXT_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "review_text must be at most {} characters",
            REVIEW_TEXT_MAX_CHARS
        )));
    }

    Ok(text.to_string())
}

fn validate_product_name(raw: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(name) = raw else {
        return Ok(None);
    };
    let name = name.trim();

    if name.is_empty() {
        return Ok(None);
    }
    if name.chars().count() > PRODUCT_NAME_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "product_name must be at most {} characters",
            PRODUCT_NAME_MAX_CHARS
        )));
    }

    Ok(Some(name.to_string()))
}

fn parse_sentiment_filter(raw: Option<&str>) -> Result<Option<Sentiment>, ApiError> {
    match raw {
        None => Ok(None),
        Some(value) => value.parse::<Sentiment>().map(Some).map_err(|_| {
            ApiError::Validation(
                "Invalid sentiment filter. Must be: positive, negative, or neutral".to_string(),
            )
        }),
    }
}

// ── Router ────────────────────────────────────────────────────────────

/// Build the API router.
pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/analyze-review", post(analyze_review))
        .route("/api/reviews", get(list_reviews))
        .route("/api/reviews/{id}", get(get_review).delete(delete_review))
        .route("/health", get(health_check))
        .route("/", get(root))
}

// ── Handlers ──────────────────────────────────────────────────────────

/// Analyze a new product review and persist the outcome.
///
/// Validation failures short-circuit before any upstream call. A persistence
/// failure is the only server-error path; incomplete analysis is reported
/// inside the stored record, not as a request failure.
async fn analyze_review(
    State(state): State<SharedState>,
    Json(payload): Json<AnalyzeReviewRequest>,
) -> Result<(StatusCode, Json<AnalysisResponse>), ApiError> {
    let review_text = validate_review_text(&payload.review_text)?;
    let product_name = validate_product_name(payload.product_name.as_deref())?;

    info!(chars = review_text.len(), "Analyzing review");

    let draft = state
        .orchestrator
        .analyze(&review_text, product_name.as_deref())
        .await;

    let review = state.store.create(&draft).await?;

    let message = match review.analysis_status {
        AnalysisStatus::Completed => "Review analyzed successfully",
        AnalysisStatus::Partial => "Review analysis partially completed",
        AnalysisStatus::Failed => "Review analysis failed",
    };

    Ok((
        StatusCode::CREATED,
        Json(AnalysisResponse {
            success: true,
            message: message.to_string(),
            data: Some(review),
        }),
    ))
}

/// List reviews with pagination and optional sentiment filtering.
async fn list_reviews(
    State(state): State<SharedState>,
    Query(params): Query<ListReviewsParams>,
) -> Result<Json<ReviewListResponse>, ApiError> {
    let sentiment = parse_sentiment_filter(params.sentiment.as_deref())?;

    let (reviews, total) = state
        .history
        .reviews(sentiment, params.skip, params.limit)
        .await?;

    Ok(Json(ReviewListResponse {
        success: true,
        total,
        reviews,
    }))
}

/// Get a specific review by id.
async fn get_review(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let review = state
        .history
        .review(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Review with id {} not found", id)))?;

    Ok(Json(AnalysisResponse {
        success: true,
        message: "Review retrieved successfully".to_string(),
        data: Some(review),
    }))
}

/// Delete a specific review by id.
async fn delete_review(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    state.history.delete(id).await?;

    info!(id, "Review deleted");

    Ok(Json(AnalysisResponse {
        success: true,
        message: format!("Review {} deleted successfully", id),
        data: None,
    }))
}

/// Liveness probe, independent of store and upstream health.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "review-analyzer",
    }))
}

/// Service banner.
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "message": "Product Review Analyzer API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
