//! Review history queries.
//!
//! A thin seam over the store that owns the listing policy: newest-first
//! ordering, default page size, and limit clamping.

use std::sync::Arc;

use tracing::debug;

use crate::error::StorageResult;
use crate::storage::{Review, ReviewQuery, ReviewStore, Sentiment};

/// Default page size when the caller does not specify a limit.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size; larger requests are clamped, not rejected.
pub const MAX_LIMIT: i64 = 100;

/// Query service over the review store.
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn ReviewStore>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// List reviews newest first, with the total count matching the filter.
    ///
    /// Reviews without a sentiment (failed analyses) never match a sentiment
    /// filter.
    pub async fn reviews(
        &self,
        sentiment: Option<Sentiment>,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> StorageResult<(Vec<Review>, i64)> {
        let query = ReviewQuery {
            sentiment,
            offset: skip.unwrap_or(0).max(0),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        };

        debug!(
            sentiment = ?query.sentiment,
            offset = query.offset,
            limit = query.limit,
            "Listing reviews"
        );

        self.store.list(&query).await
    }

    /// Get one review by id.
    pub async fn review(&self, id: i64) -> StorageResult<Option<Review>> {
        self.store.get(id).await
    }

    /// Delete one review by id. A missing id fails with `ReviewNotFound`,
    /// including the second delete of an id that existed.
    pub async fn delete(&self, id: i64) -> StorageResult<()> {
        self.store.delete(id).await
    }
}
