use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{AnalysisStatus, Review, ReviewDraft, ReviewQuery, ReviewStore, Sentiment};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed review store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory store, used by tests
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        // A single pinned connection keeps every query on the same in-memory
        // database; reaping it would drop the data.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Migration {
                message: format!("Failed to run migrations: {}", e),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ReviewStore for SqliteStore {
    async fn create(&self, draft: &ReviewDraft) -> StorageResult<Review> {
        let created_at = Utc::now();
        let key_points = serde_json::to_string(&draft.key_points).unwrap_or_else(|_| "[]".into());

        let result = sqlx::query(
            r#"
            INSERT INTO reviews
                (review_text, product_name, sentiment, sentiment_score,
                 key_points, analysis_status, error_message, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.review_text)
        .bind(&draft.product_name)
        .bind(draft.sentiment.map(|s| s.to_string()))
        .bind(draft.sentiment_score)
        .bind(&key_points)
        .bind(draft.analysis_status.to_string())
        .bind(&draft.error_message)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, status = %draft.analysis_status, "Review persisted");

        Ok(Review {
            id,
            review_text: draft.review_text.clone(),
            product_name: draft.product_name.clone(),
            sentiment: draft.sentiment,
            sentiment_score: draft.sentiment_score,
            key_points: draft.key_points.clone(),
            analysis_status: draft.analysis_status,
            error_message: draft.error_message.clone(),
            created_at,
        })
    }

    async fn get(&self, id: i64) -> StorageResult<Option<Review>> {
        let row: Option<ReviewRow> = sqlx::query_as(
            r#"
            SELECT id, review_text, product_name, sentiment, sentiment_score,
                   key_points, analysis_status, error_message, created_at
            FROM reviews
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list(&self, query: &ReviewQuery) -> StorageResult<(Vec<Review>, i64)> {
        let sentiment = query.sentiment.map(|s| s.to_string());

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM reviews
            WHERE (?1 IS NULL OR sentiment = ?1)
            "#,
        )
        .bind(&sentiment)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<ReviewRow> = sqlx::query_as(
            r#"
            SELECT id, review_text, product_name, sentiment, sentiment_score,
                   key_points, analysis_status, error_message, created_at
            FROM reviews
            WHERE (?1 IS NULL OR sentiment = ?1)
            ORDER BY created_at DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&sentiment)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(|r| r.into()).collect(), total))
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::ReviewNotFound { id });
        }

        Ok(())
    }
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    review_text: String,
    product_name: Option<String>,
    sentiment: Option<String>,
    sentiment_score: Option<f64>,
    key_points: String,
    analysis_status: String,
    error_message: Option<String>,
    created_at: String,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        use chrono::DateTime;

        Self {
            id: row.id,
            review_text: row.review_text,
            product_name: row.product_name,
            sentiment: row.sentiment.and_then(|s| s.parse::<Sentiment>().ok()),
            sentiment_score: row.sentiment_score,
            key_points: serde_json::from_str(&row.key_points).unwrap_or_default(),
            analysis_status: row
                .analysis_status
                .parse::<AnalysisStatus>()
                .unwrap_or(AnalysisStatus::Failed),
            error_message: row.error_message,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
        }
    }
}
