//! Integration tests for the SQLite review store
//!
//! Tests database operations using an in-memory SQLite database.

use review_analyzer::error::StorageError;
use review_analyzer::storage::{
    AnalysisStatus, ReviewDraft, ReviewQuery, ReviewStore, Sentiment, SqliteStore,
};

/// Create an in-memory store instance for testing
async fn create_test_store() -> SqliteStore {
    SqliteStore::new_in_memory()
        .await
        .expect("Failed to create in-memory store")
}

/// A fully-successful draft with the given sentiment
fn draft(sentiment: Sentiment) -> ReviewDraft {
    ReviewDraft::completed(
        "The battery easily lasts two full days of heavy use.",
        sentiment,
        0.87,
        vec!["Long battery life".to_string()],
    )
}

/// A draft for a review whose analysis failed on both sides
fn failed_draft() -> ReviewDraft {
    ReviewDraft {
        review_text: "The packaging arrived dented but the product was fine.".to_string(),
        product_name: None,
        sentiment: None,
        sentiment_score: None,
        key_points: vec![],
        analysis_status: AnalysisStatus::Failed,
        error_message: Some(
            "Sentiment analysis failed: Upstream unavailable: connection refused (retries: 2); \
             Key point extraction failed: Request timeout after 30000ms"
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod create_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = create_test_store().await;

        let first = store.create(&draft(Sentiment::Positive)).await.unwrap();
        let second = store.create(&draft(Sentiment::Negative)).await.unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_create_get_round_trip() {
        let store = create_test_store().await;

        let created = store
            .create(&draft(Sentiment::Positive).with_product("Tablet S9"))
            .await
            .unwrap();

        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_failed_analysis_is_still_persisted() {
        let store = create_test_store().await;

        let created = store.create(&failed_draft()).await.unwrap();
        let fetched = store.get(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.analysis_status, AnalysisStatus::Failed);
        assert!(fetched.sentiment.is_none());
        assert!(fetched.sentiment_score.is_none());
        assert!(fetched.key_points.is_empty());
        assert!(fetched.error_message.unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn test_key_points_round_trip_preserves_order() {
        let store = create_test_store().await;

        let mut d = draft(Sentiment::Neutral);
        d.key_points = vec![
            "Zippy performance".to_string(),
            "Average battery".to_string(),
            "Bright screen".to_string(),
        ];

        let created = store.create(&d).await.unwrap();
        let fetched = store.get(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.key_points, d.key_points);
    }
}

#[cfg(test)]
mod file_tests {
    use super::*;
    use review_analyzer::config::DatabaseConfig;

    #[tokio::test]
    async fn test_file_backed_store_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("nested").join("reviews.db"),
            max_connections: 2,
        };

        let store = SqliteStore::new(&config).await.unwrap();
        let created = store.create(&draft(Sentiment::Positive)).await.unwrap();

        assert_eq!(store.get(created.id).await.unwrap(), Some(created));
        assert!(config.path.exists());
    }
}

#[cfg(test)]
mod get_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_nonexistent_review() {
        let store = create_test_store().await;

        let result = store.get(12345).await.unwrap();
        assert!(result.is_none(), "Should return None for nonexistent id");
    }
}

#[cfg(test)]
mod delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_removes_review() {
        let store = create_test_store().await;

        let created = store.create(&draft(Sentiment::Positive)).await.unwrap();
        store.delete(created.id).await.unwrap();

        let result = store.get(created.id).await.unwrap();
        assert!(result.is_none(), "Review should be deleted");
    }

    #[tokio::test]
    async fn test_second_delete_is_not_found() {
        let store = create_test_store().await;

        let created = store.create(&draft(Sentiment::Positive)).await.unwrap();
        store.delete(created.id).await.unwrap();

        let result = store.delete(created.id).await;
        assert!(matches!(
            result,
            Err(StorageError::ReviewNotFound { id }) if id == created.id
        ));
    }

    #[tokio::test]
    async fn test_delete_nonexistent_review() {
        let store = create_test_store().await;

        let result = store.delete(999).await;
        assert!(matches!(
            result,
            Err(StorageError::ReviewNotFound { id: 999 })
        ));
    }

    #[tokio::test]
    async fn test_delete_leaves_other_reviews_intact() {
        let store = create_test_store().await;

        let keep = store.create(&draft(Sentiment::Positive)).await.unwrap();
        let remove = store.create(&draft(Sentiment::Negative)).await.unwrap();

        store.delete(remove.id).await.unwrap();

        assert!(store.get(keep.id).await.unwrap().is_some());
        let (reviews, total) = store.list(&ReviewQuery { sentiment: None, offset: 0, limit: 10 })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(reviews[0].id, keep.id);
    }
}

#[cfg(test)]
mod list_tests {
    use super::*;

    async fn seed(store: &SqliteStore, sentiments: &[Sentiment]) -> Vec<i64> {
        let mut ids = Vec::new();
        for sentiment in sentiments {
            ids.push(store.create(&draft(*sentiment)).await.unwrap().id);
        }
        ids
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = create_test_store().await;
        let ids = seed(
            &store,
            &[Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative],
        )
        .await;

        let (reviews, total) = store
            .list(&ReviewQuery {
                sentiment: None,
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap();

        assert_eq!(total, 3);
        let listed: Vec<i64> = reviews.iter().map(|r| r.id).collect();
        let mut expected = ids.clone();
        expected.reverse();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn test_pagination_pages_are_disjoint_and_cover_all() {
        let store = create_test_store().await;
        seed(&store, &[Sentiment::Positive; 5]).await;

        let mut collected = Vec::new();
        for offset in [0, 2, 4] {
            let (page, total) = store
                .list(&ReviewQuery {
                    sentiment: None,
                    offset,
                    limit: 2,
                })
                .await
                .unwrap();
            assert_eq!(total, 5);
            collected.extend(page.into_iter().map(|r| r.id));
        }

        assert_eq!(collected.len(), 5);
        let mut deduped = collected.clone();
        deduped.dedup();
        assert_eq!(deduped, collected, "Pages must not overlap");

        // Order stays consistent across pages.
        let mut sorted = collected.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(collected, sorted);
    }

    #[tokio::test]
    async fn test_offset_beyond_end_returns_empty_page() {
        let store = create_test_store().await;
        seed(&store, &[Sentiment::Positive, Sentiment::Negative]).await;

        let (page, total) = store
            .list(&ReviewQuery {
                sentiment: None,
                offset: 10,
                limit: 2,
            })
            .await
            .unwrap();

        assert_eq!(total, 2);
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_sentiment_filter_matches_exactly() {
        let store = create_test_store().await;
        seed(
            &store,
            &[
                Sentiment::Positive,
                Sentiment::Negative,
                Sentiment::Positive,
                Sentiment::Neutral,
            ],
        )
        .await;

        let (reviews, total) = store
            .list(&ReviewQuery {
                sentiment: Some(Sentiment::Positive),
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap();

        assert_eq!(total, 2);
        assert!(reviews
            .iter()
            .all(|r| r.sentiment == Some(Sentiment::Positive)));
    }

    #[tokio::test]
    async fn test_sentiment_filter_excludes_records_without_sentiment() {
        let store = create_test_store().await;

        store.create(&draft(Sentiment::Negative)).await.unwrap();
        store.create(&failed_draft()).await.unwrap();

        let (reviews, total) = store
            .list(&ReviewQuery {
                sentiment: Some(Sentiment::Negative),
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap();

        assert_eq!(total, 1);
        assert_eq!(reviews[0].sentiment, Some(Sentiment::Negative));

        // Unfiltered listing still includes the failed record.
        let (_, total_all) = store
            .list(&ReviewQuery {
                sentiment: None,
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(total_all, 2);
    }

    #[tokio::test]
    async fn test_total_reflects_filter_not_page() {
        let store = create_test_store().await;
        seed(&store, &[Sentiment::Neutral; 4]).await;

        let (page, total) = store
            .list(&ReviewQuery {
                sentiment: Some(Sentiment::Neutral),
                offset: 0,
                limit: 2,
            })
            .await
            .unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(total, 4);
    }
}
