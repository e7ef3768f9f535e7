use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::observe;
use crate::domain::documents::{self, CommentPayload};
use crate::domain::models::{Comment, POST_ID_FIELD};
use crate::error::StoreResult;
use crate::store::{Collection, DocumentStore, Filter, OrderBy, CREATED_AT_FIELD};

/// Repository for Comment operations
#[derive(Clone)]
pub struct CommentRepository {
    store: Arc<dyn DocumentStore>,
}

impl CommentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a comment and return the store-assigned id
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        actor_id: Uuid,
        content: String,
    ) -> StoreResult<String> {
        let data = documents::encode(
            Collection::Comments,
            &CommentPayload {
                post_id,
                actor_id,
                content,
            },
        )?;
        observe(
            Collection::Comments,
            "create",
            self.store.create(Collection::Comments, None, data).await,
        )
    }

    /// All comments for a post, newest first. Rows that fail validation are
    /// skipped with a warning.
    #[instrument(skip(self))]
    pub async fn get_post_comments(&self, post_id: Uuid) -> StoreResult<Vec<Comment>> {
        let rows = observe(
            Collection::Comments,
            "query",
            self.store
                .query(
                    Collection::Comments,
                    &Filter::field_equals(POST_ID_FIELD, post_id.to_string()),
                    Some(&OrderBy::descending(CREATED_AT_FIELD)),
                )
                .await,
        )?;

        let comments = rows
            .into_iter()
            .filter_map(|row| match documents::comment(row) {
                Ok(comment) => Some(comment),
                Err(e) => {
                    warn!(%post_id, error = %e, "skipping malformed comment");
                    None
                }
            })
            .collect();

        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn comments_come_back_newest_first() {
        let start = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::new(Arc::new(ManualClock::new(start))));
        let repo = CommentRepository::new(store.clone());
        let (post, other_post, actor) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let first = repo
            .create_comment(post, actor, "first".into())
            .await
            .unwrap();
        repo.create_comment(other_post, actor, "elsewhere".into())
            .await
            .unwrap();
        let second = repo
            .create_comment(post, actor, "second".into())
            .await
            .unwrap();

        let comments = repo.get_post_comments(post).await.unwrap();
        let ids: Vec<_> = comments.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![second, first]);
        assert!(comments[0].created_at > comments[1].created_at);
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped() {
        let store = Arc::new(MemoryStore::default());
        let post = Uuid::new_v4();
        store.seed(
            Collection::Comments,
            "broken",
            json!({"postId": post.to_string(), "content": ""})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let repo = CommentRepository::new(store);

        repo.create_comment(post, Uuid::new_v4(), "ok".into())
            .await
            .unwrap();
        let comments = repo.get_post_comments(post).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "ok");
    }
}
