use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::observe;
use crate::domain::documents;
use crate::domain::models::{
    PostEngagement, COMMENT_COUNT_FIELD, LIKE_COUNT_FIELD, SHARE_COUNT_FIELD,
};
use crate::error::StoreResult;
use crate::store::{Collection, DocumentStore, FieldDelta};

/// Repository for the engagement counters on `posts`.
///
/// Only relative deltas are written, never absolute values, so concurrent
/// viewers do not clobber each other.
#[derive(Clone)]
pub struct PostRepository {
    store: Arc<dyn DocumentStore>,
}

impl PostRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Read the counters; `None` when the post document does not exist
    #[instrument(skip(self))]
    pub async fn get_engagement(&self, post_id: Uuid) -> StoreResult<Option<PostEngagement>> {
        let id = post_id.to_string();
        let doc = observe(
            Collection::Posts,
            "get",
            self.store.get(Collection::Posts, &id).await,
        )?;
        doc.map(|doc| documents::post_engagement(&id, doc))
            .transpose()
    }

    async fn apply_delta(&self, post_id: Uuid, field: &str, delta: i64) -> StoreResult<()> {
        observe(
            Collection::Posts,
            "update",
            self.store
                .update(
                    Collection::Posts,
                    &post_id.to_string(),
                    &[FieldDelta::new(field, delta)],
                )
                .await,
        )
    }

    pub async fn increment_like_count(&self, post_id: Uuid) -> StoreResult<()> {
        self.apply_delta(post_id, LIKE_COUNT_FIELD, 1).await
    }

    pub async fn decrement_like_count(&self, post_id: Uuid) -> StoreResult<()> {
        self.apply_delta(post_id, LIKE_COUNT_FIELD, -1).await
    }

    pub async fn increment_comment_count(&self, post_id: Uuid) -> StoreResult<()> {
        self.apply_delta(post_id, COMMENT_COUNT_FIELD, 1).await
    }

    pub async fn increment_share_count(&self, post_id: Uuid) -> StoreResult<()> {
        self.apply_delta(post_id, SHARE_COUNT_FIELD, 1).await
    }
}
