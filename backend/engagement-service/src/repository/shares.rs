use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::observe;
use crate::domain::documents::{self, RelationPayload};
use crate::domain::models::{relation_id, ShareMark};
use crate::error::StoreResult;
use crate::store::{Collection, DocumentStore};

/// Repository for ShareMark relation rows.
///
/// There is no delete: a share, once recorded, is permanent.
#[derive(Clone)]
pub struct ShareRepository {
    store: Arc<dyn DocumentStore>,
}

impl ShareRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_share(
        &self,
        post_id: Uuid,
        actor_id: Uuid,
    ) -> StoreResult<Option<ShareMark>> {
        let id = relation_id(post_id, actor_id);
        let doc = observe(
            Collection::Shares,
            "get",
            self.store.get(Collection::Shares, &id).await,
        )?;
        doc.map(|doc| documents::share_mark(&id, doc)).transpose()
    }

    /// Check if actor has shared a post
    pub async fn check_user_shared(&self, post_id: Uuid, actor_id: Uuid) -> StoreResult<bool> {
        Ok(self.get_share(post_id, actor_id).await?.is_some())
    }

    /// Create a share (idempotent - returns false if it already existed)
    #[instrument(skip(self))]
    pub async fn create_share(&self, post_id: Uuid, actor_id: Uuid) -> StoreResult<bool> {
        if self.check_user_shared(post_id, actor_id).await? {
            return Ok(false);
        }

        let data = documents::encode(Collection::Shares, &RelationPayload { post_id, actor_id })?;
        observe(
            Collection::Shares,
            "create",
            self.store
                .create(
                    Collection::Shares,
                    Some(&relation_id(post_id, actor_id)),
                    data,
                )
                .await,
        )?;
        Ok(true)
    }
}
