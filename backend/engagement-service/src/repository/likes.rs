use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::observe;
use crate::domain::documents::{self, RelationPayload};
use crate::domain::models::{relation_id, LikeMark};
use crate::error::StoreResult;
use crate::store::{Collection, DocumentStore};

/// Repository for LikeMark relation rows
#[derive(Clone)]
pub struct LikeRepository {
    store: Arc<dyn DocumentStore>,
}

impl LikeRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_like(&self, post_id: Uuid, actor_id: Uuid) -> StoreResult<Option<LikeMark>> {
        let id = relation_id(post_id, actor_id);
        let doc = observe(
            Collection::Likes,
            "get",
            self.store.get(Collection::Likes, &id).await,
        )?;
        doc.map(|doc| documents::like_mark(&id, doc)).transpose()
    }

    /// Check if actor has liked a post
    pub async fn check_user_liked(&self, post_id: Uuid, actor_id: Uuid) -> StoreResult<bool> {
        Ok(self.get_like(post_id, actor_id).await?.is_some())
    }

    /// Create a like (idempotent - returns false if it already existed)
    #[instrument(skip(self))]
    pub async fn create_like(&self, post_id: Uuid, actor_id: Uuid) -> StoreResult<bool> {
        if self.check_user_liked(post_id, actor_id).await? {
            return Ok(false);
        }

        let data = documents::encode(Collection::Likes, &RelationPayload { post_id, actor_id })?;
        observe(
            Collection::Likes,
            "create",
            self.store
                .create(
                    Collection::Likes,
                    Some(&relation_id(post_id, actor_id)),
                    data,
                )
                .await,
        )?;
        Ok(true)
    }

    /// Delete a like (idempotent - returns false if it did not exist)
    #[instrument(skip(self))]
    pub async fn delete_like(&self, post_id: Uuid, actor_id: Uuid) -> StoreResult<bool> {
        if !self.check_user_liked(post_id, actor_id).await? {
            return Ok(false);
        }

        observe(
            Collection::Likes,
            "delete",
            self.store
                .delete(Collection::Likes, &relation_id(post_id, actor_id))
                .await,
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn create_and_delete_are_idempotent() {
        let store = Arc::new(MemoryStore::default());
        let repo = LikeRepository::new(store.clone());
        let (post, actor) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(!repo.check_user_liked(post, actor).await.unwrap());
        assert!(repo.create_like(post, actor).await.unwrap());
        assert!(!repo.create_like(post, actor).await.unwrap());
        assert_eq!(store.count(Collection::Likes), 1);

        let mark = repo.get_like(post, actor).await.unwrap().unwrap();
        assert_eq!(mark.post_id, post);
        assert_eq!(mark.actor_id, actor);

        assert!(repo.delete_like(post, actor).await.unwrap());
        assert!(!repo.delete_like(post, actor).await.unwrap());
        assert_eq!(store.count(Collection::Likes), 0);
    }
}
