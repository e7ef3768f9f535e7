/// Timeout wrapper for document store calls
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

use super::{Collection, Document, DocumentStore, FieldDelta, Filter, OrderBy, StoredDocument};
use crate::error::{StoreError, StoreResult};

/// Bounds every call on the inner store; an elapsed call becomes
/// [`StoreError::Timeout`]. The inner call is dropped, not cancelled remotely.
pub struct TimeoutStore {
    inner: Arc<dyn DocumentStore>,
    duration: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn DocumentStore>, duration: Duration) -> Self {
        Self { inner, duration }
    }

    async fn bounded<F, T>(
        &self,
        op: &'static str,
        collection: Collection,
        future: F,
    ) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>> + Send,
        T: Send,
    {
        match timeout(self.duration, future).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%collection, op, timeout = ?self.duration, "store call timed out");
                Err(StoreError::Timeout(self.duration))
            }
        }
    }
}

#[async_trait]
impl DocumentStore for TimeoutStore {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        self.bounded("get", collection, self.inner.get(collection, id))
            .await
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order_by: Option<&OrderBy>,
    ) -> StoreResult<Vec<StoredDocument>> {
        self.bounded(
            "query",
            collection,
            self.inner.query(collection, filter, order_by),
        )
        .await
    }

    async fn create(
        &self,
        collection: Collection,
        id: Option<&str>,
        data: Document,
    ) -> StoreResult<String> {
        self.bounded("create", collection, self.inner.create(collection, id, data))
            .await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        deltas: &[FieldDelta],
    ) -> StoreResult<()> {
        self.bounded(
            "update",
            collection,
            self.inner.update(collection, id, deltas),
        )
        .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.bounded("delete", collection, self.inner.delete(collection, id))
            .await
    }
}
