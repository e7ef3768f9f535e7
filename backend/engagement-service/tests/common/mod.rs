#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use engagement_service::clock::ManualClock;
use engagement_service::config::EngagementConfig;
use engagement_service::store::{
    Collection, Document, DocumentStore, FieldDelta, Filter, MemoryStore, OrderBy, StoredDocument,
};
use engagement_service::{EngagementContext, StoreError, StoreResult};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    Query,
    Create,
    Update,
    Delete,
}

impl Op {
    fn is_mutation(&self) -> bool {
        matches!(self, Op::Create | Op::Update | Op::Delete)
    }
}

/// Parks one matching store call until released
#[derive(Default)]
pub struct Hold {
    pub entered: Notify,
    pub release: Notify,
}

/// Memory store that records calls and can fail or park chosen operations
pub struct ScriptedStore {
    pub inner: MemoryStore,
    calls: Mutex<Vec<(Collection, Op)>>,
    failures: Mutex<Vec<(Collection, Op)>>,
    hold: Mutex<Option<(Collection, Op, Arc<Hold>)>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        Self {
            inner: MemoryStore::new(Arc::new(ManualClock::new(start))),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            hold: Mutex::new(None),
        }
    }

    pub fn fail_on(&self, collection: Collection, op: Op) {
        self.failures.lock().push((collection, op));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    pub fn hold_on(&self, collection: Collection, op: Op) -> Arc<Hold> {
        let hold = Arc::new(Hold::default());
        *self.hold.lock() = Some((collection, op, hold.clone()));
        hold
    }

    pub fn calls(&self) -> Vec<(Collection, Op)> {
        self.calls.lock().clone()
    }

    pub fn mutations(&self) -> Vec<(Collection, Op)> {
        self.calls()
            .into_iter()
            .filter(|(_, op)| op.is_mutation())
            .collect()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    async fn enter(&self, collection: Collection, op: Op) -> StoreResult<()> {
        self.calls.lock().push((collection, op));

        let hold = {
            let mut slot = self.hold.lock();
            let armed = matches!(slot.as_ref(), Some((c, o, _)) if *c == collection && *o == op);
            if armed {
                slot.take().map(|(_, _, h)| h)
            } else {
                None
            }
        };
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        if self.failures.lock().contains(&(collection, op)) {
            return Err(StoreError::Backend(format!(
                "injected failure on {} {:?}",
                collection, op
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        self.enter(collection, Op::Get).await?;
        self.inner.get(collection, id).await
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order_by: Option<&OrderBy>,
    ) -> StoreResult<Vec<StoredDocument>> {
        self.enter(collection, Op::Query).await?;
        self.inner.query(collection, filter, order_by).await
    }

    async fn create(
        &self,
        collection: Collection,
        id: Option<&str>,
        data: Document,
    ) -> StoreResult<String> {
        self.enter(collection, Op::Create).await?;
        self.inner.create(collection, id, data).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        deltas: &[FieldDelta],
    ) -> StoreResult<()> {
        self.enter(collection, Op::Update).await?;
        self.inner.update(collection, id, deltas).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.enter(collection, Op::Delete).await?;
        self.inner.delete(collection, id).await
    }
}

pub fn counters(likes: i64, comments: i64, shares: i64) -> Document {
    json!({
        "likeCount": likes,
        "commentCount": comments,
        "shareCount": shares,
    })
    .as_object()
    .cloned()
    .unwrap()
}

pub fn relation(post_id: Uuid, actor_id: Uuid) -> Document {
    json!({
        "postId": post_id,
        "actorId": actor_id,
        "createdAt": "2026-04-30T12:00:00.000000Z",
    })
    .as_object()
    .cloned()
    .unwrap()
}

pub fn seed_post(store: &ScriptedStore, post_id: Uuid, likes: i64, comments: i64, shares: i64) {
    store.inner.seed(
        Collection::Posts,
        post_id.to_string(),
        counters(likes, comments, shares),
    );
}

pub fn context(store: Arc<ScriptedStore>) -> EngagementContext {
    context_with(store, EngagementConfig::default())
}

pub fn context_with(store: Arc<ScriptedStore>, config: EngagementConfig) -> EngagementContext {
    let start = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
    EngagementContext::new(store, &config).with_clock(Arc::new(ManualClock::new(start)))
}

pub fn like_count(store: &ScriptedStore, post_id: Uuid) -> i64 {
    counter(store, post_id, "likeCount")
}

pub fn counter(store: &ScriptedStore, post_id: Uuid, field: &str) -> i64 {
    store
        .inner
        .peek(Collection::Posts, &post_id.to_string())
        .and_then(|doc| doc.get(field).and_then(|v| v.as_i64()))
        .unwrap_or(0)
}
