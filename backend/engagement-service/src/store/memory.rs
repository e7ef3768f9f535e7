use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{
    Collection, Document, DocumentStore, FieldDelta, Filter, OrderBy, StoredDocument,
    CREATED_AT_FIELD,
};
use crate::clock::{format_timestamp, Clock, SystemClock};
use crate::error::{StoreError, StoreResult};

/// In-process document store.
///
/// Each operation runs under a single lock acquisition, so `update` is atomic
/// across all of its deltas.
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Document>>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Insert or replace a document verbatim, without stamping `createdAt`
    pub fn seed(&self, collection: Collection, id: impl Into<String>, data: Document) {
        self.collections
            .write()
            .entry(collection)
            .or_default()
            .insert(id.into(), data);
    }

    /// Synchronous point read for inspection
    pub fn peek(&self, collection: Collection, id: &str) -> Option<Document> {
        self.collections
            .read()
            .get(&collection)
            .and_then(|docs| docs.get(id).cloned())
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .get(&collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.peek(collection, id))
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order_by: Option<&OrderBy>,
    ) -> StoreResult<Vec<StoredDocument>> {
        let guard = self.collections.read();
        let mut results: Vec<StoredDocument> = guard
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| filter.matches(data))
                    .map(|(id, data)| StoredDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        drop(guard);

        if let Some(order) = order_by {
            results.sort_by(|a, b| order.compare(&a.data, &b.data));
        }

        debug!(%collection, matched = results.len(), "memory query");
        Ok(results)
    }

    async fn create(
        &self,
        collection: Collection,
        id: Option<&str>,
        mut data: Document,
    ) -> StoreResult<String> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        data.insert(
            CREATED_AT_FIELD.to_string(),
            Value::String(format_timestamp(self.clock.now())),
        );

        let mut guard = self.collections.write();
        let docs = guard.entry(collection).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id,
            });
        }
        docs.insert(id.clone(), data);
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        deltas: &[FieldDelta],
    ) -> StoreResult<()> {
        let mut guard = self.collections.write();
        let doc = guard
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        // Validate every field before writing any of them.
        let mut next = Vec::with_capacity(deltas.len());
        for delta in deltas {
            let current = match doc.get(&delta.field) {
                None | Some(Value::Null) => 0,
                Some(value) => value.as_i64().ok_or_else(|| StoreError::Malformed {
                    collection: collection.to_string(),
                    id: id.to_string(),
                    reason: format!("field {} is not an integer", delta.field),
                })?,
            };
            next.push((delta.field.clone(), current + delta.delta));
        }

        for (field, value) in next {
            doc.insert(field, Value::from(value));
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        if let Some(docs) = self.collections.write().get_mut(&collection) {
            docs.remove(id);
        }
        Ok(())
    }
}
