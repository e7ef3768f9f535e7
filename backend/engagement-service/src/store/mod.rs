//! Document store contract.
//!
//! The coordinator treats persistence as an opaque collaborator that offers
//! point reads, atomic relative increments, point deletes and ordered filtered
//! queries over flat, schemaless collections.

pub mod memory;
pub mod postgres;
pub mod timeout;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use timeout::TimeoutStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use crate::error::StoreResult;

/// Field every store stamps on `create` with its own clock
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Untyped document body as held by the store
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Posts,
    Likes,
    Shares,
    Comments,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Likes => "likes",
            Collection::Shares => "shares",
            Collection::Comments => "comments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document together with its id, as returned by `query`
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    FieldEquals { field: String, value: Value },
}

impl Filter {
    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::FieldEquals { field, value } => doc.get(field) == Some(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    /// Compare two documents on the ordering field, honoring direction.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        match self.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }
}

/// Relative change applied atomically to an integer field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDelta {
    pub field: String,
    pub delta: i64,
}

impl FieldDelta {
    pub fn new(field: impl Into<String>, delta: i64) -> Self {
        Self {
            field: field.into(),
            delta,
        }
    }

    pub fn increment(field: impl Into<String>) -> Self {
        Self::new(field, 1)
    }

    pub fn decrement(field: impl Into<String>) -> Self {
        Self::new(field, -1)
    }
}

/// Document store interface
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read; `None` when the document does not exist
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    /// Filtered range query, optionally ordered
    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order_by: Option<&OrderBy>,
    ) -> StoreResult<Vec<StoredDocument>>;

    /// Insert a document and return its id. With `id = None` the store assigns
    /// one. The store injects [`CREATED_AT_FIELD`].
    async fn create(
        &self,
        collection: Collection,
        id: Option<&str>,
        data: Document,
    ) -> StoreResult<String>;

    /// Apply relative deltas to integer fields of an existing document
    async fn update(&self, collection: Collection, id: &str, deltas: &[FieldDelta])
        -> StoreResult<()>;

    /// Remove a document; removing a missing document is not an error
    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()>;
}

/// Missing sorts first; numbers numerically; strings lexically.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
