//! Parse-and-validate at the store boundary.
//!
//! Documents come back from the store as untyped maps. Nothing past this module
//! sees one: every read is decoded into a typed record here, and every write is
//! encoded from a typed payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::models::{Comment, LikeMark, PostEngagement, ShareMark};
use crate::error::{StoreError, StoreResult};
use crate::store::{Collection, Document, StoredDocument};

/// Payload written to `likes` and `shares`; the store adds `createdAt`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationPayload {
    pub post_id: Uuid,
    pub actor_id: Uuid,
}

/// Payload written to `comments`; the store adds `createdAt`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub post_id: Uuid,
    pub actor_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationDocument {
    post_id: Uuid,
    actor_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentDocument {
    post_id: Uuid,
    actor_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

fn malformed(collection: Collection, id: &str, reason: impl Into<String>) -> StoreError {
    StoreError::Malformed {
        collection: collection.to_string(),
        id: id.to_string(),
        reason: reason.into(),
    }
}

fn decode<T: for<'de> Deserialize<'de>>(
    collection: Collection,
    id: &str,
    doc: Document,
) -> StoreResult<T> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| malformed(collection, id, e.to_string()))
}

/// Encode a payload as a document body
pub fn encode<T: Serialize>(collection: Collection, payload: &T) -> StoreResult<Document> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(malformed(
            collection,
            "<new>",
            format!("payload encoded as {}", other),
        )),
        Err(e) => Err(malformed(collection, "<new>", e.to_string())),
    }
}

pub fn post_engagement(id: &str, doc: Document) -> StoreResult<PostEngagement> {
    let engagement: PostEngagement = decode(Collection::Posts, id, doc)?;
    if engagement.like_count < 0 || engagement.comment_count < 0 || engagement.share_count < 0 {
        return Err(malformed(
            Collection::Posts,
            id,
            format!("negative counter in {:?}", engagement),
        ));
    }
    Ok(engagement)
}

pub fn like_mark(id: &str, doc: Document) -> StoreResult<LikeMark> {
    let row: RelationDocument = decode(Collection::Likes, id, doc)?;
    Ok(LikeMark {
        post_id: row.post_id,
        actor_id: row.actor_id,
        created_at: row.created_at,
    })
}

pub fn share_mark(id: &str, doc: Document) -> StoreResult<ShareMark> {
    let row: RelationDocument = decode(Collection::Shares, id, doc)?;
    Ok(ShareMark {
        post_id: row.post_id,
        actor_id: row.actor_id,
        created_at: row.created_at,
    })
}

pub fn comment(stored: StoredDocument) -> StoreResult<Comment> {
    let StoredDocument { id, data } = stored;
    let row: CommentDocument = decode(Collection::Comments, &id, data)?;
    if row.content.trim().is_empty() {
        return Err(malformed(Collection::Comments, &id, "empty content"));
    }
    Ok(Comment {
        id,
        post_id: row.post_id,
        actor_id: row.actor_id,
        content: row.content,
        created_at: row.created_at,
    })
}
