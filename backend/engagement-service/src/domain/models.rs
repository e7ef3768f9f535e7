use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counter fields on a `posts` document
pub const LIKE_COUNT_FIELD: &str = "likeCount";
pub const COMMENT_COUNT_FIELD: &str = "commentCount";
pub const SHARE_COUNT_FIELD: &str = "shareCount";
pub const POST_ID_FIELD: &str = "postId";

/// Denormalized engagement counters living on a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEngagement {
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub share_count: i64,
}

/// Local mirror of [`PostEngagement`] as displayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

impl From<PostEngagement> for EngagementCounts {
    fn from(engagement: PostEngagement) -> Self {
        Self {
            likes: engagement.like_count,
            comments: engagement.comment_count,
            shares: engagement.share_count,
        }
    }
}

/// Relation row recording that an actor liked a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeMark {
    pub post_id: Uuid,
    pub actor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Relation row recording that an actor shared a post. Never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareMark {
    pub post_id: Uuid,
    pub actor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: Uuid,
    pub actor_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Row id shared by `likes` and `shares`: `{post_id}_{actor_id}`
pub fn relation_id(post_id: Uuid, actor_id: Uuid) -> String {
    format!("{}_{}", post_id, actor_id)
}
