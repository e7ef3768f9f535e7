pub mod documents;
pub mod models;

pub use models::{
    relation_id, Comment, EngagementCounts, LikeMark, PostEngagement, ShareMark,
};
