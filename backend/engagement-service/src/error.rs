/// Error types for engagement-service
use std::time::Duration;
use thiserror::Error;

use crate::services::notices::Action;

/// User-facing text for every failed engagement action.
pub const ACTION_FAILED_MESSAGE: &str = "Action failed, please try again";

/// Failures raised by a `DocumentStore` implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("Malformed document {collection}/{id}: {reason}")]
    Malformed {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures surfaced by the engagement coordinator.
///
/// Every kind of store failure collapses into `ActionFailed`; the message shown
/// to the user is always [`ACTION_FAILED_MESSAGE`]. The store error is kept as
/// the source for logging only.
#[derive(Error, Debug)]
pub enum EngagementError {
    #[error("{}", ACTION_FAILED_MESSAGE)]
    ActionFailed {
        action: Action,
        #[source]
        source: StoreError,
    },
}

impl EngagementError {
    pub fn action_failed(action: Action, source: StoreError) -> Self {
        Self::ActionFailed { action, source }
    }

    pub fn action(&self) -> Action {
        match self {
            Self::ActionFailed { action, .. } => *action,
        }
    }

    /// The message shown to the user
    pub fn user_message(&self) -> &'static str {
        ACTION_FAILED_MESSAGE
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for coordinator operations
pub type EngagementResult<T> = Result<T, EngagementError>;
