/// Transient user-facing notices for failed actions
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::error::ACTION_FAILED_MESSAGE;

/// Engagement action kinds, used for notices, logs and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Initialize,
    Like,
    Share,
    Comment,
    LoadComments,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Initialize => "initialize",
            Action::Like => "like",
            Action::Share => "share",
            Action::Comment => "comment",
            Action::LoadComments => "load_comments",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dismissible notice. The message never says why the action failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub action: Action,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Fan-out of notices to whoever renders them
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    sender: broadcast::Sender<Notice>,
}

impl NoticeBoard {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// Publish the single collapsed failure notice for `action`
    pub fn publish_failure(&self, action: Action, raised_at: DateTime<Utc>) -> Notice {
        let notice = Notice {
            id: Uuid::new_v4(),
            action,
            message: ACTION_FAILED_MESSAGE.to_string(),
            raised_at,
        };

        // No receivers is fine; nobody is looking.
        if self.sender.send(notice.clone()).is_err() {
            debug!(%action, "notice dropped: no subscribers");
        }
        notice
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(16)
    }
}
