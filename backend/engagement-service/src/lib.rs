pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod repository;
pub mod services;
pub mod store;

pub use error::{EngagementError, EngagementResult, StoreError, StoreResult};
pub use services::{
    Action, ActionOutcome, EngagementContext, EngagementCoordinator, EngagementState,
    IgnoreReason, Notice, NoticeBoard,
};
pub use store::{DocumentStore, MemoryStore, PostgresStore};
