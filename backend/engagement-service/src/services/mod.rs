pub mod coordinator;
pub mod cooldown;
pub mod notices;

pub use coordinator::{
    ActionOutcome, EngagementContext, EngagementCoordinator, EngagementState, IgnoreReason,
};
pub use cooldown::CooldownGate;
pub use notices::{Action, Notice, NoticeBoard};
