//! Time and identity collaborators.
//!
//! Stores stamp `createdAt` from a [`Clock`]; the coordinator uses its own clock
//! and an [`IdSource`] for optimistic comment inserts.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

/// Prefix for client-assigned ids that were never confirmed by the store
pub const TEMP_ID_PREFIX: &str = "temp-";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Each `now()` call advances by `step`
/// so consecutive stamps stay strictly ordered.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::with_step(start, Duration::milliseconds(1))
    }

    pub fn with_step(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.current.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock();
        let now = *current;
        *current += self.step;
        now
    }
}

/// Source of client-side ephemeral ids
pub trait IdSource: Send + Sync {
    fn temporary_id(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn temporary_id(&self) -> String {
        format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4())
    }
}

/// Wire format for timestamps: RFC 3339, UTC, microseconds. Fixed width, so
/// lexical order matches chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
