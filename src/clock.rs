use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, PoisonError, RwLock};

// ============================================================================
// Clock - Injectable wall-clock time
// ============================================================================
//
// Outbox timestamps (occurred_at, processed_at, next_retry_at) all come from
// a Clock so retry backoff can be exercised without sleeping.
//
// ============================================================================

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    time: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(RwLock::new(time)),
        }
    }

    /// Start at the current system time
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    pub fn set(&self, time: DateTime<Utc>) {
        *self.time.write().unwrap_or_else(PoisonError::into_inner) = time;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut time = self.time.write().unwrap_or_else(PoisonError::into_inner);
        *time += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.read().unwrap_or_else(PoisonError::into_inner)
    }
}
