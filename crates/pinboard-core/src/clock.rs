//! Wall-clock source for write stamps.
//!
//! The envelope's `lastUpdate` doubles as the change token, so tests need
//! to control it exactly. Production code uses [`SystemClock`].

use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, PoisonError};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Every call to [`Clock::now`] advances the clock by `step` after reading
/// it, so consecutive writes get distinct tokens unless `step` is zero.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }

    /// Clock starting at `start` that never moves on its own.
    #[must_use]
    pub const fn frozen(start: DateTime<Utc>) -> Self {
        Self::new(start, Duration::zero())
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let now = *current;
        *current += self.step;
        now
    }
}
