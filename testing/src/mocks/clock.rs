//! Deterministic time.

use chrono::{DateTime, TimeDelta, Utc};
use coursehub_core::environment::Clock;
use std::sync::{Arc, Mutex, PoisonError};

/// Clock that only moves when a test moves it.
///
/// Clones share the same instant, so a test can keep one handle and advance
/// the time seen by a workflow environment.
///
/// # Example
///
/// ```
/// use coursehub_testing::mocks::{test_clock, FixedClock};
/// use coursehub_core::environment::Clock;
/// use chrono::TimeDelta;
///
/// let clock = test_clock();
/// let before = clock.now();
/// assert_eq!(clock.now(), before);
///
/// clock.advance(TimeDelta::seconds(5));
/// assert_eq!(clock.now() - before, TimeDelta::seconds(5));
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Start the clock at `time`.
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: TimeDelta) {
        let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
        *time += by;
    }

    /// Jump to `time`.
    pub fn set(&self, time: DateTime<Utc>) {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner) = time;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A clock standing at 2025-01-01 00:00:00 UTC.
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::new(DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default())
}
