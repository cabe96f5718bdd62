use chrono::{DateTime, Utc};
use std::sync::RwLock;

/// # Summary
/// Clock abstraction so observation timestamps can be pinned in tests.
/// Fetchers must take the observation time from this trait, never from
/// `Utc::now()` directly.
pub trait TimeProvider: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// # Summary
/// Wall clock used by the binary.
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// Settable clock for tests.
///
/// # Invariants
/// - Reads and writes go through a `RwLock`; a poisoned lock still yields the
///   last written time.
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    /// Creates a clock frozen at `initial_time`.
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// Moves the clock to `new_time`.
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        let mut time = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *time = new_time;
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
