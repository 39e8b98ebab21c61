//! Clock capability for timestamping history entries.
//!
//! Recording never reads the system time directly; callers pass a
//! [`Clock`]. Tests use [`FixedClock`] to control time.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A paused clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    /// Milliseconds since the Unix epoch
    current_ms: AtomicI64,
}

impl FixedClock {
    /// Create a clock frozen at `time`
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            current_ms: AtomicI64::new(time.timestamp_millis()),
        }
    }

    /// Create a clock frozen at milliseconds since the Unix epoch
    #[must_use]
    pub const fn from_millis(ms: i64) -> Self {
        Self {
            current_ms: AtomicI64::new(ms),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, duration: Duration) {
        let ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, time: DateTime<Utc>) {
        self.current_ms
            .store(time.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.current_ms.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
