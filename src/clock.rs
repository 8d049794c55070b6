//! Time source abstraction.
//!
//! Cache TTLs, timestamp-window checks, and retention cutoffs all depend on
//! "now". Injecting a [`Clock`] instead of calling the system clock directly
//! makes those paths deterministic under test.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of unix time.
pub trait Clock: Send + Sync {
    /// Current unix time in seconds.
    fn now_unix(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// A settable clock for deterministic tests.
#[derive(Debug)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    /// Create a clock frozen at the given unix time.
    pub fn new(now: i64) -> Self {
        Self(AtomicI64::new(now))
    }

    /// Set the current time.
    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }

    /// Advance the current time by `secs` seconds.
    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_nonzero() {
        assert!(SystemClock.now_unix() > 0);
    }

    #[test]
    fn fixed_clock_set_and_advance() {
        let clock = FixedClock::new(1_700_000_000);
        assert_eq!(clock.now_unix(), 1_700_000_000);

        clock.advance(601);
        assert_eq!(clock.now_unix(), 1_700_000_601);

        clock.set(42);
        assert_eq!(clock.now_unix(), 42);
    }
}
