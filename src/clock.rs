//! Time source for the interval gate and round timestamps.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::state::UnixTimestamp;

/// Source of the current time.
///
/// Implementations must never move backwards; round timestamps and the
/// interval gate are derived from successive readings.
pub trait Clock: Send + Sync {
    fn now_ts(&self) -> UnixTimestamp;
}

/// System wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ts(&self) -> UnixTimestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as UnixTimestamp)
            .unwrap_or(0)
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: UnixTimestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Moves time forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now
            .fetch_add(i64::try_from(secs).unwrap_or(i64::MAX), Ordering::SeqCst);
    }

    /// Jumps to an absolute timestamp. Callers keep it non-decreasing.
    pub fn set(&self, ts: UnixTimestamp) {
        self.now.store(ts, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ts(&self) -> UnixTimestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_ts(), 1_000);
        clock.advance(30);
        assert_eq!(clock.now_ts(), 1_030);
        clock.set(2_000);
        assert_eq!(clock.now_ts(), 2_000);
    }
}
