//! Clock abstraction for cache expiry.
//!
//! Expiry is computed against a monotonic tick count rather than wall-clock
//! time, so entries cannot spuriously expire (or survive) across a system
//! clock adjustment. Injecting the clock also makes TTL boundaries exactly
//! testable: tests drive a [`ManualClock`] instead of sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of the cache's logical "now".
///
/// Returned ticks are durations since an arbitrary per-clock origin. Only
/// differences between two readings are meaningful.
pub trait CacheClock: Send + Sync + 'static {
    /// Current tick, monotonically non-decreasing.
    fn now(&self) -> Duration;
}

/// Production clock backed by [`Instant`].
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually driven clock for deterministic tests.
///
/// Starts at tick zero and only moves when told to. Millisecond resolution
/// is enough for TTL boundary tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.millis
            .fetch_add(delta.as_millis() as u64, Ordering::SeqCst);
    }

    /// Jump the clock to an absolute tick. Panics if that would move time
    /// backwards, since the contract is monotonic.
    pub fn set(&self, at: Duration) {
        let target = at.as_millis() as u64;
        let current = self.millis.load(Ordering::SeqCst);
        assert!(
            target >= current,
            "ManualClock cannot move backwards ({} -> {})",
            current,
            target
        );
        self.millis.store(target, Ordering::SeqCst);
    }
}

impl CacheClock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock_starts_at_zero() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(500));
        assert_eq!(clock.now(), Duration::from_millis(500));
        clock.advance(Duration::from_millis(1000));
        assert_eq!(clock.now(), Duration::from_millis(1500));
    }

    #[test]
    fn test_manual_clock_set_forwards() {
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(10));
        assert_eq!(clock.now(), Duration::from_secs(10));
    }

    #[test]
    #[should_panic(expected = "cannot move backwards")]
    fn test_manual_clock_rejects_backwards() {
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(10));
        clock.set(Duration::from_secs(5));
    }
}
