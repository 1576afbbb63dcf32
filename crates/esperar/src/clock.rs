//! Time source for the poller.
//!
//! The poller reads time and sleeps only through [`Clock`], so tests can swap
//! in a [`FakeClock`] whose sleeps advance virtual time instantly and are
//! counted.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source with a blocking sleep
pub trait Clock: Debug + Send + Sync {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Real clock backed by [`Instant`] and [`std::thread::sleep`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
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

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Fake clock for deterministic testing
///
/// Time only moves when [`FakeClock::advance`] or [`Clock::sleep`] is called.
#[derive(Debug, Default)]
pub struct FakeClock {
    /// Current virtual time in milliseconds
    current_ms: AtomicU64,
    /// Number of sleeps performed
    sleeps: AtomicU64,
    /// Total virtual time spent sleeping
    slept_ms: AtomicU64,
}

impl FakeClock {
    /// Create a fake clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance virtual time without counting a sleep
    pub fn advance(&self, duration: Duration) {
        self.current_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Current virtual time in milliseconds
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }

    /// Number of sleeps performed so far
    #[must_use]
    pub fn sleep_count(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }

    /// Total virtual time spent sleeping
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        Duration::from_millis(self.slept_ms.load(Ordering::SeqCst))
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms())
    }

    fn sleep(&self, duration: Duration) {
        let ms = duration.as_millis() as u64;
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.slept_ms.fetch_add(ms, Ordering::SeqCst);
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }
}
