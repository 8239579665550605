//! Time sources for the call-shaping middleware.
//!
//! The rate limiter and the retry executor never touch `Instant::now` or
//! `thread::sleep` directly; they go through a [`Clock`]. Production code uses
//! [`SystemClock`]; tests use [`MockClock`], whose `sleep` advances virtual time
//! instead of blocking.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Reads monotonic time and blocks the calling thread.
pub trait Clock: Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant::now()` and `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Manually driven clock for deterministic tests.
///
/// `sleep` returns immediately after moving the clock forward by the requested
/// duration, and remembers the request so tests can assert on it. Clones share
/// the same underlying time.
///
/// ```
/// use llm_starter_kit::middleware::{Clock, MockClock};
/// use std::time::Duration;
///
/// let clock = MockClock::new();
/// let start = clock.now();
///
/// clock.sleep(Duration::from_secs(3));
/// clock.advance(Duration::from_secs(2));
///
/// assert_eq!(clock.now() - start, Duration::from_secs(5));
/// assert_eq!(clock.sleeps(), vec![Duration::from_secs(3)]);
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
struct MockState {
    now: Instant,
    sleeps: Vec<Duration>,
}

impl MockClock {
    /// Create a mock clock starting at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a mock clock starting at a specific instant.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                now: start,
                sleeps: Vec::new(),
            })),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.lock().now += duration;
    }

    /// Every duration passed to [`Clock::sleep`] so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    /// Sum of all recorded sleeps.
    pub fn total_slept(&self) -> Duration {
        self.lock().sleeps.iter().sum()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the clock from the others.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.now += duration;
        state.sleeps.push(duration);
    }
}
