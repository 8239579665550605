use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{Clock, Operation, SystemClock, duration_from_secs};
use crate::error::ConfigurationError;

/// What happens to the call history once the limiter has waited out a full
/// window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Forget every recorded call after the wait and start a fresh window.
    ///
    /// This is lenient: calls recorded shortly before the wait no longer count,
    /// so a burst right after the boundary can briefly exceed the nominal rate.
    #[default]
    ResetAfterWait,
    /// Re-prune against the time after the wait and keep waiting until a slot
    /// is free. No window of `window` length ever sees more than `max_calls`.
    Sliding,
}

/// Anything that gates entry to a call.
pub trait Gate {
    /// Block until the next call may proceed, then record it.
    fn admit(&mut self);
}

/// Allows at most `max_calls` admissions per rolling `window`, blocking the
/// caller instead of rejecting the call.
#[derive(Debug)]
pub struct RateLimiter<C = SystemClock> {
    max_calls: usize,
    window: Duration,
    policy: WindowPolicy,
    records: VecDeque<Instant>,
    clock: C,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Result<Self, ConfigurationError> {
        Self::with_clock(max_calls, window, SystemClock)
    }

    /// Like [`new`](Self::new), with the window given as float seconds.
    pub fn from_secs_f64(max_calls: usize, window_secs: f64) -> Result<Self, ConfigurationError> {
        Self::new(max_calls, duration_from_secs("window_seconds", window_secs)?)
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(
        max_calls: usize,
        window: Duration,
        clock: C,
    ) -> Result<Self, ConfigurationError> {
        if max_calls == 0 {
            return Err(ConfigurationError::ZeroMaxCalls);
        }
        if window.is_zero() {
            return Err(ConfigurationError::ZeroWindow);
        }

        Ok(Self {
            max_calls,
            window,
            policy: WindowPolicy::default(),
            records: VecDeque::with_capacity(max_calls),
            clock,
        })
    }

    pub fn with_policy(mut self, policy: WindowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    /// Number of recorded admissions younger than the window.
    pub fn recent_calls(&self) -> usize {
        let now = self.clock.now();
        self.records
            .iter()
            .filter(|&&at| now.duration_since(at) < self.window)
            .count()
    }

    /// Block until a call may proceed, then record it.
    pub fn admit(&mut self) {
        loop {
            let now = self.clock.now();
            self.prune(now);

            if self.records.len() < self.max_calls {
                break;
            }

            let Some(&oldest) = self.records.front() else {
                break;
            };
            let wait = self.window.saturating_sub(now.duration_since(oldest));
            if wait.is_zero() {
                break;
            }

            info!(
                max_calls = self.max_calls,
                window_secs = self.window.as_secs_f64(),
                wait_secs = wait.as_secs_f64(),
                "rate limit reached, waiting"
            );
            self.clock.sleep(wait);

            if self.policy == WindowPolicy::ResetAfterWait {
                self.records.clear();
                break;
            }
        }

        self.records.push_back(self.clock.now());
        debug!(recent = self.records.len(), "call admitted");
    }

    /// Gate `operation` behind this limiter.
    pub fn wrap<O>(self, operation: O) -> RateLimited<O, Self> {
        RateLimited {
            gate: self,
            operation,
        }
    }

    /// Move the limiter behind a mutex so it can be shared between threads.
    pub fn into_shared(self) -> SharedRateLimiter<C> {
        SharedRateLimiter {
            inner: Arc::new(Mutex::new(self)),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.records.front() {
            if now.duration_since(oldest) < self.window {
                break;
            }
            self.records.pop_front();
        }
    }
}

impl<C: Clock> Gate for RateLimiter<C> {
    fn admit(&mut self) {
        RateLimiter::admit(self);
    }
}

/// A [`RateLimiter`] behind an `Arc<Mutex<_>>`.
///
/// The lock covers the whole of `admit`, including the wait, so concurrent
/// callers are admitted one at a time in lock order.
#[derive(Debug)]
pub struct SharedRateLimiter<C = SystemClock> {
    inner: Arc<Mutex<RateLimiter<C>>>,
}

impl<C> Clone for SharedRateLimiter<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock> SharedRateLimiter<C> {
    pub fn admit(&self) {
        self.lock().admit();
    }

    pub fn recent_calls(&self) -> usize {
        self.lock().recent_calls()
    }

    /// Gate `operation` behind this limiter. Every clone gates through the
    /// same call history.
    pub fn wrap<O>(&self, operation: O) -> RateLimited<O, Self> {
        RateLimited {
            gate: self.clone(),
            operation,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RateLimiter<C>> {
        // The history stays consistent even if a holder panicked: every
        // mutation is a single push or pop.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<C: Clock> Gate for SharedRateLimiter<C> {
    fn admit(&mut self) {
        SharedRateLimiter::admit(self);
    }
}

/// An operation that passes through a [`Gate`] before every invocation.
///
/// The wrapped operation's output, including any error, is returned unchanged.
#[derive(Debug)]
pub struct RateLimited<O, G> {
    gate: G,
    operation: O,
}

impl<O, G> RateLimited<O, G> {
    pub fn gate(&self) -> &G {
        &self.gate
    }
}

impl<O, G, Args> Operation<Args> for RateLimited<O, G>
where
    O: Operation<Args>,
    G: Gate,
{
    type Output = O::Output;

    fn invoke(&mut self, args: Args) -> Self::Output {
        self.gate.admit();
        self.operation.invoke(args)
    }
}
