use std::fmt::Display;
use std::time::Duration;

use tracing::{debug, warn};

use super::{Clock, Operation, SystemClock, duration_from_secs};
use crate::error::ConfigurationError;

/// How the delay between attempts evolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backoff {
    /// Wait the same delay before every retry.
    #[default]
    Constant,
    /// Double the delay after every failure, up to `max_delay`.
    Exponential { max_delay: Duration },
}

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            backoff: Backoff::Constant,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first call, so `1` means "never retry".
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self, ConfigurationError> {
        if max_attempts == 0 {
            return Err(ConfigurationError::ZeroMaxAttempts);
        }
        Ok(Self {
            max_attempts,
            delay,
            backoff: Backoff::Constant,
        })
    }

    pub fn from_secs_f64(max_attempts: u32, delay_secs: f64) -> Result<Self, ConfigurationError> {
        Self::new(max_attempts, duration_from_secs("delay_seconds", delay_secs)?)
    }

    pub fn with_exponential_backoff(mut self, max_delay: Duration) -> Self {
        self.backoff = Backoff::Exponential { max_delay };
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Constant => self.delay,
            Backoff::Exponential { max_delay } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                std::cmp::min(self.delay.saturating_mul(factor), max_delay)
            }
        }
    }
}

/// Decides whether a failure is worth another attempt.
pub trait Retriable<E> {
    fn is_retriable(&self, error: &E) -> bool;
}

/// Retry every failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl<E> Retriable<E> for Always {
    fn is_retriable(&self, _error: &E) -> bool {
        true
    }
}

impl<E, F> Retriable<E> for F
where
    F: Fn(&E) -> bool,
{
    fn is_retriable(&self, error: &E) -> bool {
        self(error)
    }
}

/// Build an executor that makes up to `max_attempts` attempts, waiting
/// `delay` between them.
pub fn retry(max_attempts: u32, delay: Duration) -> Result<RetryExecutor, ConfigurationError> {
    Ok(RetryExecutor::new(RetryPolicy::new(max_attempts, delay)?))
}

/// Runs a fallible operation until it succeeds or the policy gives up.
#[derive(Debug, Clone)]
pub struct RetryExecutor<C = SystemClock, P = Always> {
    policy: RetryPolicy,
    name: &'static str,
    clock: C,
    predicate: P,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            name: "call",
            clock: SystemClock,
            predicate: Always,
        }
    }
}

impl<C: Clock, P> RetryExecutor<C, P> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> RetryExecutor<C2, P> {
        RetryExecutor {
            policy: self.policy,
            name: self.name,
            clock,
            predicate: self.predicate,
        }
    }

    /// Only retry failures for which `predicate` returns true; anything else
    /// is returned after the attempt that produced it.
    pub fn retry_if<P2>(self, predicate: P2) -> RetryExecutor<C, P2> {
        RetryExecutor {
            policy: self.policy,
            name: self.name,
            clock: self.clock,
            predicate,
        }
    }

    /// Name used in log events.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `operation` until it succeeds, returning the error of the last
    /// attempt once the attempts run out.
    pub fn execute<T, E, F>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        P: Retriable<E>,
        E: Display,
    {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 1;

        loop {
            match operation() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(
                            operation = self.name,
                            attempt, "operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(error) if attempt >= max_attempts => {
                    warn!(
                        operation = self.name,
                        attempt,
                        error = %error,
                        "operation failed, no attempts left"
                    );
                    return Err(error);
                }
                Err(error) if !self.predicate.is_retriable(&error) => {
                    debug!(
                        operation = self.name,
                        attempt,
                        error = %error,
                        "operation failed with a non-retriable error"
                    );
                    return Err(error);
                }
                Err(error) => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        operation = self.name,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "operation failed, retrying"
                    );
                    if !delay.is_zero() {
                        self.clock.sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Route every invocation of `operation` through [`execute`](Self::execute).
    pub fn wrap<O>(self, operation: O) -> Retrying<O, C, P> {
        Retrying {
            executor: self,
            operation,
        }
    }
}

/// An operation whose invocations are retried. Arguments are cloned for each
/// attempt.
#[derive(Debug)]
pub struct Retrying<O, C = SystemClock, P = Always> {
    executor: RetryExecutor<C, P>,
    operation: O,
}

impl<O, C, P> Retrying<O, C, P> {
    pub fn executor(&self) -> &RetryExecutor<C, P> {
        &self.executor
    }

    pub fn inner(&self) -> &O {
        &self.operation
    }
}

impl<O, C, P, Args, T, E> Operation<Args> for Retrying<O, C, P>
where
    O: Operation<Args, Output = Result<T, E>>,
    Args: Clone,
    C: Clock,
    P: Retriable<E>,
    E: Display,
{
    type Output = Result<T, E>;

    fn invoke(&mut self, args: Args) -> Result<T, E> {
        let operation = &mut self.operation;
        self.executor.execute(|| operation.invoke(args.clone()))
    }
}
