//! Call-shaping middleware: a blocking rate limiter and a bounded retry loop.
//!
//! Both wrap any [`Operation`] and can be nested. The usual order puts the
//! limiter inside the retry so that every attempt is gated:
//!
//! ```
//! use std::time::Duration;
//! use llm_starter_kit::middleware::{Operation, RateLimiter, retry};
//!
//! # fn main() -> Result<(), llm_starter_kit::ConfigurationError> {
//! let limiter = RateLimiter::new(5, Duration::from_secs(10))?;
//! let mut call = retry(3, Duration::ZERO)?
//!     .wrap(limiter.wrap(|n: u32| Ok::<_, String>(n + 1)));
//!
//! assert_eq!(call.invoke(41), Ok(42));
//! # Ok(())
//! # }
//! ```

mod clock;
mod operation;
mod rate_limit;
mod retry;

use std::time::Duration;

use crate::error::ConfigurationError;

pub use clock::{Clock, MockClock, SystemClock};
pub use operation::Operation;
pub use rate_limit::{Gate, RateLimited, RateLimiter, SharedRateLimiter, WindowPolicy};
pub use retry::{Always, Backoff, Retriable, RetryExecutor, RetryPolicy, Retrying, retry};

/// Convert user-supplied float seconds, rejecting negative and non-finite values.
pub(crate) fn duration_from_secs(
    field: &'static str,
    value: f64,
) -> Result<Duration, ConfigurationError> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| ConfigurationError::InvalidSeconds { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(
            duration_from_secs("delay", 1.5).ok(),
            Some(Duration::from_millis(1500))
        );
        assert!(duration_from_secs("delay", -1.0).is_err());
        assert!(duration_from_secs("delay", f64::INFINITY).is_err());
        assert!(duration_from_secs("delay", f64::NAN).is_err());
    }
}
