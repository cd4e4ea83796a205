//! Bounded retry with backoff for remote calls
//!
//! The retry policy lives at the call site, never inside the core logic:
//! callers wrap the one client call they want retried.

use crate::{Result, SolaceError};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Chat submissions: one retry after a short backoff
    pub fn chat() -> Self {
        Self::new(2, Duration::from_millis(500))
    }

    /// One-shot calls where the caller has its own fallback
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `op`, retrying transient failures with doubling delays.
    ///
    /// Only `RequestFailure` and `ConnectionError` are retried; validation
    /// and storage errors surface immediately.
    pub fn run<T>(&self, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let mut delay = self.base_delay;
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let transient = matches!(
                        err,
                        SolaceError::RequestFailure(_) | SolaceError::ConnectionError(_)
                    );
                    if !transient || attempt >= self.max_attempts {
                        return Err(err);
                    }
                    warn!(attempt, "remote call failed, retrying: {}", err);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flaky(fail_times: u32) -> impl FnMut() -> Result<u32> {
        let mut calls = 0;
        move || {
            calls += 1;
            if calls <= fail_times {
                Err(SolaceError::RequestFailure("transient".to_string()))
            } else {
                Ok(calls)
            }
        }
    }

    #[test]
    fn test_succeeds_after_transient_failure() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        assert_eq!(policy.run(flaky(1)).unwrap(), 2);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let result = policy.run(flaky(5));
        assert!(matches!(result, Err(SolaceError::RequestFailure(_))));
    }

    #[test]
    fn test_does_not_retry_validation_errors() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let mut calls = 0;
        let result: Result<()> = policy.run(|| {
            calls += 1;
            Err(SolaceError::ValidationError("bad input".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_single_attempt_policy() {
        let policy = RetryPolicy::none();
        let result = policy.run(flaky(1));
        assert!(result.is_err());
    }
}
