// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Retry with bounded exponential backoff

use std::{fmt::Display, time::Duration};

use serde::{Deserialize, Serialize};
use tokio_retry::RetryIf;
use tracing::warn;

/// Attempt ceiling and backoff bounds
///
/// The first retry waits `min_delay`; each following retry doubles the previous delay,
/// capped at `max_delay`. `attempts` counts the initial call, so `attempts = 1` never
/// retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    attempts: u32,
    min_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Create a retry policy
    ///
    /// An attempt ceiling of zero is raised to one, and a maximum below the minimum is
    /// raised to the minimum.
    pub fn new(attempts: u32, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// A policy that performs exactly one attempt
    pub const fn no_retry() -> Self {
        Self {
            attempts: 1,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Total number of attempts, including the first
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before the first retry
    pub const fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Upper bound for any delay
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Delays slept between consecutive attempts
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let max_delay = self.max_delay;
        std::iter::successors(Some(self.min_delay), |delay| Some(delay.saturating_mul(2)))
            .map(move |delay| delay.min(max_delay))
            .take(self.attempts.saturating_sub(1) as usize)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250), Duration::from_millis(1500))
    }
}

/// Run `operation` until it succeeds, returns an error rejected by `should_retry`, or the
/// attempt ceiling of `policy` is reached
///
/// The last error is returned unchanged when every attempt fails.
pub async fn attempt<T, E, A, F, C>(policy: &RetryPolicy, operation: A, mut should_retry: C) -> Result<T, E>
where
    A: FnMut() -> F,
    F: Future<Output = Result<T, E>>,
    C: FnMut(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut failed_attempts = 0_u32;

    RetryIf::spawn(policy.delays(), operation, move |error: &E| {
        failed_attempts += 1;
        let retry = should_retry(error);
        if retry && failed_attempts < max_attempts {
            warn!(
                attempt = failed_attempts,
                max_attempts,
                error = %error,
                "attempt failed, retrying"
            );
        }
        retry
    })
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(250), Duration::from_millis(1500))
    }

    async fn fail_times(
        policy: &RetryPolicy,
        failures: u32,
        error: fn() -> TestError,
    ) -> (Result<&'static str, TestError>, u32) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = attempt(
            policy,
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    let call = counter.fetch_add(1, Ordering::SeqCst);
                    if call < failures { Err(error()) } else { Ok("done") }
                }
            },
            |error: &TestError| *error == TestError::Transient,
        )
        .await;

        (result, calls.load(Ordering::SeqCst))
    }

    #[test]
    fn delays_double_and_cap() {
        let delays: Vec<_> = policy(6).delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![250, 500, 1000, 1500, 1500]);
    }

    #[test]
    fn single_attempt_has_no_delays() {
        assert_eq!(policy(1).delays().count(), 0);
        assert_eq!(RetryPolicy::no_retry().delays().count(), 0);
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).attempts(), 1);
    }

    #[test]
    fn max_is_never_below_min() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500), Duration::from_millis(100));
        assert_eq!(policy.max_delay(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let (result, calls) = fail_times(&policy(3), 2, || TestError::Transient).await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fails_after_exactly_ceiling_attempts() {
        let (result, calls) = fail_times(&policy(3), 3, || TestError::Transient).await;
        assert_eq!(result, Err(TestError::Transient));
        assert_eq!(calls, 3);

        let (result, calls) = fail_times(&policy(4), 10, || TestError::Transient).await;
        assert_eq!(result, Err(TestError::Transient));
        assert_eq!(calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_stops_immediately() {
        let (result, calls) = fail_times(&policy(5), 5, || TestError::Fatal).await;
        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_backoff_between_attempts() {
        let started = tokio::time::Instant::now();
        let (result, _) = fail_times(&policy(3), 2, || TestError::Transient).await;
        assert!(result.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(750));
    }
}
