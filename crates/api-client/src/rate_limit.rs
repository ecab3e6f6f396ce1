// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Fixed window rate limiting for outbound calls
//!
//! A key may consume at most `points` permits per window of `duration`. Consumption is
//! synchronous and never waits: a denied call fails immediately with
//! [`ApiError::RateExceeded`] and does not count against the window.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Key shared by every outbound upstream call
pub const GLOBAL_RATE_LIMIT_KEY: &str = "global";

const MAX_RATE_LIMIT_ENTRIES: usize = 10_000;

/// Quota settings for a [`RateLimiter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Permits available per window
    pub points: u32,
    /// Window length
    pub duration: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            points: 10,
            duration: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
struct WindowCounter {
    consumed: u32,
    window_start: Instant,
}

/// Process-wide fixed window limiter keyed by caller identifier
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, WindowCounter>,
}

impl RateLimiter {
    /// Create a limiter with the given quota
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Quota this limiter enforces
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Consume one permit for `key`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RateExceeded` when the current window has no permits left.
    pub fn consume(&self, key: &str) -> Result<(), ApiError> {
        let now = Instant::now();

        if self.windows.len() > MAX_RATE_LIMIT_ENTRIES {
            self.cleanup_expired_windows(now);
        }

        // The entry guard holds the shard lock, so check and increment are atomic per key
        let mut counter = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| WindowCounter {
                consumed: 0,
                window_start: now,
            });

        if now.duration_since(counter.window_start) >= self.config.duration {
            counter.consumed = 0;
            counter.window_start = now;
        }

        if counter.consumed >= self.config.points {
            let retry_after = self
                .config
                .duration
                .saturating_sub(now.duration_since(counter.window_start));
            drop(counter);

            let retry_after_ms = u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX);
            warn!(key, retry_after_ms, "outbound rate limit exceeded");
            return Err(ApiError::RateExceeded {
                key: key.to_string(),
                retry_after_ms,
            });
        }

        counter.consumed += 1;
        debug!(
            key,
            consumed = counter.consumed,
            points = self.config.points,
            "rate limit permit consumed"
        );
        Ok(())
    }

    /// Permits left for `key` in the current window
    pub fn remaining(&self, key: &str) -> u32 {
        let Some(counter) = self.windows.get(key) else {
            return self.config.points;
        };

        if counter.window_start.elapsed() >= self.config.duration {
            self.config.points
        } else {
            self.config.points.saturating_sub(counter.consumed)
        }
    }

    /// Forget the window for `key`
    pub fn reset(&self, key: &str) {
        self.windows.remove(key);
    }

    fn cleanup_expired_windows(&self, now: Instant) {
        let before = self.windows.len();
        self.windows
            .retain(|_, counter| now.duration_since(counter.window_start) < self.config.duration);
        let cleaned_up = before.saturating_sub(self.windows.len());

        if cleaned_up > 0 {
            debug!(cleaned_up, "cleaned up expired rate limiter windows");
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    fn limiter(points: u32, duration: Duration) -> RateLimiter {
        RateLimiter::new(RateLimitConfig { points, duration })
    }

    #[test]
    fn rejects_after_quota() {
        let limiter = limiter(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limiter.consume(GLOBAL_RATE_LIMIT_KEY).is_ok());
        }

        let error = limiter.consume(GLOBAL_RATE_LIMIT_KEY).unwrap_err();
        assert!(matches!(error, ApiError::RateExceeded { ref key, .. } if key == "global"));
        assert_eq!(limiter.remaining(GLOBAL_RATE_LIMIT_KEY), 0);
    }

    #[test]
    fn denied_calls_do_not_count() {
        let limiter = limiter(1, Duration::from_millis(50));

        assert!(limiter.consume("k").is_ok());
        for _ in 0..5 {
            assert!(limiter.consume("k").is_err());
        }

        thread::sleep(Duration::from_millis(60));

        assert!(limiter.consume("k").is_ok());
    }

    #[test]
    fn window_resets_after_duration() {
        let limiter = limiter(2, Duration::from_millis(30));

        assert!(limiter.consume("k").is_ok());
        assert!(limiter.consume("k").is_ok());
        assert!(limiter.consume("k").is_err());

        thread::sleep(Duration::from_millis(40));

        assert_eq!(limiter.remaining("k"), 2);
        assert!(limiter.consume("k").is_ok());
        assert_eq!(limiter.remaining("k"), 1);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter(1, Duration::from_secs(60));

        assert!(limiter.consume("a").is_ok());
        assert!(limiter.consume("b").is_ok());
        assert!(limiter.consume("a").is_err());

        limiter.reset("a");
        assert!(limiter.consume("a").is_ok());
    }

    #[test]
    fn concurrent_consumers_never_exceed_quota() {
        let limiter = Arc::new(limiter(50, Duration::from_secs(60)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || {
                    (0..20)
                        .filter(|_| limiter.consume(GLOBAL_RATE_LIMIT_KEY).is_ok())
                        .count()
                })
            })
            .collect();

        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 50);
        assert_eq!(limiter.remaining(GLOBAL_RATE_LIMIT_KEY), 0);
    }
}
