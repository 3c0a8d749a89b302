// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixed-window wallet creation limiter.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use super::store::{CounterStore, StoreError};
use crate::config::{DEFAULT_RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW_SECS};

/// Key namespace for wallet creation counters.
pub const WALLET_KEY_PREFIX: &str = "ratelimit:wallet:";

/// Limiter parameters.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests admitted per client per window.
    pub max_requests: u64,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window_secs: RATE_LIMIT_WINDOW_SECS,
        }
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u64,
    /// Unix timestamp in milliseconds at which the window resets.
    pub reset_time: i64,
}

impl RateLimitDecision {
    /// Decision used when the counter store cannot be reached.
    pub fn fail_open(config: &RateLimitConfig, now_ms: i64) -> Self {
        Self {
            allowed: true,
            remaining: config.max_requests,
            reset_time: now_ms + window_ms(config.window_secs),
        }
    }
}

/// Per-IP fixed window limiter over a shared [`CounterStore`].
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn limit(&self) -> u64 {
        self.config.max_requests
    }

    /// Check and count one request from `ip`, surfacing store failures.
    pub async fn try_check(&self, ip: &str) -> Result<RateLimitDecision, StoreError> {
        let key = counter_key(ip);
        let limit = self.config.max_requests;

        let state = self
            .store
            .acquire(&key, limit, self.config.window_secs)
            .await?;

        let now_ms = Utc::now().timestamp_millis();
        let window_end = now_ms + window_ms(self.config.window_secs);

        if !state.admitted {
            let reset_time = match state.ttl_secs {
                Some(ttl) => now_ms + (ttl as i64) * 1000,
                None => window_end,
            };
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_time,
            });
        }

        Ok(RateLimitDecision {
            allowed: true,
            remaining: limit.saturating_sub(state.count),
            reset_time: window_end,
        })
    }

    /// Check and count one request from `ip`.
    ///
    /// Never fails: if the counter store errors the request is admitted with
    /// the full quota reported as remaining.
    pub async fn check_rate_limit(&self, ip: &str) -> RateLimitDecision {
        match self.try_check(ip).await {
            Ok(decision) => {
                debug!(
                    ip,
                    allowed = decision.allowed,
                    remaining = decision.remaining,
                    "Rate limit checked"
                );
                decision
            }
            Err(e) => {
                warn!(
                    ip,
                    backend = self.store.backend(),
                    error = %e,
                    "Rate limit store unavailable, allowing request"
                );
                RateLimitDecision::fail_open(&self.config, Utc::now().timestamp_millis())
            }
        }
    }
}

/// Store key for a client IP.
pub fn counter_key(ip: &str) -> String {
    format!("{WALLET_KEY_PREFIX}{ip}")
}

fn window_ms(window_secs: u64) -> i64 {
    (window_secs as i64) * 1000
}

/// Human readable time until `reset_ms`, e.g. `"3 hours and 12 minutes"`.
pub fn reset_time_string(reset_ms: i64, now_ms: i64) -> String {
    let diff_ms = (reset_ms - now_ms).max(0);
    let hours = diff_ms / (1000 * 60 * 60);
    let minutes = (diff_ms % (1000 * 60 * 60)) / (1000 * 60);

    let plural = |n: i64| if n > 1 { "s" } else { "" };
    if hours > 0 {
        format!(
            "{hours} hour{} and {minutes} minute{}",
            plural(hours),
            plural(minutes)
        )
    } else {
        format!("{minutes} minute{}", plural(minutes))
    }
}

/// Whole seconds until `reset_ms`, rounded up.
pub fn seconds_until(reset_ms: i64, now_ms: i64) -> u64 {
    let diff = (reset_ms - now_ms).max(0) as u64;
    diff.div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::store::{MemoryCounterStore, WindowState};
    use async_trait::async_trait;

    struct UnreachableStore;

    #[async_trait]
    impl CounterStore for UnreachableStore {
        async fn acquire(&self, _: &str, _: u64, _: u64) -> Result<WindowState, StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }

        fn backend(&self) -> &'static str {
            "unreachable"
        }
    }

    fn limiter_with(store: Arc<dyn CounterStore>, max_requests: u64) -> RateLimiter {
        RateLimiter::new(
            store,
            RateLimitConfig {
                max_requests,
                window_secs: RATE_LIMIT_WINDOW_SECS,
            },
        )
    }

    #[tokio::test]
    async fn admits_exactly_limit_requests_then_rejects() {
        let store = Arc::new(MemoryCounterStore::new());
        let limiter = limiter_with(store.clone(), 3);

        let mut remaining = Vec::new();
        for _ in 0..3 {
            let decision = limiter.check_rate_limit("10.0.0.1").await;
            assert!(decision.allowed);
            remaining.push(decision.remaining);
        }
        assert_eq!(remaining, vec![2, 1, 0]);

        let rejected = limiter.check_rate_limit("10.0.0.1").await;
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(store.count(&counter_key("10.0.0.1")), 3);
    }

    #[tokio::test]
    async fn rejected_requests_do_not_change_state() {
        let store = Arc::new(MemoryCounterStore::new());
        let limiter = limiter_with(store.clone(), 1);

        limiter.check_rate_limit("10.0.0.2").await;
        let first = limiter.check_rate_limit("10.0.0.2").await;
        let second = limiter.check_rate_limit("10.0.0.2").await;

        assert!(!first.allowed && !second.allowed);
        assert_eq!(first.remaining, second.remaining);
        assert_eq!(store.count(&counter_key("10.0.0.2")), 1);
    }

    #[tokio::test]
    async fn reset_time_is_within_one_window() {
        let limiter = limiter_with(Arc::new(MemoryCounterStore::new()), 5);
        let before = Utc::now().timestamp_millis();
        let decision = limiter.check_rate_limit("10.0.0.3").await;
        let after = Utc::now().timestamp_millis();

        assert!(decision.reset_time >= before + 86_400_000 - 1000);
        assert!(decision.reset_time <= after + 86_400_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_admit_exactly_the_limit() {
        let limit = 10;
        let extra = 7;
        let store = Arc::new(MemoryCounterStore::new());
        let limiter = limiter_with(store.clone(), limit);

        let handles: Vec<_> = (0..limit + extra)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check_rate_limit("10.0.0.4").await })
            })
            .collect();

        let mut allowed = 0;
        let mut denied = 0;
        for handle in handles {
            if handle.await.unwrap().allowed {
                allowed += 1;
            } else {
                denied += 1;
            }
        }

        assert_eq!(allowed, limit);
        assert_eq!(denied, extra);
        assert_eq!(store.count(&counter_key("10.0.0.4")), limit);
    }

    #[tokio::test]
    async fn store_failure_fails_open_with_full_quota() {
        let limiter = limiter_with(Arc::new(UnreachableStore), 20);

        assert!(limiter.try_check("10.0.0.5").await.is_err());

        let decision = limiter.check_rate_limit("10.0.0.5").await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 20);
        assert!(decision.reset_time > Utc::now().timestamp_millis());
    }

    #[test]
    fn counter_key_uses_wallet_namespace() {
        assert_eq!(counter_key("1.2.3.4"), "ratelimit:wallet:1.2.3.4");
        assert_eq!(counter_key("unknown IP"), "ratelimit:wallet:unknown IP");
    }

    #[test]
    fn reset_time_string_formats_hours_and_minutes() {
        let now = 0;
        let hour = 60 * 60 * 1000;
        let minute = 60 * 1000;
        assert_eq!(
            reset_time_string(2 * hour + 30 * minute, now),
            "2 hours and 30 minutes"
        );
        assert_eq!(reset_time_string(hour + minute, now), "1 hour and 1 minute");
        assert_eq!(reset_time_string(5 * minute, now), "5 minutes");
        assert_eq!(reset_time_string(30_000, now), "0 minute");
    }

    #[test]
    fn seconds_until_rounds_up() {
        assert_eq!(seconds_until(1_500, 0), 2);
        assert_eq!(seconds_until(2_000, 0), 2);
        assert_eq!(seconds_until(0, 5_000), 0);
    }
}
