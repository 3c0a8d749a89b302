// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Rate Limiting
//!
//! Fixed-window, per-IP quota for wallet creation endpoints.
//!
//! ## Policy
//!
//! - One counter per client IP under `ratelimit:wallet:<ip>`
//! - Window of 24 hours, started by the first request
//! - Requests over quota are rejected without being counted
//! - If the counter store is unreachable the request is admitted (fail-open)

pub mod limiter;
pub mod store;

use std::sync::Arc;

use tracing::{info, warn};

pub use limiter::{
    counter_key, reset_time_string, seconds_until, RateLimitConfig, RateLimitDecision,
    RateLimiter,
};
pub use store::{CounterStore, MemoryCounterStore, RedisCounterStore, StoreError, WindowState};

/// Select the counter store for this process.
///
/// Uses Redis when a URL is configured. A malformed URL or a missing one falls
/// back to the in-process store, which only limits correctly for a single
/// server instance.
pub fn build_store(redis_url: Option<&str>) -> Arc<dyn CounterStore> {
    match redis_url {
        Some(url) => match RedisCounterStore::new(url) {
            Ok(store) => {
                info!("Rate limiting backed by Redis");
                Arc::new(store)
            }
            Err(e) => {
                warn!(error = %e, "Invalid REDIS_URL, using in-process rate limit store");
                Arc::new(MemoryCounterStore::new())
            }
        },
        None => {
            warn!("REDIS_URL not set, using in-process rate limit store");
            Arc::new(MemoryCounterStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_store_picks_backend_from_url() {
        assert_eq!(build_store(None).backend(), "memory");
        assert_eq!(
            build_store(Some("redis://127.0.0.1:6379")).backend(),
            "redis"
        );
        assert_eq!(build_store(Some("::bad::")).backend(), "memory");
    }
}
