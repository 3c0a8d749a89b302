// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Counter storage backends for the fixed-window rate limiter.
//!
//! Every backend performs the read / compare / increment / expire sequence as
//! one atomic step so that concurrent requests from the same client are
//! serialized by the store rather than by the application:
//!
//! - [`RedisCounterStore`] runs the sequence as a Lua script on the server
//! - [`MemoryCounterStore`] runs it under a single mutex (single instance only)

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Upper bound on a single store round trip before the limiter gives up.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors talking to the counter store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("counter store connection failed: {0}")]
    Connection(String),

    #[error("counter store command failed: {0}")]
    Command(String),

    #[error("counter store timed out after {0:?}")]
    Timeout(Duration),
}

/// Counter state observed by one acquire attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Whether the counter was incremented for this request.
    pub admitted: bool,
    /// Counter value after the attempt.
    pub count: u64,
    /// Remaining lifetime of the key before the attempt, if it had one.
    pub ttl_secs: Option<u64>,
}

/// Storage for fixed-window counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically admit one request against `key`.
    ///
    /// Reads the current count (absent counts as zero) and the key's TTL. If
    /// the count has reached `limit` nothing is written. Otherwise the count
    /// is incremented and, when the key was just created, its expiry is set
    /// to `window_secs`.
    async fn acquire(
        &self,
        key: &str,
        limit: u64,
        window_secs: u64,
    ) -> Result<WindowState, StoreError>;

    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;
}

const ACQUIRE_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
local ttl = redis.call('TTL', KEYS[1])
if current >= tonumber(ARGV[1]) then
  return {0, current, ttl}
end
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('EXPIRE', KEYS[1], ARGV[2])
end
return {1, count, ttl}
"#;

/// Redis backed counter store.
///
/// The connection is established lazily on first use and retried on the next
/// call if it fails, so an unavailable Redis at startup does not prevent the
/// server from booting.
pub struct RedisCounterStore {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    script: redis::Script,
    timeout: Duration,
}

impl RedisCounterStore {
    /// Create a store for `url` without connecting.
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            script: redis::Script::new(ACQUIRE_SCRIPT),
            timeout: DEFAULT_STORE_TIMEOUT,
        })
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(|e| StoreError::Connection(e.to_string()))?;
                info!("Connected to Redis rate limit store");
                Ok::<_, StoreError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }

    async fn run_acquire(
        &self,
        key: &str,
        limit: u64,
        window_secs: u64,
    ) -> Result<WindowState, StoreError> {
        let mut conn = self.connection().await?;

        let (admitted, count, ttl): (i64, i64, i64) = self
            .script
            .key(key)
            .arg(limit)
            .arg(window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))?;

        debug!(key, admitted, count, ttl, "Redis acquire");

        Ok(WindowState {
            admitted: admitted == 1,
            count: count.max(0) as u64,
            // TTL is -2 for a missing key and -1 for a key without expiry.
            ttl_secs: (ttl > 0).then_some(ttl as u64),
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn acquire(
        &self,
        key: &str,
        limit: u64,
        window_secs: u64,
    ) -> Result<WindowState, StoreError> {
        tokio::time::timeout(self.timeout, self.run_acquire(key, limit, window_secs))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

struct CounterEntry {
    count: u64,
    expires_at: Option<Instant>,
}

/// Map size at which `acquire` first sweeps out expired entries.
const SWEEP_THRESHOLD: usize = 1024;

struct MemoryEntries {
    map: HashMap<String, CounterEntry>,
    /// Size at which the next sweep runs. Doubles with the live set so the
    /// sweep cost stays amortized.
    sweep_at: usize,
}

impl Default for MemoryEntries {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            sweep_at: SWEEP_THRESHOLD,
        }
    }
}

impl MemoryEntries {
    fn sweep(&mut self, now: Instant) {
        let before = self.map.len();
        self.map.retain(|_, e| e.expires_at.is_none_or(|at| at > now));
        self.sweep_at = (self.map.len() * 2).max(SWEEP_THRESHOLD);
        debug!(
            removed = before - self.map.len(),
            live = self.map.len(),
            "Swept expired rate limit counters"
        );
    }
}

/// In-process counter store for development and single-instance deployments.
///
/// Expired counters are dropped when their key is seen again and in bulk
/// whenever the map grows past the sweep threshold.
#[derive(Default)]
pub struct MemoryCounterStore {
    entries: Mutex<MemoryEntries>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of counters currently held, expired or not.
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryEntries> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Current count for `key`, ignoring expired entries.
    pub fn count(&self, key: &str) -> u64 {
        self.lock()
            .map
            .get(key)
            .filter(|e| e.expires_at.is_none_or(|at| at > Instant::now()))
            .map(|e| e.count)
            .unwrap_or(0)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn acquire(
        &self,
        key: &str,
        limit: u64,
        window_secs: u64,
    ) -> Result<WindowState, StoreError> {
        let now = Instant::now();
        let mut guard = self.lock();
        if guard.map.len() >= guard.sweep_at {
            guard.sweep(now);
        }
        let entries = &mut guard.map;

        if entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| at <= now)
        {
            entries.remove(key);
        }

        let entry = entries.entry(key.to_string()).or_insert(CounterEntry {
            count: 0,
            expires_at: None,
        });

        let ttl_secs = entry
            .expires_at
            .map(|at| at.saturating_duration_since(now).as_secs())
            .filter(|secs| *secs > 0);

        if entry.count >= limit {
            return Ok(WindowState {
                admitted: false,
                count: entry.count,
                ttl_secs,
            });
        }

        entry.count += 1;
        if entry.count == 1 {
            entry.expires_at = Some(now + Duration::from_secs(window_secs));
        }

        Ok(WindowState {
            admitted: true,
            count: entry.count,
            ttl_secs,
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
