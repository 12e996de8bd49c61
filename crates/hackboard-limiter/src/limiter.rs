//! Fixed-window rate limiter
//!
//! Keyed counters over a `DashMap`. Every read-modify-write on a record goes
//! through the entry API, so a check can never double-count a key and a reader
//! can never observe a half-updated record. Window expiry is evaluated lazily
//! at the next check against wall-clock time; a background sweep only reclaims
//! memory for keys that went quiet.

use crate::context::RequestContext;
use crate::options::RateLimiterOptions;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// One key's counter for the current window.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    window_start_ms: i64,
    window_end_ms: i64,
}

impl WindowRecord {
    fn open(now_ms: i64, window_ms: i64) -> Self {
        Self {
            count: 0,
            window_start_ms: now_ms,
            window_end_ms: now_ms + window_ms,
        }
    }

    fn expired(&self, now_ms: i64) -> bool {
        now_ms > self.window_end_ms
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    /// Whether the attempt may proceed to business logic
    pub allowed: bool,
    /// Configured maximum for the window
    pub limit: u32,
    /// Attempts left in the current window (0 when denied)
    pub remaining: u32,
    /// Epoch milliseconds at which the current window ends
    pub reset_at_ms: i64,
    /// Whole seconds the caller should wait before retrying (0 when allowed)
    pub retry_after_secs: u64,
    /// Window length in milliseconds
    pub window_ms: u64,
    /// The key this attempt was counted under
    pub key: String,
}

impl RateLimitDecision {
    /// Epoch seconds at which the current window ends.
    #[must_use]
    pub fn reset_at_secs(&self) -> i64 {
        self.reset_at_ms / 1000
    }

    /// Whole seconds until the current window ends, rounded up.
    #[must_use]
    pub fn seconds_until_reset(&self, now_ms: i64) -> u64 {
        let delta = self.reset_at_ms.saturating_sub(now_ms);
        if delta <= 0 {
            0
        } else {
            (delta as u64).div_ceil(1000)
        }
    }
}

/// Keyed fixed-window request limiter.
///
/// Shared by the HTTP middleware and the gateway admission gate; one instance
/// owns the entire counter store.
pub struct RateLimiter {
    options: RateLimiterOptions,
    store: DashMap<String, WindowRecord>,
}

impl RateLimiter {
    /// Create a limiter from validated options.
    #[must_use]
    pub fn new(options: RateLimiterOptions) -> Self {
        Self {
            options,
            store: DashMap::new(),
        }
    }

    /// Create a limiter wrapped in `Arc`.
    #[must_use]
    pub fn new_shared(options: RateLimiterOptions) -> Arc<Self> {
        Arc::new(Self::new(options))
    }

    /// The options this limiter was built with.
    #[must_use]
    pub fn options(&self) -> &RateLimiterOptions {
        &self.options
    }

    /// Derive the key this context would be counted under.
    #[must_use]
    pub fn key_for(&self, ctx: &RequestContext) -> String {
        (self.options.key_fn)(ctx)
    }

    /// Whether completed successful responses should be refunded.
    #[must_use]
    pub fn skips_successful(&self) -> bool {
        self.options.skip_successful_requests
    }

    /// Whether completed failed responses should be refunded.
    #[must_use]
    pub fn skips_failed(&self) -> bool {
        self.options.skip_failed_requests
    }

    /// Run the admission check for one attempt.
    ///
    /// Unless the context is exempted by the skip predicate, the attempt is
    /// counted before the verdict: an over-limit attempt still increments, so
    /// hammering a denied key never shortens its wait.
    pub fn check(&self, ctx: &RequestContext) -> RateLimitDecision {
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = self.options.window.as_millis() as i64;
        let max = self.options.max_requests;

        if let Some(skip_fn) = &self.options.skip_fn {
            if skip_fn(ctx) {
                // Exempt: no stored state is touched for this key.
                return RateLimitDecision {
                    allowed: true,
                    limit: max,
                    remaining: max,
                    reset_at_ms: now_ms + window_ms,
                    retry_after_secs: 0,
                    window_ms: window_ms as u64,
                    key: self.key_for(ctx),
                };
            }
        }

        let key = self.key_for(ctx);

        // Entry guard holds the shard lock for the whole read-modify-write.
        let record = {
            let mut entry = self
                .store
                .entry(key.clone())
                .or_insert_with(|| WindowRecord::open(now_ms, window_ms));
            if entry.expired(now_ms) {
                *entry = WindowRecord::open(now_ms, window_ms);
            }
            entry.count = entry.count.saturating_add(1);
            *entry
        };

        let allowed = record.count <= max;
        let decision = RateLimitDecision {
            allowed,
            limit: max,
            remaining: max.saturating_sub(record.count),
            reset_at_ms: record.window_end_ms,
            retry_after_secs: if allowed {
                0
            } else {
                ((record.window_end_ms - now_ms).max(0) as u64).div_ceil(1000)
            },
            window_ms: window_ms as u64,
            key,
        };

        if !allowed {
            tracing::debug!(
                key = %decision.key,
                count = record.count,
                limit = max,
                retry_after_secs = decision.retry_after_secs,
                "Rate limit exceeded"
            );
            // Fires on every over-limit attempt in the window, not only the
            // first crossing. Called outside the entry guard so the callback
            // may touch the limiter itself.
            if let Some(on_exceeded) = &self.options.on_exceeded {
                on_exceeded(ctx);
            }
        }

        decision
    }

    /// Refund previously counted attempts for a key, flooring at zero.
    ///
    /// Used by the post-completion hook to implement "don't count
    /// successful/failed requests" without intercepting the response path.
    pub fn record_outcome(&self, key: &str, delta: u32) {
        if let Some(mut record) = self.store.get_mut(key) {
            record.count = record.count.saturating_sub(delta);
        }
    }

    /// Current counted attempts for a key, if a window is open.
    #[must_use]
    pub fn current_count(&self, key: &str) -> Option<u32> {
        self.store.get(key).map(|record| record.count)
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }

    /// Delete every record whose window has expired. Returns removed count.
    ///
    /// Removal races harmlessly with `check`: a concurrent check either sees
    /// the record before removal and revives it in place, or misses it and
    /// lazily creates a fresh one.
    pub fn sweep(&self) -> usize {
        let now_ms = Utc::now().timestamp_millis();
        let before = self.store.len();
        self.store.retain(|_, record| !record.expired(now_ms));
        let removed = before - self.store.len();

        if removed > 0 {
            tracing::debug!(removed, remaining = self.store.len(), "Swept expired rate limit records");
        }

        removed
    }

    /// Spawn the periodic sweep task.
    ///
    /// The returned handle aborts the task on `stop()` or drop, so tests can
    /// create and tear down limiters without leaking timers.
    pub fn start_sweeper(self: &Arc<Self>, every: Duration) -> SweeperHandle {
        let limiter = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut tick = interval(every);
            // First tick completes immediately; skip it.
            tick.tick().await;
            loop {
                tick.tick().await;
                limiter.sweep();
            }
        });

        tracing::info!(interval_secs = every.as_secs(), "Rate limit sweeper started");

        SweeperHandle { task }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("options", &self.options)
            .field("tracked_keys", &self.store.len())
            .finish()
    }
}

/// Handle to the background sweep task.
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweep task.
    pub fn stop(&self) {
        self.task.abort();
        tracing::info!("Rate limit sweeper stopped");
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
