use ahash::AHashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;

/// Longest window a quota may use; longer ones are clamped to it.
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Allowance applied to each key: `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub max_requests: u32,
    pub window: Duration,
}

impl Quota {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window }
    }
}

impl Default for Quota {
    /// 3 requests per hour
    fn default() -> Self {
        Self { max_requests: 3, window: Duration::from_secs(60 * 60) }
    }
}

impl From<&RateLimitConfig> for Quota {
    fn from(cfg: &RateLimitConfig) -> Self {
        Self { max_requests: cfg.max_requests, window: cfg.window() }
    }
}

/// Counter state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: Instant,
}

impl RateLimitEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.reset_at < now
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed to proceed.
    Allowed {
        /// Maximum number of requests allowed in the window
        limit: u32,
        /// Number of requests remaining in the current window
        remaining: u32,
        /// End of the current window
        reset_at: Instant,
    },
    /// Request is rate limited and should be rejected.
    Limited {
        /// Maximum number of requests allowed in the window
        limit: u32,
        /// Number of requests remaining (always 0)
        remaining: u32,
        /// End of the current window, unchanged by the denial
        reset_at: Instant,
        /// Time until the window ends
        reset_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }

    pub fn is_limited(&self) -> bool {
        matches!(self, RateLimitResult::Limited { .. })
    }

    pub fn limit(&self) -> u32 {
        match self {
            RateLimitResult::Allowed { limit, .. } => *limit,
            RateLimitResult::Limited { limit, .. } => *limit,
        }
    }

    pub fn remaining(&self) -> u32 {
        match self {
            RateLimitResult::Allowed { remaining, .. } => *remaining,
            RateLimitResult::Limited { remaining, .. } => *remaining,
        }
    }

    pub fn reset_at(&self) -> Instant {
        match self {
            RateLimitResult::Allowed { reset_at, .. } => *reset_at,
            RateLimitResult::Limited { reset_at, .. } => *reset_at,
        }
    }

    /// Get the reset duration if limited.
    pub fn reset_after(&self) -> Option<Duration> {
        match self {
            RateLimitResult::Limited { reset_after, .. } => Some(*reset_after),
            _ => None,
        }
    }
}

/// Fixed-window rate limiter keyed by client identifier.
///
/// The whole read-modify-write of a check happens under one lock, so two
/// concurrent requests for the same key can never both observe
/// `count < max` and push the count past the quota.
pub struct RateLimiter {
    entries: Mutex<AHashMap<String, RateLimitEntry>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { entries: Mutex::new(AHashMap::new()), clock }
    }

    /// Record a request for `key` and decide whether it may proceed.
    pub fn check(&self, key: &str, quota: Quota) -> RateLimitResult {
        let now = self.clock.now();
        let mut entries = self.lock();

        if let Some(entry) = entries.get_mut(key).filter(|e| !e.is_expired(now)) {
            if entry.count < quota.max_requests {
                entry.count = entry.count.saturating_add(1);
                return RateLimitResult::Allowed {
                    limit: quota.max_requests,
                    remaining: quota.max_requests.saturating_sub(entry.count),
                    reset_at: entry.reset_at,
                };
            }
            return RateLimitResult::Limited {
                limit: quota.max_requests,
                remaining: 0,
                reset_at: entry.reset_at,
                reset_after: entry.reset_at.saturating_duration_since(now),
            };
        }

        // New key, or the previous window has passed: start a fresh one.
        let reset_at = now
            .checked_add(quota.window.min(MAX_WINDOW))
            .unwrap_or(now);
        entries.insert(key.to_string(), RateLimitEntry { count: 1, reset_at });
        RateLimitResult::Allowed {
            limit: quota.max_requests,
            remaining: quota.max_requests.saturating_sub(1),
            reset_at,
        }
    }

    /// Current entry for `key`, without recording a request.
    pub fn peek(&self, key: &str) -> Option<RateLimitEntry> {
        self.lock().get(key).copied()
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    /// Drop every entry whose window has passed.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(entries.len());
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "swept expired rate limit entries");
        }
        removed
    }

    /// Spawn the periodic sweep.
    ///
    /// The first sweep runs one `interval` after spawning. The task ends when
    /// `shutdown` is cancelled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        limiter.sweep();
                    }
                    _ = shutdown.cancelled() => {
                        debug!("rate limit sweeper shutting down");
                        break;
                    }
                }
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, AHashMap<String, RateLimitEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("rate limiter lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
