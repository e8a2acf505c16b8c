//! Activity tracking used to bound the limiter's memory.
//!
//! The limiter keeps a window for every key it has ever seen until told
//! otherwise. The tracker records when each key was last seen and the sweeper
//! periodically evicts limiter windows for keys that went quiet.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::limiter::RateLimiter;

/// Last-seen timestamps per key.
pub struct ActivityTracker<K = i64> {
    last_seen: DashMap<K, Instant>,
}

impl<K> ActivityTracker<K>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            last_seen: DashMap::new(),
        }
    }

    /// Mark `key` as seen now.
    pub fn touch(&self, key: &K) {
        self.last_seen.insert(key.clone(), Instant::now());
    }

    /// Keys seen within `ttl`. Older keys are forgotten.
    pub fn active_keys(&self, ttl: Duration) -> HashSet<K> {
        let now = Instant::now();
        self.last_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) < ttl);
        self.last_seen.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}

impl<K> Default for ActivityTracker<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Run one sweep: evict limiter windows for keys idle longer than `ttl`.
///
/// Windows still holding an admission survive even if their key went quiet.
pub fn sweep<K>(limiter: &RateLimiter<K>, tracker: &ActivityTracker<K>, ttl: Duration) -> usize
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    let active = tracker.active_keys(ttl);
    let removed = limiter.evict_idle(&active);
    debug!(
        active = active.len(),
        removed,
        "Rate limit sweep finished"
    );
    removed
}

/// Spawn a background task that sweeps every `interval`.
///
/// The task exits once `shutdown` completes.
pub fn spawn_sweeper<K, F>(
    limiter: Arc<RateLimiter<K>>,
    tracker: Arc<ActivityTracker<K>>,
    interval: Duration,
    ttl: Duration,
    shutdown: F,
) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        interval_secs = interval.as_secs(),
        ttl_secs = ttl.as_secs(),
        "Starting rate limit sweeper"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweep(&limiter, &tracker, ttl);
                }
                _ = &mut shutdown => {
                    info!("Rate limit sweeper stopped");
                    break;
                }
            }
        }
    })
}
