//! Per-key sliding window rate limiter.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, info, trace};

use super::window::KeyWindow;
use crate::error::{GeofactError, Result};

/// Admission controller that allows at most `max_rate` events per key in any
/// trailing `window`.
///
/// Windows are created lazily on first reference to a key and live until
/// [`RateLimiter::cleanup`] evicts them. This struct is thread-safe and is
/// meant to be shared behind an `Arc`.
pub struct RateLimiter<K = i64> {
    /// Admission windows indexed by key
    windows: DashMap<K, Arc<KeyWindow>>,
    /// Admissions allowed per window
    max_rate: usize,
    /// Length of the trailing window
    window: Duration,
}

impl<K> RateLimiter<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Create a rate limiter.
    ///
    /// Fails if `max_rate` is zero or `window` is empty.
    pub fn new(max_rate: usize, window: Duration) -> Result<Self> {
        if max_rate == 0 {
            return Err(GeofactError::RateLimit(
                "max_rate must be greater than zero".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(GeofactError::RateLimit(
                "window duration must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            windows: DashMap::new(),
            max_rate,
            window,
        })
    }

    /// Whether `key` may be admitted right now.
    ///
    /// Creates the window for `key` if needed but never consumes a slot.
    pub fn has_capacity(&self, key: &K) -> bool {
        let allowed = self.window_for(key).has_capacity();
        trace!(key = ?key, allowed, "Checked rate limit capacity");
        allowed
    }

    /// Wait until `key` has a free slot, then record one admission.
    ///
    /// Only the calling task waits; other keys are unaffected. Concurrent
    /// callers for the same key are admitted one at a time in the order they
    /// started waiting. Cancelling the future before it resolves leaves no
    /// trace.
    pub async fn acquire(&self, key: &K) {
        let window = self.window_for(key);
        window.admit().await;
        trace!(key = ?key, "Admission recorded");
    }

    /// Evict every window whose key is not in `active_keys`.
    ///
    /// Returns the number of windows removed.
    pub fn cleanup(&self, active_keys: &HashSet<K>) -> usize {
        let mut removed = 0;
        self.windows.retain(|key, _| {
            let keep = active_keys.contains(key);
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            info!(removed, remaining = self.windows.len(), "Cleaned up inactive rate limit windows");
        }
        removed
    }

    /// Evict windows whose key is not in `active_keys` and that hold no
    /// live admissions.
    ///
    /// A window still counting an admission, or one an `acquire` is holding,
    /// is kept even when its key is missing from `active_keys`. The check runs
    /// under the map's shard lock, so a key that became busy after
    /// `active_keys` was computed is never dropped. Returns the number of
    /// windows removed.
    pub fn evict_idle(&self, active_keys: &HashSet<K>) -> usize {
        let mut removed = 0;
        self.windows.retain(|key, window| {
            let keep = active_keys.contains(key)
                || Arc::strong_count(window) > 1
                || window.current_count() > 0;
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            info!(removed, remaining = self.windows.len(), "Evicted idle rate limit windows");
        }
        removed
    }

    /// How long `key` has to wait before an admission would succeed.
    pub fn time_until_capacity(&self, key: &K) -> Duration {
        self.window_for(key).time_until_capacity()
    }

    /// Admissions currently counted against `key`.
    ///
    /// Returns `None` if no window exists for the key.
    pub fn current_count(&self, key: &K) -> Option<usize> {
        self.windows.get(key).map(|w| w.current_count())
    }

    /// Whether a window is tracked for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.windows.contains_key(key)
    }

    /// Number of tracked windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no windows are tracked.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Admissions allowed per window.
    pub fn max_rate(&self) -> usize {
        self.max_rate
    }

    /// Length of the trailing window.
    pub fn window(&self) -> Duration {
        self.window
    }

    fn window_for(&self, key: &K) -> Arc<KeyWindow> {
        if let Some(window) = self.windows.get(key) {
            return Arc::clone(window.value());
        }

        let entry = self.windows.entry(key.clone()).or_insert_with(|| {
            debug!(
                key = ?key,
                max_rate = self.max_rate,
                window_ms = self.window.as_millis() as u64,
                "Creating rate limit window"
            );
            Arc::new(KeyWindow::new(self.max_rate, self.window))
        });
        Arc::clone(entry.value())
    }
}
