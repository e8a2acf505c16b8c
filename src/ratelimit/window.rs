//! Per-key sliding admission window.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Admission log for a single rate limited key.
///
/// Holds the instants of the admissions that still fall inside the trailing
/// window, never more than `max_rate` of them. The log lock only covers
/// bookkeeping; tasks waiting for a slot queue on `turnstile` instead, which
/// hands out turns in FIFO order.
pub struct KeyWindow {
    /// Admissions inside the current window, oldest first
    admissions: Mutex<VecDeque<Instant>>,
    /// Serializes waiting acquirers for this key
    turnstile: tokio::sync::Mutex<()>,
    /// Admissions allowed per window
    max_rate: usize,
    /// Length of the trailing window
    window: Duration,
}

impl KeyWindow {
    /// Create an empty window.
    pub fn new(max_rate: usize, window: Duration) -> Self {
        Self {
            admissions: Mutex::new(VecDeque::with_capacity(max_rate)),
            turnstile: tokio::sync::Mutex::new(()),
            max_rate,
            window,
        }
    }

    /// Whether one more admission would fit right now. Never records anything.
    pub fn has_capacity(&self) -> bool {
        let mut admissions = self.admissions.lock();
        self.expire(&mut admissions, Instant::now());
        admissions.len() < self.max_rate
    }

    /// Number of admissions inside the trailing window.
    pub fn current_count(&self) -> usize {
        let mut admissions = self.admissions.lock();
        self.expire(&mut admissions, Instant::now());
        admissions.len()
    }

    /// How long until a slot frees up. Zero when one is free already.
    pub fn time_until_capacity(&self) -> Duration {
        let now = Instant::now();
        let mut admissions = self.admissions.lock();
        self.expire(&mut admissions, now);
        self.wait_time(&admissions, now)
    }

    /// Record an admission if there is room, otherwise report how long to wait.
    fn try_admit(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut admissions = self.admissions.lock();
        self.expire(&mut admissions, now);

        if admissions.len() < self.max_rate {
            admissions.push_back(now);
            Ok(())
        } else {
            Err(self.wait_time(&admissions, now))
        }
    }

    /// Wait for a slot, then record an admission.
    ///
    /// Dropping the returned future before it completes records nothing and
    /// gives up its place in the queue.
    pub async fn admit(&self) {
        let _turn = self.turnstile.lock().await;

        loop {
            match self.try_admit() {
                Ok(()) => return,
                Err(wait) => {
                    trace!(wait_ms = wait.as_millis() as u64, "Waiting for window capacity");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Drop admissions that have left the window.
    fn expire(&self, admissions: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = admissions.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                admissions.pop_front();
            } else {
                break;
            }
        }
    }

    fn wait_time(&self, admissions: &VecDeque<Instant>, now: Instant) -> Duration {
        if admissions.len() < self.max_rate {
            return Duration::ZERO;
        }

        admissions
            .front()
            .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fresh_window_has_capacity() {
        let window = KeyWindow::new(1, Duration::from_secs(5));

        assert!(window.has_capacity());
        assert_eq!(window.current_count(), 0);
        assert_eq!(window.time_until_capacity(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_has_capacity_does_not_consume() {
        let window = KeyWindow::new(1, Duration::from_secs(5));

        for _ in 0..10 {
            assert!(window.has_capacity());
        }
        assert_eq!(window.current_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_admissions_up_to_max_rate() {
        let window = KeyWindow::new(3, Duration::from_secs(1));

        for _ in 0..3 {
            assert!(window.has_capacity());
            window.admit().await;
        }

        assert!(!window.has_capacity());
        assert_eq!(window.current_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oldest_admission_expires_first() {
        let window = KeyWindow::new(2, Duration::from_secs(10));

        window.admit().await;
        tokio::time::advance(Duration::from_secs(4)).await;
        window.admit().await;
        assert!(!window.has_capacity());

        // First admission leaves the window six seconds later.
        assert_eq!(window.time_until_capacity(), Duration::from_secs(6));
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(window.has_capacity());
        assert_eq!(window.current_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_admit_waits_for_expiry() {
        let window = KeyWindow::new(1, Duration::from_secs(5));

        window.admit().await;
        let start = Instant::now();
        window.admit().await;

        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(window.current_count(), 1);
    }
}
