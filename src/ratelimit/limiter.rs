//! Sliding-window rate limiter.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use super::backend::AdmissionControl;
use super::key::AdmissionKey;
use super::window::{Admission, RequestWindow};
use crate::clock::{Clock, SystemClock};
use crate::config::WindowConfig;

/// Admissions between sweeps of idle keys.
const SWEEP_INTERVAL: u64 = 1024;

/// A keyed sliding-window rate limiter.
///
/// Windows live in a sharded map: the prune-check-append sequence for a key
/// runs while holding that key's shard lock, so requests on the same key are
/// serialized while unrelated keys proceed in parallel. Expired timestamps
/// are pruned lazily on access. Keys whose window has emptied are dropped,
/// and every [`SWEEP_INTERVAL`] checks the whole map is swept for them.
pub struct SlidingWindowLimiter {
    /// Admitted request timestamps indexed by key
    windows: DashMap<String, RequestWindow>,
    /// Requests admitted per key inside one window
    max_requests: usize,
    /// Trailing window length
    window: Duration,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Checks since creation, drives the periodic sweep
    checks: AtomicU64,
}

impl SlidingWindowLimiter {
    /// Create a limiter on the system clock.
    pub fn new(config: WindowConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create a limiter reading time from `clock`.
    pub fn with_clock(config: WindowConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests: config.max_requests,
            window: config.window(),
            clock,
            checks: AtomicU64::new(0),
        }
    }

    /// Check and record a request for `key` at the clock's current time.
    pub fn admit_key(&self, key: &str) -> Admission {
        self.admit_at(key, self.clock.now())
    }

    /// Check and record a request for `key` at an explicit time.
    pub fn admit_at(&self, key: &str, now: Duration) -> Admission {
        trace!(key = %key, "Checking admission");

        let outcome = {
            let mut window = self.windows.entry(key.to_string()).or_default();
            window.admit(now, self.window, self.max_requests)
        };
        // Only a zero budget leaves the window empty here
        self.windows.remove_if(key, |_, window| window.is_empty());

        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep_at(now);
        }

        if let Admission::Denied { retry_after_secs } = outcome {
            debug!(
                key = %key,
                limit = self.max_requests,
                retry_after_secs,
                "Rate limit exceeded"
            );
        }

        outcome
    }

    /// Number of timestamps held for `key` after pruning.
    ///
    /// Returns `None` if the key is not tracked. A key whose window has fully
    /// expired is dropped and reported as `None`.
    pub fn window_len(&self, key: &str) -> Option<usize> {
        let now = self.clock.now();
        let len = self.windows.get_mut(key).map(|mut window| {
            window.prune(now, self.window);
            window.len()
        })?;

        if len == 0 {
            self.windows.remove_if(key, |_, window| window.is_empty());
            return None;
        }
        Some(len)
    }

    /// Drop every key whose window has fully expired.
    pub fn sweep(&self) -> usize {
        self.sweep_at(self.clock.now())
    }

    fn sweep_at(&self, now: Duration) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.prune(now, self.window);
            !window.is_empty()
        });
        let removed = before.saturating_sub(self.windows.len());

        if removed > 0 {
            debug!(removed, remaining = self.windows.len(), "Swept idle rate limit keys");
        }
        removed
    }

    /// Requests admitted per key inside one window.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Trailing window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Clear all windows.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.windows.clear();
    }

    /// Get the number of tracked keys.
    pub fn key_count(&self) -> usize {
        self.windows.len()
    }
}

impl AdmissionControl for SlidingWindowLimiter {
    fn admit(&self, key: &AdmissionKey) -> Admission {
        self.admit_key(&key.to_string_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    fn create_test_limiter(max_requests: usize, window_secs: u64) -> (SlidingWindowLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let limiter = SlidingWindowLimiter::with_clock(
            WindowConfig {
                max_requests,
                window_secs,
            },
            clock.clone(),
        );
        (limiter, clock)
    }

    #[test]
    fn test_limiter_creation() {
        let (limiter, _) = create_test_limiter(3, 60);
        assert_eq!(limiter.key_count(), 0);
        assert_eq!(limiter.max_requests(), 3);
        assert_eq!(limiter.window(), Duration::from_secs(60));
    }

    #[test]
    fn test_fourth_request_denied_then_window_reopens() {
        let (limiter, clock) = create_test_limiter(3, 60);

        for _ in 0..3 {
            assert_eq!(limiter.admit_key("client"), Admission::Allowed);
            clock.advance(Duration::from_secs(1));
        }

        // Oldest admitted at t=0, now t=3
        match limiter.admit_key("client") {
            Admission::Denied { retry_after_secs } => {
                assert!(retry_after_secs >= 1);
                assert_eq!(retry_after_secs, 57);
            }
            Admission::Allowed => panic!("fourth request should be denied"),
        }

        clock.set(Duration::from_secs(61));
        assert_eq!(limiter.admit_key("client"), Admission::Allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _) = create_test_limiter(1, 60);

        assert!(limiter.admit_key("a").is_allowed());
        assert!(!limiter.admit_key("a").is_allowed());
        assert!(limiter.admit_key("b").is_allowed());
        assert_eq!(limiter.key_count(), 2);
    }

    #[test]
    fn test_admission_key_trait() {
        let (limiter, _) = create_test_limiter(1, 60);
        let scoped = AdmissionKey::for_client("1.2.3.4", Some("example.com"));

        assert!(limiter.admit(&scoped).is_allowed());
        assert!(!limiter.admit(&scoped).is_allowed());
        assert!(limiter.admit(&AdmissionKey::Client("1.2.3.4".into())).is_allowed());
        assert_eq!(limiter.window_len("1.2.3.4:example.com"), Some(1));
    }

    #[test]
    fn test_window_len_prunes() {
        let (limiter, clock) = create_test_limiter(5, 10);
        limiter.admit_key("k");
        limiter.admit_key("k");
        assert_eq!(limiter.window_len("k"), Some(2));

        clock.advance(Duration::from_secs(10));
        assert_eq!(limiter.window_len("k"), None);
        assert_eq!(limiter.key_count(), 0);
        assert_eq!(limiter.window_len("missing"), None);
    }

    #[test]
    fn test_zero_budget_tracks_no_keys() {
        let (limiter, _) = create_test_limiter(0, 60);

        for i in 0..10 {
            assert!(!limiter.admit_key(&format!("client-{i}")).is_allowed());
        }
        assert_eq!(limiter.key_count(), 0);
    }

    #[test]
    fn test_sweep_drops_idle_keys() {
        let (limiter, clock) = create_test_limiter(5, 10);
        limiter.admit_key("old-a");
        limiter.admit_key("old-b");
        clock.advance(Duration::from_secs(6));
        limiter.admit_key("recent");
        assert_eq!(limiter.key_count(), 3);

        clock.advance(Duration::from_secs(5));
        assert_eq!(limiter.sweep(), 2);
        assert_eq!(limiter.key_count(), 1);
        assert_eq!(limiter.window_len("recent"), Some(1));
    }

    #[test]
    fn test_periodic_sweep_bounds_key_count() {
        let (limiter, clock) = create_test_limiter(1, 10);

        for i in 0..SWEEP_INTERVAL {
            limiter.admit_key(&format!("one-off-{i}"));
            clock.advance(Duration::from_millis(100));
        }
        // Every key but the last ~100 expired before the sweep ran
        assert!(limiter.key_count() < 200, "{} keys left", limiter.key_count());
    }

    #[test]
    fn test_clear_windows() {
        let (limiter, _) = create_test_limiter(1, 60);
        limiter.admit_key("k");
        assert_eq!(limiter.key_count(), 1);

        limiter.clear();
        assert_eq!(limiter.key_count(), 0);
        assert!(limiter.admit_key("k").is_allowed());
    }

    #[test]
    fn test_concurrent_same_key_admits_exactly_budget() {
        const THREADS: usize = 32;
        const BUDGET: usize = 5;

        let (limiter, _) = create_test_limiter(BUDGET, 60);
        let barrier = Barrier::new(THREADS);
        let allowed = AtomicUsize::new(0);
        let denied = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    barrier.wait();
                    match limiter.admit_key("shared") {
                        Admission::Allowed => allowed.fetch_add(1, Ordering::SeqCst),
                        Admission::Denied { .. } => denied.fetch_add(1, Ordering::SeqCst),
                    };
                });
            }
        });

        assert_eq!(allowed.load(Ordering::SeqCst), BUDGET);
        assert_eq!(denied.load(Ordering::SeqCst), THREADS - BUDGET);
        assert_eq!(limiter.window_len("shared"), Some(BUDGET));
    }

    #[test]
    fn test_concurrent_distinct_keys_do_not_interfere() {
        let (limiter, _) = create_test_limiter(2, 60);

        std::thread::scope(|s| {
            for i in 0..8 {
                let limiter = &limiter;
                s.spawn(move || {
                    let key = format!("client-{i}");
                    assert!(limiter.admit_key(&key).is_allowed());
                    assert!(limiter.admit_key(&key).is_allowed());
                    assert!(!limiter.admit_key(&key).is_allowed());
                });
            }
        });

        assert_eq!(limiter.key_count(), 8);
    }
}
