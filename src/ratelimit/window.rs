//! Per-key sliding window of admitted request timestamps.

use std::collections::VecDeque;
use std::time::Duration;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request was admitted and recorded
    Allowed,
    /// The request was rejected; nothing was recorded
    Denied {
        /// Whole seconds until the oldest admitted request leaves the window
        retry_after_secs: u64,
    },
}

impl Admission {
    /// Whether the request was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Timestamps of admitted requests for one key, oldest first.
///
/// Timestamps are appended in non-decreasing order under the owning
/// limiter's lock, so pruning only ever inspects the front.
#[derive(Debug, Default)]
pub struct RequestWindow {
    timestamps: VecDeque<Duration>,
}

impl RequestWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every timestamp that is `window` or more behind `now`.
    pub fn prune(&mut self, now: Duration, window: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_sub(oldest) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Prune, then admit and record `now` if fewer than `max_requests` remain.
    ///
    /// A denied attempt leaves the window exactly as the prune left it.
    pub fn admit(&mut self, now: Duration, window: Duration, max_requests: usize) -> Admission {
        self.prune(now, window);

        if self.timestamps.len() >= max_requests {
            return Admission::Denied {
                retry_after_secs: self.retry_after(now, window),
            };
        }

        // A caller racing an older `now` must not reorder the window.
        let stamp = match self.timestamps.back() {
            Some(&newest) if newest > now => newest,
            _ => now,
        };
        self.timestamps.push_back(stamp);
        Admission::Allowed
    }

    /// Seconds until the oldest timestamp expires, never less than one.
    fn retry_after(&self, now: Duration, window: Duration) -> u64 {
        let remaining = match self.timestamps.front() {
            Some(&oldest) => window.saturating_sub(now.saturating_sub(oldest)),
            None => window,
        };
        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        secs.max(1)
    }

    /// Number of timestamps currently held.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the window holds no timestamps.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_admit_within_budget() {
        let mut window = RequestWindow::new();

        assert_eq!(window.admit(secs(0), WINDOW, 2), Admission::Allowed);
        assert_eq!(window.admit(secs(1), WINDOW, 2), Admission::Allowed);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_denial_does_not_record() {
        let mut window = RequestWindow::new();
        window.admit(secs(0), WINDOW, 1);

        for t in 1..10 {
            assert!(!window.admit(secs(t), WINDOW, 1).is_allowed());
        }
        assert_eq!(window.len(), 1);

        // Repeated denials must not push the reopening time back
        assert_eq!(window.admit(secs(60), WINDOW, 1), Admission::Allowed);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let mut window = RequestWindow::new();
        window.admit(Duration::from_millis(500), WINDOW, 1);

        // 60 - (10.0 - 0.5) = 50.5 -> 51
        let outcome = window.admit(secs(10), WINDOW, 1);
        assert_eq!(outcome, Admission::Denied { retry_after_secs: 51 });
    }

    #[test]
    fn test_retry_after_never_below_one() {
        let mut window = RequestWindow::new();
        window.admit(secs(0), WINDOW, 1);

        let outcome = window.admit(Duration::from_millis(59_999), WINDOW, 1);
        assert_eq!(outcome, Admission::Denied { retry_after_secs: 1 });
    }

    #[test]
    fn test_prune_boundary_is_exclusive() {
        let mut window = RequestWindow::new();
        window.admit(secs(0), WINDOW, 5);
        window.admit(secs(30), WINDOW, 5);

        window.prune(secs(59), WINDOW);
        assert_eq!(window.len(), 2);

        // Exactly one window old is expired
        window.prune(secs(60), WINDOW);
        assert_eq!(window.len(), 1);

        window.prune(secs(200), WINDOW);
        assert!(window.is_empty());
    }

    #[test]
    fn test_zero_budget_denies_with_full_window() {
        let mut window = RequestWindow::new();
        let outcome = window.admit(secs(0), WINDOW, 0);
        assert_eq!(outcome, Admission::Denied { retry_after_secs: 60 });
    }
}
