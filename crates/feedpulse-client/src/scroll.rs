//! Maximum scroll depth capture.
//!
//! Depth only ever grows; scrolling back up never lowers the recorded
//! maximum. The flush path mirrors a beacon send: a short first
//! attempt, then one retry with a longer deadline.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::emitter::Tracker;
use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    PageHide,
    Unload,
    Manual,
}

impl FlushTrigger {
    fn as_str(self) -> &'static str {
        match self {
            FlushTrigger::PageHide => "page_hide",
            FlushTrigger::Unload => "unload",
            FlushTrigger::Manual => "manual",
        }
    }
}

#[derive(Default)]
pub struct MaxScrollTracker {
    // f64 bit pattern; depths are non-negative so bit comparison
    // matches numeric comparison.
    depth_bits: AtomicU64,
}

impl MaxScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scroll observation, keeping the running maximum.
    /// Out-of-range values are clamped to 0-100.
    pub fn observe(&self, percentage: f64) {
        let clamped = if percentage.is_finite() {
            percentage.clamp(0.0, 100.0)
        } else {
            return;
        };
        let candidate = clamped.to_bits();
        let mut current = self.depth_bits.load(Ordering::Relaxed);
        while f64::from_bits(current) < clamped {
            match self.depth_bits.compare_exchange_weak(
                current,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn max_depth(&self) -> f64 {
        f64::from_bits(self.depth_bits.load(Ordering::Relaxed))
    }

    /// Emit the current maximum as a `final_max_scroll` event. The
    /// first attempt runs under the short flush deadline; if it fails,
    /// one retry runs under the fallback deadline.
    pub async fn flush(
        &self,
        tracker: &Tracker,
        trigger: FlushTrigger,
    ) -> Result<(), TrackerError> {
        let depth = self.max_depth();
        debug!(trigger = trigger.as_str(), depth, "flushing scroll summary");

        match tracker
            .send_scroll_summary(depth, tracker.flush_deadline())
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(
                    trigger = trigger.as_str(),
                    error = %err,
                    "scroll flush retrying with extended deadline",
                );
                tracker
                    .send_scroll_summary(depth, tracker.flush_fallback_deadline())
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_is_monotonic() {
        let tracker = MaxScrollTracker::new();
        tracker.observe(30.0);
        tracker.observe(75.5);
        tracker.observe(40.0);
        assert_eq!(tracker.max_depth(), 75.5);
    }

    #[test]
    fn observations_are_clamped() {
        let tracker = MaxScrollTracker::new();
        tracker.observe(-10.0);
        assert_eq!(tracker.max_depth(), 0.0);
        tracker.observe(140.0);
        assert_eq!(tracker.max_depth(), 100.0);
        tracker.observe(f64::NAN);
        assert_eq!(tracker.max_depth(), 100.0);
    }
}
