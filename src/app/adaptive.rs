use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::fetch::RateLimitListener;
use crate::ui::Notifier;

use super::{Intervals, SettingsPersister};

/// Floor applied whenever the refresh interval is raised because of rate limiting.
pub const RATE_LIMITED_MIN_REFRESH_SECS: u64 = 120;

/// `max(120, floor(current * 1.5))`.
pub fn escalated_interval(current_secs: u64) -> u64 {
    (current_secs.saturating_mul(3) / 2).max(RATE_LIMITED_MIN_REFRESH_SECS)
}

/// Raises the refresh interval when the upstream keeps answering 429. It never lowers it;
/// only an explicit user-set interval does that.
pub struct AdaptiveController {
    intervals: Arc<Intervals>,
    persister: Arc<SettingsPersister>,
    notifier: Arc<dyn Notifier>,
}

impl AdaptiveController {
    pub fn new(
        intervals: Arc<Intervals>,
        persister: Arc<SettingsPersister>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            intervals,
            persister,
            notifier,
        }
    }

    /// Apply one escalation step. Returns the new interval when it actually changed.
    pub fn escalate(&self) -> Option<u64> {
        let (old, new) = self.intervals.update_refresh(escalated_interval);
        if old == new {
            return None;
        }

        info!("Adaptive rate limiting: refresh interval increased to {new}s");
        self.persister.persist();
        self.notifier.notify(
            "Rate Limit Protection",
            &format!("Refresh interval increased to {new}s to prevent rate limiting"),
        );
        Some(new)
    }
}

impl RateLimitListener for AdaptiveController {
    fn on_rate_limited(&self, consecutive: u32, backoff: Duration) {
        warn!(
            "Upstream rate limit #{consecutive}, backing off {}s",
            backoff.as_secs()
        );
    }

    fn on_sustained_rate_limit(&self, consecutive: u32) {
        info!("Sustained rate limiting ({consecutive} consecutive 429s)");
        self.escalate();
    }
}
