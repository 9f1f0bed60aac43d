use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use log::debug;
use tokio::time::{sleep_until, Instant};

use crate::config::ClientConfig;

#[derive(Debug)]
struct RateWindow {
    last_call: Option<Instant>,
    window_start: Instant,
    call_count: u32,
}

/// Spaces outbound requests and caps how many go out per rolling window.
///
/// A caller reserves its slot under the lock and sleeps after releasing it, so
/// concurrent callers queue up one spacing apart without blocking each other on the mutex.
#[derive(Debug)]
pub struct Throttle {
    min_spacing: Duration,
    max_calls: u32,
    window: Duration,
    state: Mutex<RateWindow>,
}

impl Throttle {
    pub fn new(min_spacing: Duration, max_calls: u32, window: Duration) -> Self {
        Self {
            min_spacing,
            max_calls: max_calls.max(1),
            window,
            state: Mutex::new(RateWindow {
                last_call: None,
                window_start: Instant::now(),
                call_count: 0,
            }),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.min_call_spacing,
            config.max_calls_per_window,
            config.rate_window,
        )
    }

    /// Wait until one more outbound request is allowed, then count it.
    pub async fn acquire(&self) {
        let now = Instant::now();
        let ready_at = self.reserve(now);
        if ready_at > now {
            debug!(
                "Throttle: waiting {:.1}s before next request",
                (ready_at - now).as_secs_f64()
            );
            sleep_until(ready_at).await;
        }
    }

    fn reserve(&self, now: Instant) -> Instant {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if now.saturating_duration_since(state.window_start) >= self.window {
            state.window_start = now;
            state.call_count = 0;
        }

        let mut ready_at = now;
        if state.call_count >= self.max_calls {
            let rollover = state.window_start + self.window;
            debug!(
                "Rate limit protection: {} calls in the current window, deferring {:.1}s",
                state.call_count,
                rollover.saturating_duration_since(now).as_secs_f64()
            );
            ready_at = ready_at.max(rollover);
            state.window_start = rollover;
            state.call_count = 0;
        }

        if let Some(last) = state.last_call {
            ready_at = ready_at.max(last + self.min_spacing);
        }

        state.last_call = Some(ready_at);
        state.call_count += 1;
        ready_at
    }

    /// Time since the most recent request went out, `None` if nothing was sent yet.
    pub fn since_last_call(&self) -> Option<Duration> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .last_call
            .map(|last| Instant::now().saturating_duration_since(last))
    }

    pub fn calls_in_window(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .call_count
    }
}
