use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod loader;
pub mod validator;
pub mod watcher;

pub use loader::ConfigStore;
pub use watcher::ConfigWatcher;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 90;
pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 4;
/// Anything shorter trips the public API's rate limiter.
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 60;

pub fn default_watchlist() -> Vec<String> {
    vec!["bitcoin".to_string(), "ethereum".to_string()]
}

/// User-facing settings persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub watchlist: Vec<String>,
    pub refresh_interval: u64,
    pub cycle_interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watchlist: default_watchlist(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            cycle_interval: DEFAULT_CYCLE_INTERVAL_SECS,
        }
    }
}

/// Tunables for the upstream client, throttle and background loops.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub request_timeout: Duration,
    pub min_call_spacing: Duration,
    pub max_calls_per_window: u32,
    pub rate_window: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub cache_ttl: Duration,
    pub manual_refresh_cooldown: Duration,
    pub monitor_error_backoff: Duration,
}

impl ClientConfig {
    pub fn builtin() -> Self {
        Self {
            api_base: "https://api.coingecko.com/api/v3".to_string(),
            request_timeout: Duration::from_secs(20),
            min_call_spacing: Duration::from_secs(2),
            max_calls_per_window: 25,
            rate_window: Duration::from_secs(60),
            max_retries: 3,
            retry_delay: Duration::from_secs(3),
            cache_ttl: Duration::from_secs(30),
            manual_refresh_cooldown: Duration::from_secs(10),
            monitor_error_backoff: Duration::from_secs(30),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builtin()
    }
}
