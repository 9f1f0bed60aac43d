use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;
use tokio::time::sleep;

use crate::config::ClientConfig;
use crate::error::AppError;

use super::{FetchResult, HttpTransport, Throttle};

/// Consecutive 429s after which the refresh interval is pushed up.
pub const SUSTAINED_RATE_LIMIT_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay,
        }
    }

    /// Backoff after a 429, keyed on the consecutive rate-limit count rather than the attempt.
    pub fn rate_limit_backoff(&self, consecutive: u32) -> Duration {
        self.retry_delay
            .saturating_mul(2u32.saturating_pow(consecutive.min(16)))
    }

    /// Backoff after any other failed attempt (zero-based).
    pub fn linear_backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt + 1)
    }
}

/// Number of 429 responses seen since the last 200.
#[derive(Debug, Default)]
pub struct RateLimitCounter(AtomicU32);

impl RateLimitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives rate-limit signals from the fetch path.
pub trait RateLimitListener: Send + Sync {
    /// Called for every 429 with the backoff about to be slept.
    fn on_rate_limited(&self, _consecutive: u32, _backoff: Duration) {}

    /// Called at most once per logical request, once the counter reaches the sustained threshold.
    fn on_sustained_rate_limit(&self, consecutive: u32);
}

/// Issues one logical GET with throttling, bounded retries and backoff.
pub struct RetryingFetcher {
    transport: Arc<dyn HttpTransport>,
    throttle: Arc<Throttle>,
    policy: RetryPolicy,
    counter: Arc<RateLimitCounter>,
    listener: Option<Arc<dyn RateLimitListener>>,
}

impl RetryingFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        throttle: Arc<Throttle>,
        policy: RetryPolicy,
        counter: Arc<RateLimitCounter>,
    ) -> Self {
        Self {
            transport,
            throttle,
            policy,
            counter,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn RateLimitListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }

    pub fn counter(&self) -> &Arc<RateLimitCounter> {
        &self.counter
    }

    /// Fetch `url`, returning the body of the first 200 response.
    ///
    /// Exhausting every attempt yields `AppError::RetriesExhausted`; callers treat that as
    /// "no data this cycle".
    pub async fn fetch(&self, url: &str) -> FetchResult<String> {
        let max_retries = self.policy.max_retries;
        let mut escalated = false;

        for attempt in 0..max_retries {
            self.throttle.acquire().await;
            debug!("GET {url} (attempt {}/{max_retries})", attempt + 1);

            match self.transport.get(url).await {
                Ok(reply) if reply.status == StatusCode::OK => {
                    self.counter.reset();
                    return Ok(reply.body);
                }
                Ok(reply) if reply.status == StatusCode::TOO_MANY_REQUESTS => {
                    let consecutive = self.counter.increment();
                    let backoff = self.policy.rate_limit_backoff(consecutive);
                    warn!(
                        "Rate limited (attempt {}), waiting {}s...",
                        attempt + 1,
                        backoff.as_secs()
                    );
                    if let Some(listener) = &self.listener {
                        listener.on_rate_limited(consecutive, backoff);
                    }
                    sleep(backoff).await;

                    if consecutive >= SUSTAINED_RATE_LIMIT_THRESHOLD && !escalated {
                        escalated = true;
                        if let Some(listener) = &self.listener {
                            listener.on_sustained_rate_limit(consecutive);
                        }
                    }
                    continue;
                }
                Ok(reply) => {
                    warn!("API returned status {} on attempt {}", reply.status, attempt + 1);
                }
                Err(err) => {
                    warn!("Request error on attempt {}: {err}", attempt + 1);
                }
            }

            if attempt + 1 < max_retries {
                sleep(self.policy.linear_backoff(attempt)).await;
            }
        }

        Err(AppError::RetriesExhausted {
            attempts: max_retries,
        })
    }
}
