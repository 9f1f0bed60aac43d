use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Process-wide stop flag. Background loops sleep in short ticks and check it between them.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `total` in `tick` slices. Returns false if shutdown was requested meanwhile.
    pub async fn sleep_ticks(&self, total: Duration, tick: Duration) -> bool {
        self.sleep_while(tick, || total).await
    }

    /// Sleep in `tick` slices until `target()` has elapsed. The target is re-read every tick so
    /// a changed interval takes effect without waiting out the old one.
    pub async fn sleep_while<F>(&self, tick: Duration, target: F) -> bool
    where
        F: Fn() -> Duration,
    {
        let started = Instant::now();
        loop {
            if self.is_triggered() {
                return false;
            }
            let elapsed = started.elapsed();
            let total = target();
            if elapsed >= total {
                return true;
            }
            sleep(tick.min(total - elapsed)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleeps_the_full_duration_when_not_triggered() {
        let shutdown = Shutdown::new();
        let start = Instant::now();

        assert!(
            shutdown
                .sleep_ticks(Duration::from_millis(2_500), Duration::from_secs(1))
                .await
        );
        assert_eq!(start.elapsed(), Duration::from_millis(2_500));
    }

    #[tokio::test(start_paused = true)]
    async fn wakes_within_one_tick_of_trigger() {
        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(1_500)).await;
            trigger.trigger();
        });
        let start = Instant::now();

        let completed = shutdown
            .sleep_ticks(Duration::from_secs(90), Duration::from_secs(1))
            .await;

        assert!(!completed);
        assert!(start.elapsed() <= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn shortened_target_ends_sleep_early() {
        let shutdown = Shutdown::new();
        let target = Arc::new(std::sync::atomic::AtomicU64::new(60));
        let shorten = Arc::clone(&target);
        tokio::spawn(async move {
            sleep(Duration::from_secs(5)).await;
            shorten.store(10, Ordering::SeqCst);
        });
        let start = Instant::now();

        let completed = shutdown
            .sleep_while(Duration::from_secs(1), || {
                Duration::from_secs(target.load(Ordering::SeqCst))
            })
            .await;

        assert!(completed);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }
}
