use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use super::PriceInfo;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: PriceInfo,
    fetched_at: Instant,
}

/// Short-lived memo of per-asset prices. Expired entries are misses; they are only
/// dropped when overwritten or explicitly removed.
#[derive(Debug)]
pub struct PriceCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, id: &str) -> Option<PriceInfo> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(id)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn put(&self, id: &str, value: PriceInfo) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            id.to_string(),
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn remove(&self, id: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Entries physically held, expired or not.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Trend;

    fn price(current: f64) -> PriceInfo {
        PriceInfo::from_quote(current, 1.0)
    }

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl_returns_stored_value() {
        let cache = PriceCache::new(Duration::from_secs(30));
        cache.put("bitcoin", price(50_000.0));

        tokio::time::advance(Duration::from_secs(29)).await;

        let hit = cache.get("bitcoin").expect("entry should still be fresh");
        assert_eq!(hit, price(50_000.0));
        assert_eq!(hit.trend, Trend::Up);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_a_miss_while_still_present() {
        let cache = PriceCache::new(Duration::from_secs(30));
        cache.put("bitcoin", price(50_000.0));

        tokio::time::advance(Duration::from_secs(30)).await;

        assert!(cache.get("bitcoin").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn put_overwrites_and_refreshes_timestamp() {
        let cache = PriceCache::new(Duration::from_secs(30));
        cache.put("bitcoin", price(1.0));
        tokio::time::advance(Duration::from_secs(20)).await;
        cache.put("bitcoin", price(2.0));
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(cache.get("bitcoin"), Some(price(2.0)));
    }

    #[test]
    fn remove_and_clear_purge_entries() {
        let cache = PriceCache::new(Duration::from_secs(30));
        cache.put("bitcoin", price(1.0));
        cache.put("ethereum", price(2.0));

        cache.remove("bitcoin");
        assert!(cache.get("bitcoin").is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
