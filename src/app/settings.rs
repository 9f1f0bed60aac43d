use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};

use crate::config::{ConfigStore, Settings, MIN_REFRESH_INTERVAL_SECS};

use super::SharedState;

/// Refresh and cycle intervals in whole seconds, readable by the loops without locking.
#[derive(Debug)]
pub struct Intervals {
    refresh: AtomicU64,
    cycle: AtomicU64,
}

impl Intervals {
    pub fn new(refresh_secs: u64, cycle_secs: u64) -> Self {
        Self {
            refresh: AtomicU64::new(refresh_secs.max(MIN_REFRESH_INTERVAL_SECS)),
            cycle: AtomicU64::new(cycle_secs.max(1)),
        }
    }

    pub fn refresh_secs(&self) -> u64 {
        self.refresh.load(Ordering::SeqCst)
    }

    pub fn cycle_secs(&self) -> u64 {
        self.cycle.load(Ordering::SeqCst)
    }

    pub fn cycle(&self) -> Duration {
        Duration::from_secs(self.cycle_secs())
    }

    pub fn set_refresh_secs(&self, secs: u64) {
        self.refresh.store(secs, Ordering::SeqCst);
    }

    pub fn set_cycle_secs(&self, secs: u64) {
        self.cycle.store(secs.max(1), Ordering::SeqCst);
    }

    /// Apply `update` to the refresh interval atomically, returning `(old, new)`.
    pub fn update_refresh<F>(&self, update: F) -> (u64, u64)
    where
        F: Fn(u64) -> u64,
    {
        let mut current = self.refresh_secs();
        loop {
            let next = update(current);
            match self.refresh.compare_exchange(
                current,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return (current, next),
                Err(actual) => current = actual,
            }
        }
    }
}

/// Writes the running watch-list and intervals back to the config file.
pub struct SettingsPersister {
    store: ConfigStore,
    state: Arc<SharedState>,
    intervals: Arc<Intervals>,
}

impl SettingsPersister {
    pub fn new(store: ConfigStore, state: Arc<SharedState>, intervals: Arc<Intervals>) -> Self {
        Self {
            store,
            state,
            intervals,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn current(&self) -> Settings {
        Settings {
            watchlist: self.state.watchlist(),
            refresh_interval: self.intervals.refresh_secs(),
            cycle_interval: self.intervals.cycle_secs(),
        }
    }

    /// Save the current settings. Failures are logged and otherwise ignored.
    pub fn persist(&self) {
        let settings = self.current();
        match self.store.save(&settings) {
            Ok(()) => debug!(
                "Config saved: {} assets, refresh {}s, cycle {}s",
                settings.watchlist.len(),
                settings.refresh_interval,
                settings.cycle_interval
            ),
            Err(err) => error!("Failed to save config: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_enforces_floors() {
        let intervals = Intervals::new(10, 0);
        assert_eq!(intervals.refresh_secs(), MIN_REFRESH_INTERVAL_SECS);
        assert_eq!(intervals.cycle_secs(), 1);
    }

    #[test]
    fn update_refresh_reports_old_and_new() {
        let intervals = Intervals::new(90, 4);
        assert_eq!(intervals.update_refresh(|secs| secs * 2), (90, 180));
        assert_eq!(intervals.refresh_secs(), 180);
    }

    #[test]
    fn persist_writes_running_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        let state = Arc::new(SharedState::new(vec!["solana".to_string()]));
        let intervals = Arc::new(Intervals::new(120, 6));
        let persister = SettingsPersister::new(store.clone(), state, intervals);

        persister.persist();

        let saved = store.load();
        assert_eq!(saved.watchlist, vec!["solana".to_string()]);
        assert_eq!(saved.refresh_interval, 120);
        assert_eq!(saved.cycle_interval, 6);
    }
}
