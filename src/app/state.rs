use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use crate::fetch::{AssetId, PriceSnapshot};

#[derive(Debug, Default)]
struct WatchState {
    list: Vec<AssetId>,
    cursor: usize,
}

impl WatchState {
    fn clamp_cursor(&mut self) {
        if self.list.is_empty() || self.cursor >= self.list.len() {
            self.cursor = 0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added { len: usize },
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed { len: usize },
    NotPresent,
}

/// The asset currently on screen, read together with the list length it was valid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub id: AssetId,
    pub len: usize,
}

/// Watch-list, display cursor and the latest price snapshot shared by every task.
///
/// The watch-list and cursor live under one lock; the snapshot under another. Neither lock
/// is held across an await point or any I/O.
#[derive(Debug, Default)]
pub struct SharedState {
    watch: Mutex<WatchState>,
    snapshot: RwLock<PriceSnapshot>,
}

impl SharedState {
    pub fn new(watchlist: Vec<AssetId>) -> Self {
        let mut list: Vec<AssetId> = Vec::with_capacity(watchlist.len());
        for id in watchlist {
            if !list.contains(&id) {
                list.push(id);
            }
        }

        Self {
            watch: Mutex::new(WatchState { list, cursor: 0 }),
            snapshot: RwLock::new(PriceSnapshot::new()),
        }
    }

    fn watch(&self) -> MutexGuard<'_, WatchState> {
        self.watch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, id: &str) -> AddOutcome {
        let mut watch = self.watch();
        if watch.list.iter().any(|existing| existing == id) {
            return AddOutcome::AlreadyPresent;
        }
        watch.list.push(id.to_string());
        watch.clamp_cursor();
        AddOutcome::Added {
            len: watch.list.len(),
        }
    }

    /// Remove `id`, clamping the cursor and dropping its snapshot entry.
    pub fn remove(&self, id: &str) -> RemoveOutcome {
        let len = {
            let mut watch = self.watch();
            let Some(position) = watch.list.iter().position(|existing| existing == id) else {
                return RemoveOutcome::NotPresent;
            };
            watch.list.remove(position);
            watch.clamp_cursor();
            watch.list.len()
        };

        self.snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        RemoveOutcome::Removed { len }
    }

    /// Empty the watch-list, reset the cursor and drop the snapshot.
    pub fn clear(&self) {
        {
            let mut watch = self.watch();
            watch.list.clear();
            watch.cursor = 0;
        }
        self.snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn watchlist(&self) -> Vec<AssetId> {
        self.watch().list.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.watch().list.iter().any(|existing| existing == id)
    }

    pub fn len(&self) -> usize {
        self.watch().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cursor(&self) -> usize {
        self.watch().cursor
    }

    /// Move to the next asset. Returns false when there is nothing to cycle through.
    pub fn advance_cursor(&self) -> bool {
        let mut watch = self.watch();
        if watch.list.len() <= 1 {
            return false;
        }
        watch.cursor = (watch.cursor + 1) % watch.list.len();
        true
    }

    pub fn selection(&self) -> Option<Selection> {
        let mut watch = self.watch();
        watch.clamp_cursor();
        let id = watch.list.get(watch.cursor)?.clone();
        Some(Selection {
            index: watch.cursor,
            id,
            len: watch.list.len(),
        })
    }

    /// Swap in a freshly fetched snapshot. The previous one is discarded, not merged.
    pub fn replace_snapshot(&self, snapshot: PriceSnapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    pub fn snapshot(&self) -> PriceSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
