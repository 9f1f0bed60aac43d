use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use log::{debug, warn};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::watch;

use crate::error::{AppError, Result};

use super::{ConfigStore, Settings};

/// Watches the settings file and republishes its contents whenever it changes on disk.
pub struct ConfigWatcher {
    store: ConfigStore,
    updates_tx: watch::Sender<Settings>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl ConfigWatcher {
    pub fn new(store: ConfigStore, initial: Settings) -> Self {
        let (updates_tx, _) = watch::channel(initial);
        Self {
            store,
            updates_tx,
            watcher: Mutex::new(None),
        }
    }

    /// Subscribe to reloaded settings. The receiver starts out holding the latest value.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.updates_tx.subscribe()
    }

    /// Reload from disk and publish only when the contents actually changed.
    pub fn reload(&self) -> bool {
        let settings = self.store.load();
        self.updates_tx.send_if_modified(|current| {
            if *current == settings {
                false
            } else {
                *current = settings;
                true
            }
        })
    }

    /// Begin watching the directory holding the settings file. Repeated calls are no-ops.
    pub fn start_watching(self: &Arc<Self>) -> Result<()> {
        let mut slot = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }

        let target = self.store.path().to_path_buf();
        let directory = watch_directory(&target);

        let this = Arc::clone(self);
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) if is_relevant_event(&event.kind) && touches(&event.paths, &target) => {
                    if this.reload() {
                        debug!("Config file changed, settings reloaded");
                    }
                }
                Ok(_) => {}
                Err(err) => warn!("Config watch error: {err}"),
            })?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|err| {
                AppError::message(format!(
                    "Failed to watch config directory {}: {err}",
                    directory.display()
                ))
            })?;
        *slot = Some(watcher);
        Ok(())
    }
}

fn watch_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn touches(paths: &[PathBuf], target: &Path) -> bool {
    let Some(name) = target.file_name() else {
        return false;
    };
    paths.is_empty() || paths.iter().any(|path| path.file_name() == Some(name))
}

fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any | EventKind::Other
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reload_publishes_only_changes() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        store.save(&Settings::default()).unwrap();

        let watcher = ConfigWatcher::new(store.clone(), Settings::default());
        let mut rx = watcher.subscribe();

        assert!(!watcher.reload());
        assert!(!rx.has_changed().unwrap());

        let changed = Settings {
            cycle_interval: 9,
            ..Settings::default()
        };
        store.save(&changed).unwrap();

        assert!(watcher.reload());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().cycle_interval, 9);
    }

    #[test]
    fn matches_events_by_file_name() {
        let target = PathBuf::from("/tmp/ticker/config.json");

        assert!(touches(&[PathBuf::from("/tmp/ticker/config.json")], &target));
        assert!(!touches(&[PathBuf::from("/tmp/ticker/other.json")], &target));
    }

    #[test]
    fn bare_file_name_watches_current_directory() {
        assert_eq!(watch_directory(Path::new("config.json")), PathBuf::from("."));
    }
}
