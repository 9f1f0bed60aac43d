use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use serde_json::Value;

use crate::error::{Context, Result};

use super::{validator, Settings};

/// JSON-backed settings file with a sibling `.backup` copy taken before every write.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".backup");
        PathBuf::from(name)
    }

    /// Load settings, falling back to defaults for anything missing or invalid. Never fails.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            info!(
                "Config file {} not found, using defaults",
                self.path.display()
            );
            return Settings::default();
        }

        let document = match self.read_document() {
            Ok(document) => document,
            Err(err) => {
                warn!("Config file corrupted: {err:#}, using defaults");
                return Settings::default();
            }
        };

        let validated = validator::validate_settings_document(&document);
        for issue in &validated.issues {
            warn!("Config {}: {issue}", self.path.display());
        }
        validated.settings
    }

    fn read_document(&self) -> anyhow::Result<Value> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read config file {}", self.path.display()))?;
        let document = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", self.path.display()))?;
        Ok(document)
    }

    /// Persist settings. The previous file is copied to the backup first and restored if
    /// the write fails.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if self.path.exists() {
            if let Err(err) = fs::copy(&self.path, self.backup_path()) {
                warn!("Could not create config backup: {err}");
            }
        }

        let json = serde_json::to_string_pretty(settings)
            .context("failed to serialize settings")?;

        if let Err(err) = self.write(&json) {
            warn!("Error saving config: {err:#}");
            self.restore_backup();
            return Err(err);
        }
        Ok(())
    }

    fn write(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create config directory {}", parent.display())
                })?;
            }
        }
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write config file {}", self.path.display()))?;
        Ok(())
    }

    fn restore_backup(&self) {
        let backup = self.backup_path();
        if !backup.exists() {
            return;
        }
        match fs::copy(&backup, &self.path) {
            Ok(_) => info!("Config restored from backup"),
            Err(err) => warn!("Error restoring config: {err}"),
        }
    }
}
