use serde_json::{Map, Value};

use super::{
    default_watchlist, Settings, DEFAULT_CYCLE_INTERVAL_SECS, DEFAULT_REFRESH_INTERVAL_SECS,
    MIN_REFRESH_INTERVAL_SECS,
};

/// Settings recovered from a config document plus every field that had to fall back.
#[derive(Debug)]
pub struct ValidatedSettings {
    pub settings: Settings,
    pub issues: Vec<String>,
}

/// Validate a parsed config document field by field. Invalid fields fall back to their
/// defaults individually; a non-object document falls back entirely.
pub fn validate_settings_document(document: &Value) -> ValidatedSettings {
    let Some(object) = document.as_object() else {
        return ValidatedSettings {
            settings: Settings::default(),
            issues: vec!["config document is not a JSON object, using defaults".to_string()],
        };
    };

    let mut issues = Vec::new();
    let settings = Settings {
        watchlist: validate_watchlist(object, &mut issues),
        refresh_interval: validate_refresh_interval(object, &mut issues),
        cycle_interval: validate_cycle_interval(object, &mut issues),
    };

    ValidatedSettings { settings, issues }
}

/// Look a field up under its current name first, then under the legacy name.
fn field<'a>(object: &'a Map<String, Value>, name: &str, legacy: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| object.get(legacy))
}

fn validate_watchlist(object: &Map<String, Value>, issues: &mut Vec<String>) -> Vec<String> {
    let Some(value) = field(object, "watchlist", "coins") else {
        return default_watchlist();
    };

    let Some(items) = value.as_array() else {
        issues.push("watchlist must be an array of asset ids, using defaults".to_string());
        return default_watchlist();
    };

    let mut ids: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let Some(id) = item.as_str() else {
            issues.push("watchlist contains a non-string entry, using defaults".to_string());
            return default_watchlist();
        };
        let id = id.trim();
        if id.is_empty() {
            issues.push("watchlist contains an empty asset id, skipping it".to_string());
            continue;
        }
        if ids.iter().any(|existing| existing == id) {
            issues.push(format!("watchlist lists `{id}` more than once, keeping the first"));
            continue;
        }
        ids.push(id.to_string());
    }
    ids
}

fn validate_refresh_interval(object: &Map<String, Value>, issues: &mut Vec<String>) -> u64 {
    match object.get("refresh_interval") {
        None => DEFAULT_REFRESH_INTERVAL_SECS,
        Some(value) => match value.as_u64() {
            Some(secs) if secs >= MIN_REFRESH_INTERVAL_SECS => secs,
            _ => {
                issues.push(format!(
                    "refresh_interval must be an integer >= {MIN_REFRESH_INTERVAL_SECS}, using default ({DEFAULT_REFRESH_INTERVAL_SECS}s)"
                ));
                DEFAULT_REFRESH_INTERVAL_SECS
            }
        },
    }
}

fn validate_cycle_interval(object: &Map<String, Value>, issues: &mut Vec<String>) -> u64 {
    match field(object, "cycle_interval", "coin_cycle_interval") {
        None => DEFAULT_CYCLE_INTERVAL_SECS,
        Some(value) => match value.as_u64() {
            Some(secs) if secs > 0 => secs,
            _ => {
                issues.push(format!(
                    "cycle_interval must be a positive integer, using default ({DEFAULT_CYCLE_INTERVAL_SECS}s)"
                ));
                DEFAULT_CYCLE_INTERVAL_SECS
            }
        },
    }
}
