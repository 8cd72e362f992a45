//! JSON File Settings Store
//!
//! The service persists a handful of CRM-side identifiers (financial types,
//! bootstrapped custom field ids). A flat JSON file is enough; the map is
//! loaded once at startup and written back in full on every change.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use core_kernel::{CoreError, DomainPort};
use domain_sync::ports::SettingsStore;

/// Settings store backed by one JSON object on disk
pub struct JsonFileSettings {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl JsonFileSettings {
    /// Opens the store, creating an empty one if the file does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| {
                CoreError::configuration(format!("could not read {}: {e}", path.display()))
            })?;
            serde_json::from_str(&raw).map_err(|e| {
                CoreError::configuration(format!("{} is not a JSON object: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), CoreError> {
        let raw = serde_json::to_string_pretty(values)
            .map_err(|e| CoreError::configuration(format!("could not serialize settings: {e}")))?;
        fs::write(&self.path, raw).map_err(|e| {
            CoreError::configuration(format!("could not write {}: {e}", self.path.display()))
        })
    }
}

impl DomainPort for JsonFileSettings {}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let values = self
            .values
            .read()
            .map_err(|_| CoreError::configuration("settings lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut values = self
            .values
            .write()
            .map_err(|_| CoreError::configuration("settings lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sync-settings-{name}-{}.json", std::process::id()))
    }

    #[test]
    fn test_round_trips_through_the_file() {
        let path = temp_path("roundtrip");
        let store = JsonFileSettings::open(&path).unwrap();
        store.put("financial_type_id", "4").unwrap();

        let reopened = JsonFileSettings::open(&path).unwrap();
        assert_eq!(
            reopened.get("financial_type_id").unwrap(),
            Some("4".to_string())
        );
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let path = temp_path("missing");
        fs::remove_file(&path).ok();
        let store = JsonFileSettings::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_garbage_file_is_rejected() {
        let path = temp_path("garbage");
        fs::write(&path, "not json").unwrap();
        assert!(JsonFileSettings::open(&path).is_err());
        fs::remove_file(path).ok();
    }
}
