//! Settings repository for JSON storage
//!
//! Plain key/value pairs in settings.json. Typed access and validation live
//! in `config::settings`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

use super::file_io::{read_json, write_json_atomic};

/// One stored setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsData {
    settings: Vec<SettingEntry>,
}

/// Repository for key/value settings
pub struct SettingsRepository {
    path: PathBuf,
    data: RwLock<HashMap<String, String>>,
}

impl SettingsRepository {
    /// Create a new settings repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load settings from disk
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: SettingsData = read_json(&self.path)?;
        self.restore(file_data.settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), LedgerError> {
        let file_data = SettingsData {
            settings: self.snapshot()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// Copy of every stored pair, sorted by key
    pub fn snapshot(&self) -> Result<Vec<SettingEntry>, LedgerError> {
        Ok(self
            .get_all()?
            .into_iter()
            .map(|(key, value)| SettingEntry { key, value })
            .collect())
    }

    /// Replace the in-memory contents
    pub fn restore(&self, entries: Vec<SettingEntry>) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for entry in entries {
            data.insert(entry.key, entry.value);
        }

        Ok(())
    }

    /// Get the raw value for a key
    pub fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(key).cloned())
    }

    /// All pairs, sorted by key
    pub fn get_all(&self) -> Result<Vec<(String, String)>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut pairs: Vec<_> = data.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        pairs.sort();
        Ok(pairs)
    }

    /// Insert or overwrite a value
    pub fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Remove a key
    pub fn remove(&self, key: &str) -> Result<bool, LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data.remove(key).is_some())
    }
}
