//! Payee repository for JSON storage
//!
//! Manages loading and saving payees to payees.json. Payee names are the
//! identity key, so the name index is exact and case-sensitive.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{Payee, PayeeId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable payee data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct PayeeData {
    payees: Vec<Payee>,
}

/// Repository for payee persistence
pub struct PayeeRepository {
    path: PathBuf,
    data: RwLock<HashMap<PayeeId, Payee>>,
    /// Index: exact name -> payee_id
    by_name: RwLock<HashMap<String, PayeeId>>,
}

impl PayeeRepository {
    /// Create a new payee repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_name: RwLock::new(HashMap::new()),
        }
    }

    /// Load payees from disk
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: PayeeData = read_json(&self.path)?;
        self.restore(file_data.payees)
    }

    /// Save payees to disk
    pub fn save(&self) -> Result<(), LedgerError> {
        let file_data = PayeeData {
            payees: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// Copy of every stored payee
    pub fn snapshot(&self) -> Result<Vec<Payee>, LedgerError> {
        self.get_all()
    }

    /// Replace the in-memory contents and rebuild the name index
    pub fn restore(&self, payees: Vec<Payee>) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_name = self.by_name.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        by_name.clear();

        for payee in payees {
            by_name.insert(payee.name.clone(), payee.id);
            data.insert(payee.id, payee);
        }

        Ok(())
    }

    /// Get a payee by ID
    pub fn get(&self, id: PayeeId) -> Result<Option<Payee>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// Get all payees, sorted by name
    pub fn get_all(&self) -> Result<Vec<Payee>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut payees: Vec<_> = data.values().cloned().collect();
        payees.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(payees)
    }

    /// Get a payee by exact name
    pub fn get_by_name(&self, name: &str) -> Result<Option<Payee>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_name = self.by_name.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(by_name.get(name).and_then(|id| data.get(id).cloned()))
    }

    /// Check if a payee name is already taken by another payee
    pub fn name_exists(
        &self,
        name: &str,
        exclude_id: Option<PayeeId>,
    ) -> Result<bool, LedgerError> {
        let by_name = self.by_name.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(by_name
            .get(name)
            .is_some_and(|&id| Some(id) != exclude_id))
    }

    /// Insert or update a payee
    pub fn upsert(&self, payee: Payee) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_name = self.by_name.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        // Remove old name index if updating
        if let Some(old) = data.get(&payee.id) {
            by_name.remove(&old.name);
        }

        by_name.insert(payee.name.clone(), payee.id);
        data.insert(payee.id, payee);
        Ok(())
    }

    /// Delete a payee
    pub fn delete(&self, id: PayeeId) -> Result<bool, LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_name = self.by_name.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(payee) = data.remove(&id) {
            by_name.remove(&payee.name);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Count payees
    pub fn count(&self) -> Result<usize, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.len())
    }
}
