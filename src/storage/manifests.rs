//! Export manifest repository for JSON storage
//!
//! Manages loading and saving export manifests to manifests.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{ExportManifest, ManifestId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable manifest data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ManifestData {
    manifests: Vec<ExportManifest>,
}

/// Repository for manifest persistence
pub struct ManifestRepository {
    path: PathBuf,
    data: RwLock<HashMap<ManifestId, ExportManifest>>,
}

impl ManifestRepository {
    /// Create a new manifest repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load manifests from disk
    pub fn load(&self) -> Result<(), LedgerError> {
        let file_data: ManifestData = read_json(&self.path)?;
        self.restore(file_data.manifests)
    }

    /// Save manifests to disk
    pub fn save(&self) -> Result<(), LedgerError> {
        let file_data = ManifestData {
            manifests: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// Copy of every stored manifest
    pub fn snapshot(&self) -> Result<Vec<ExportManifest>, LedgerError> {
        self.get_all()
    }

    /// Replace the in-memory contents
    pub fn restore(&self, manifests: Vec<ExportManifest>) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for manifest in manifests {
            data.insert(manifest.id, manifest);
        }

        Ok(())
    }

    /// Get a manifest by ID
    pub fn get(&self, id: ManifestId) -> Result<Option<ExportManifest>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// Get all manifests, newest first
    pub fn get_all(&self) -> Result<Vec<ExportManifest>, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut manifests: Vec<_> = data.values().cloned().collect();
        manifests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(manifests)
    }

    /// Insert or update a manifest
    pub fn upsert(&self, manifest: ExportManifest) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(manifest.id, manifest);
        Ok(())
    }

    /// Delete a manifest
    pub fn delete(&self, id: ManifestId) -> Result<bool, LedgerError> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data.remove(&id).is_some())
    }

    /// Check if a manifest exists
    pub fn exists(&self, id: ManifestId) -> Result<bool, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.contains_key(&id))
    }

    /// Count manifests
    pub fn count(&self) -> Result<usize, LedgerError> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExportFormat;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, ManifestRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifests.json");
        (temp_dir, ManifestRepository::new(path))
    }

    #[test]
    fn test_content_survives_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let content = "Date,Amount\n2024-01-05,-12.00\n";
        let manifest = ExportManifest::new("export.csv", 1, ExportFormat::Csv, content);
        let id = manifest.id;
        repo.upsert(manifest).unwrap();
        repo.save().unwrap();

        let repo2 = ManifestRepository::new(temp_dir.path().join("manifests.json"));
        repo2.load().unwrap();
        let loaded = repo2.get(id).unwrap().unwrap();
        assert_eq!(loaded.content, content);
        assert_eq!(loaded.row_count, 1);
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        let manifest = ExportManifest::new("x.json", 0, ExportFormat::Json, "[]");
        let id = manifest.id;
        repo.upsert(manifest).unwrap();

        assert!(repo.exists(id).unwrap());
        assert!(repo.delete(id).unwrap());
        assert!(!repo.exists(id).unwrap());
    }
}
