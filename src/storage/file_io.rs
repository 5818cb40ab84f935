//! JSON file helpers
//!
//! Every repository file goes through `write_json_atomic`: the new content is
//! written to a hidden sibling file, synced, then renamed over the target.
//! A crash leaves either the old or the new file.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::LedgerError;

fn io_error(action: &str, path: &Path, err: impl Display) -> LedgerError {
    LedgerError::Storage(format!("Failed to {} {}: {}", action, path.display(), err))
}

/// Sibling path used while writing, e.g. `data/.accounts.json.tmp`
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Read a JSON file; a missing file yields `T::default()`
pub fn read_json<T, P>(path: P) -> Result<T, LedgerError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(io_error("read", path, e)),
    };

    serde_json::from_str(&text).map_err(|e| io_error("parse", path, e))
}

/// Write pretty-printed JSON, replacing `path` in one rename
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), LedgerError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create directory", parent, e))?;
    }

    let bytes = serde_json::to_vec_pretty(data).map_err(|e| io_error("serialize", path, e))?;
    let staging = staging_path(path);

    let result = File::create(&staging)
        .and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&staging, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&staging);
        return Err(io_error("write", path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Record {
        label: String,
        cents: i64,
    }

    fn sample() -> Record {
        Record {
            label: "groceries".into(),
            cents: -4250,
        }
    }

    #[test]
    fn test_missing_file_reads_as_default() {
        let temp_dir = TempDir::new().unwrap();
        let loaded: Record = read_json(temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, Record::default());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");

        write_json_atomic(&path, &sample()).unwrap();
        let loaded: Record = read_json(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_no_staging_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");

        write_json_atomic(&path, &sample()).unwrap();
        assert!(path.exists());
        assert!(!temp_dir.path().join(".record.json.tmp").exists());
    }

    #[test]
    fn test_stale_staging_file_is_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");
        fs::write(temp_dir.path().join(".record.json.tmp"), "garbage").unwrap();

        write_json_atomic(&path, &sample()).unwrap();
        let loaded: Record = read_json(&path).unwrap();
        assert_eq!(loaded.cents, -4250);
    }

    #[test]
    fn test_creates_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("record.json");

        write_json_atomic(&path, &sample()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "not json at all").unwrap();

        let result: Result<Record, _> = read_json(&path);
        assert!(matches!(result, Err(LedgerError::Storage(msg)) if msg.contains("parse")));
    }
}
