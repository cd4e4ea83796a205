//! Namespaced key-value persistence
//!
//! One JSON file per namespace under the data directory. Records are read
//! once at startup and rewritten wholesale on every mutation; writes go
//! through a temp file plus rename so readers never observe a partial file.

pub mod records;

pub use records::{JournalEntry, Theme, UserProfile};

use crate::{Result, SolaceError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Namespace names for the persisted records
pub mod namespaces {
    pub const PROFILE: &str = "profile";
    pub const THEME: &str = "theme";
    pub const JOURNAL: &str = "journal";
    pub const SESSIONS: &str = "sessions";
    pub const INSIGHTS: &str = "insights";
}

pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| SolaceError::StorageError(format!("cannot create {:?}: {}", dir, e)))?;
        Ok(Self { dir })
    }

    /// Platform data directory for this application
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|d| d.join("solace"))
            .ok_or_else(|| SolaceError::StorageError("cannot find data directory".to_string()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", namespace))
    }

    /// Read a namespace; `Ok(None)` when nothing was persisted yet
    pub fn read<T: DeserializeOwned>(&self, namespace: &str) -> Result<Option<T>> {
        let path = self.path(namespace);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| SolaceError::StorageError(format!("cannot read {:?}: {}", path, e)))?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SolaceError::StorageError(format!("cannot parse {:?}: {}", path, e)))
    }

    /// Rewrite a namespace wholesale; atomic via temp file + rename
    pub fn write<T: Serialize>(&self, namespace: &str, value: &T) -> Result<()> {
        let path = self.path(namespace);
        let tmp = self.dir.join(format!("{}.json.tmp", namespace));

        let content = serde_json::to_string_pretty(value)
            .map_err(|e| SolaceError::StorageError(format!("cannot serialize {}: {}", namespace, e)))?;
        fs::write(&tmp, content)
            .map_err(|e| SolaceError::StorageError(format!("cannot write {:?}: {}", tmp, e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| SolaceError::StorageError(format!("cannot replace {:?}: {}", path, e)))?;

        debug!(namespace, "persisted");
        Ok(())
    }

    /// Delete a namespace; missing files are a no-op
    pub fn remove(&self, namespace: &str) -> Result<()> {
        let path = self.path(namespace);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SolaceError::StorageError(format!(
                "cannot remove {:?}: {}",
                path, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_missing_namespace_is_none() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        let value: Option<Vec<String>> = store.read(namespaces::JOURNAL).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();

        let entries = vec!["calm".to_string(), "tense".to_string()];
        store.write(namespaces::JOURNAL, &entries).unwrap();

        let loaded: Option<Vec<String>> = store.read(namespaces::JOURNAL).unwrap();
        assert_eq!(loaded.unwrap(), entries);
    }

    #[test]
    fn test_rewrite_replaces_whole_record() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();

        store.write(namespaces::THEME, &"midnight").unwrap();
        store.write(namespaces::THEME, &"dawn").unwrap();

        let theme: Option<String> = store.read(namespaces::THEME).unwrap();
        assert_eq!(theme.as_deref(), Some("dawn"));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        store.write(namespaces::INSIGHTS, &"steady progress").unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|x| x == "tmp").unwrap_or(false))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        store.write(namespaces::THEME, &"forest").unwrap();

        store.remove(namespaces::THEME).unwrap();
        store.remove(namespaces::THEME).unwrap();
        let theme: Option<String> = store.read(namespaces::THEME).unwrap();
        assert!(theme.is_none());
    }
}
