//! File-backed persistent session store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fitgate_core::error::{FitgateError, Result};
use fitgate_core::session::{SessionStorage, StorageOp};
use serde::{Deserialize, Serialize};

use super::atomic_toml::AtomicTomlFile;

/// On-disk layout: a flat string table.
///
/// ```toml
/// [entries]
/// token = "eyJ..."
/// user = "{\"sub\":\"u1\"}"
/// userId = "u1"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Durable key/value store kept in a single TOML file.
///
/// Each call re-reads the file so several handles (or processes) pointing at
/// the same path observe one another's writes. A batch is applied as one
/// atomic file replacement. Reads of an unparsable file fail with a
/// serialization error; the next write moves it to [`quarantine_path`] and
/// starts over.
///
/// [`quarantine_path`]: FileSessionStorage::quarantine_path
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    file: AtomicTomlFile<SessionDocument>,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn entries(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.file.load()?.unwrap_or_default().entries)
    }

    /// Where an unreadable session file is moved before it is replaced.
    pub fn quarantine_path(&self) -> PathBuf {
        let mut name = self
            .path()
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        self.path().with_file_name(name)
    }

    fn quarantine(&self, cause: &FitgateError) -> Result<()> {
        let target = self.quarantine_path();
        tracing::warn!(
            "[Storage] Moving unreadable session file {:?} to {:?}: {}",
            self.path(),
            target,
            cause
        );
        std::fs::rename(self.path(), &target)?;
        Ok(())
    }

    fn apply(&self, ops: &[StorageOp]) -> Result<()> {
        self.file.update(|doc: &mut SessionDocument| {
            for op in ops {
                match op {
                    StorageOp::Set { key, value } => {
                        doc.entries.insert(key.clone(), value.clone());
                    }
                    StorageOp::Remove { key } => {
                        doc.entries.remove(key);
                    }
                }
            }
            Ok(())
        })
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries()?.into_keys().collect())
    }
}

impl SessionStorage for FileSessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.write_batch(&[StorageOp::set(key, value)])
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.write_batch(&[StorageOp::remove(key)])
    }

    fn write_batch(&self, ops: &[StorageOp]) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        // An unreadable document is set aside and replaced by a fresh one.
        if let Err(e) = self.file.load()
            && e.is_serialization()
        {
            self.quarantine(&e)?;
        }
        self.apply(ops)?;
        tracing::trace!(
            "[Storage] Applied {} operation(s) to {:?}",
            ops.len(),
            self.path()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitgate_core::session::{
        Claims, RestoreOutcome, SessionState, TOKEN_KEY, USER_ID_KEY, USER_KEY,
    };
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::new(temp_dir.path().join("session.toml"));

        assert_eq!(storage.get_item("token").unwrap(), None);
        storage.set_item("token", "abc").unwrap();
        assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("abc"));

        storage.remove_item("token").unwrap();
        storage.remove_item("token").unwrap();
        assert_eq!(storage.get_item("token").unwrap(), None);
    }

    #[test]
    fn test_handles_share_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.toml");
        let writer = FileSessionStorage::new(&path);
        let reader = FileSessionStorage::new(&path);

        writer
            .write_batch(&[StorageOp::set("a", "1"), StorageOp::set("b", "2")])
            .unwrap();
        assert_eq!(reader.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_session_state_round_trip_through_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.toml");

        let state = SessionState::new(Arc::new(FileSessionStorage::new(&path)));
        state
            .commit("abc", Claims::new("u1").with_email("u1@example.com"))
            .unwrap();

        let storage = FileSessionStorage::new(&path);
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
        assert_eq!(storage.get_item(USER_ID_KEY).unwrap().as_deref(), Some("u1"));
        assert!(storage.get_item(USER_KEY).unwrap().is_some());

        let (restored, _) = SessionState::restore(Arc::new(storage)).unwrap();
        assert_eq!(restored.current(), state.current());

        restored.clear().unwrap();
        assert!(FileSessionStorage::new(&path).keys().unwrap().is_empty());
    }

    #[test]
    fn test_unparsable_file_is_set_aside_on_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.toml");
        std::fs::write(&path, "[entries\ntoken = ").unwrap();
        let storage = FileSessionStorage::new(&path);

        assert!(storage.get_item(TOKEN_KEY).unwrap_err().is_serialization());

        storage.remove_item(TOKEN_KEY).unwrap();
        assert!(storage.keys().unwrap().is_empty());
        assert_eq!(
            std::fs::read_to_string(storage.quarantine_path()).unwrap(),
            "[entries\ntoken = "
        );
        assert_eq!(
            storage.quarantine_path(),
            temp_dir.path().join("session.toml.corrupt")
        );
    }

    #[test]
    fn test_restore_discards_unparsable_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.toml");
        std::fs::write(&path, "[entries\ntoken = ").unwrap();

        let storage = Arc::new(FileSessionStorage::new(&path));
        let (state, outcome) = SessionState::restore(storage.clone()).unwrap();
        assert!(matches!(outcome, RestoreOutcome::Discarded { .. }));
        assert!(!state.is_authenticated());
        assert!(storage.keys().unwrap().is_empty());
    }
}
