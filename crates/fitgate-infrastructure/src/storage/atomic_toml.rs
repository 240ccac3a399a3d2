//! Atomic TOML documents.
//!
//! Writes go to a sibling temp file which is fsynced and renamed over the
//! target, so readers see either the old or the new document. Read-modify-write
//! cycles hold an exclusive lock file for their whole duration.

use fitgate_core::error::{FitgateError, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A TOML file holding one serialized `T`.
#[derive(Debug, Clone)]
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. A missing or blank file yields `None`.
    pub fn load(&self) -> Result<Option<T>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Replaces the document atomically.
    pub fn save(&self, data: &T) -> Result<()> {
        let serialized = toml::to_string_pretty(data)?;
        let tmp_path = self.temp_path()?;

        if let Some(parent) = tmp_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(serialized.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Loads (or defaults), lets `f` mutate, and saves, all under the lock.
    ///
    /// Nothing is written if `f` fails.
    pub fn update<F, R>(&self, f: F) -> Result<R>
    where
        T: Default,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let _lock = LockFile::acquire(&self.path)?;
        let mut data = self.load()?.unwrap_or_default();
        let result = f(&mut data)?;
        self.save(&data)?;
        Ok(result)
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| FitgateError::io(format!("{:?} has no file name", self.path)))?;
        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(self.path.with_file_name(tmp_name))
    }
}

/// Exclusive lock held through a `<file>.lock` sibling; released on drop.
struct LockFile {
    _file: File,
    path: PathBuf,
}

impl LockFile {
    fn acquire(target: &Path) -> Result<Self> {
        let path = target.with_extension("lock");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        // Advisory only on non-Unix targets; single-user clients don't contend there.
        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| FitgateError::storage(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(Self { _file: file, path })
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
