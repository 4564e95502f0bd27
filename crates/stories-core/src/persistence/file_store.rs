//! Generic one-file-per-key JSON store.
//!
//! # File Structure
//!
//! Each store owns one namespace directory under the storage root:
//! ```text
//! {root}/{namespace}/{key}
//! ```
//!
//! # Design Notes
//!
//! - **Atomic writes**: Write to `{key}.{uuid}.tmp`, then rename over `{key}`
//! - **Backup exclusion**: The namespace directory is flagged as excluded
//!   from Time Machine on macOS when first created (no-op elsewhere)

use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

const TEMP_SUFFIX: &str = ".tmp";

/// A string-keyed store of `T` values, one JSON file per key.
#[derive(Debug)]
pub struct FileStore<T> {
    dir: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for FileStore<T> {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> FileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a store for `namespace` under `root`.
    ///
    /// Nothing touches the disk until the first write.
    pub fn new(root: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            dir: root.as_ref().join(namespace),
            _marker: PhantomData,
        }
    }

    /// The namespace directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `value` under `key`, replacing any previous value.
    pub fn set(&self, key: &str, value: &T) -> StorageResult<()> {
        let file_path = self.file_path(key)?;
        self.ensure_dir().map_err(|source| StorageError::CouldNotSaveFile {
            key: key.to_string(),
            source,
        })?;

        let json = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;

        let temp_path = self
            .dir
            .join(format!("{key}.{}{TEMP_SUFFIX}", Uuid::new_v4().simple()));
        let written = fs::write(&temp_path, json).and_then(|_| fs::rename(&temp_path, &file_path));
        if let Err(source) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(StorageError::CouldNotSaveFile {
                key: key.to_string(),
                source,
            });
        }

        Ok(())
    }

    /// Read the value stored under `key`.
    ///
    /// Returns `StorageError::NoDataSaved` if nothing is stored there.
    pub fn get(&self, key: &str) -> StorageResult<T> {
        let file_path = self.file_path(key)?;

        let contents = match fs::read(&file_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NoDataSaved(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&contents).map_err(|source| StorageError::Decode {
            key: key.to_string(),
            source,
        })
    }

    /// Delete the value stored under `key`.
    pub fn remove(&self, key: &str) -> StorageResult<()> {
        let file_path = self.file_path(key)?;

        match fs::remove_file(&file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NoDataSaved(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.file_path(key).map(|p| p.is_file()).unwrap_or(false)
    }

    /// List stored keys, sorted. In-flight temp files are skipped.
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(TEMP_SUFFIX) {
                keys.push(name);
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Delete everything in the namespace.
    ///
    /// Keeps going past entries that fail to delete and returns the first
    /// failure afterwards. A namespace that was never created is empty.
    pub fn clear_all(&self) -> StorageResult<()> {
        self.clear_with(|path, is_dir| {
            if is_dir {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            }
        })
    }

    fn clear_with(
        &self,
        mut remove: impl FnMut(&Path, bool) -> std::io::Result<()>,
    ) -> StorageResult<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut first_error: Option<std::io::Error> = None;
        for entry in entries {
            let result = entry.and_then(|entry| {
                let is_dir = entry.file_type()?.is_dir();
                remove(&entry.path(), is_dir)
            });

            if let Err(e) = result {
                log::warn!("Failed to clear entry in {}: {}", self.dir.display(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn file_path(&self, key: &str) -> StorageResult<PathBuf> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.ends_with(TEMP_SUFFIX)
            || key.contains(['/', '\\', '\0']);

        if invalid {
            return Err(StorageError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid storage key: {key:?}"),
            )));
        }

        Ok(self.dir.join(key))
    }

    fn ensure_dir(&self) -> std::io::Result<()> {
        if self.dir.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(&self.dir)?;
        if let Err(e) = exclude_from_backup(&self.dir) {
            log::warn!(
                "Failed to exclude {} from backups: {}",
                self.dir.display(),
                e
            );
        }
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn exclude_from_backup(dir: &Path) -> std::io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let path = CString::new(dir.as_os_str().as_bytes())
        .map_err(|e| std::io::Error::new(ErrorKind::InvalidInput, e))?;
    let name = CString::new("com.apple.metadata:com_apple_backup_excludeItem")
        .map_err(|e| std::io::Error::new(ErrorKind::InvalidInput, e))?;
    let value = b"com.apple.backupd";

    // SAFETY: both strings are NUL-terminated and `value` outlives the call.
    let rc = unsafe {
        libc::setxattr(
            path.as_ptr(),
            name.as_ptr(),
            value.as_ptr() as *const libc::c_void,
            value.len(),
            0,
            0,
        )
    };

    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(target_os = "macos"))]
fn exclude_from_backup(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
