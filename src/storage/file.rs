//! File-backed storage: one JSON file per key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{Storage, StorageError};

/// Directory name used under the platform data directory.
const APP_DIR_NAME: &str = "pomodoro-engine";

/// Stores each key as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates storage rooted at `root`. The directory is created lazily on
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates storage in the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if neither a data directory nor a home directory
    /// can be determined.
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::new(Self::default_location()?))
    }

    /// Returns the default storage directory: the platform local data
    /// directory, or `~/.pomodoro-engine` when there is none.
    pub fn default_location() -> Result<PathBuf, StorageError> {
        if let Some(data_dir) = dirs::data_local_dir() {
            return Ok(data_dir.join(APP_DIR_NAME));
        }
        dirs::home_dir()
            .map(|home| home.join(format!(".{}", APP_DIR_NAME)))
            .ok_or(StorageError::DataDirNotFound)
    }

    /// Returns the storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|e| StorageError::io(key, e))?;

        // Readers never observe a half-written record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| StorageError::io(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::io(key, e))?;

        tracing::debug!("Wrote {:?}", path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("not-created"));
        assert_eq!(storage.get("pomodoro-state").unwrap(), None);
    }

    #[test]
    fn test_set_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested");
        let storage = FileStorage::new(&root);

        storage.set("pomodoro-state", r#"{"mode":"focus"}"#).unwrap();

        let contents = fs::read_to_string(root.join("pomodoro-state.json")).unwrap();
        assert_eq!(contents, r#"{"mode":"focus"}"#);
        assert!(!root.join("pomodoro-state.json.tmp").exists());
        assert_eq!(
            storage.get("pomodoro-state").unwrap().as_deref(),
            Some(r#"{"mode":"focus"}"#)
        );
    }

    #[test]
    fn test_set_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set("k", "1").unwrap();
        storage.set("k", "2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set("k", "1").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
        assert!(storage.remove("k").is_ok());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(matches!(storage.get("../escape"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(storage.set("a/b", "1"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(storage.remove(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_default_location_is_named() {
        if let Ok(path) = FileStorage::default_location() {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.contains(APP_DIR_NAME));
        }
    }
}
