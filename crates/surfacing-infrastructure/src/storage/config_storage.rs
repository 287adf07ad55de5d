//! TOML file storage with atomic writes and an exclusive lock file.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// Errors that can occur during config storage operations.
#[derive(Debug)]
pub enum ConfigStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
    /// TOML serialization error.
    TomlSerError(toml::ser::Error),
    /// File locking error.
    LockError(String),
    /// A value rejected while updating the document.
    InvalidValue(String),
}

impl std::fmt::Display for ConfigStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigStorageError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigStorageError::TomlSerError(e) => write!(f, "TOML serialization error: {}", e),
            ConfigStorageError::LockError(e) => write!(f, "Lock error: {}", e),
            ConfigStorageError::InvalidValue(e) => write!(f, "Invalid value: {}", e),
        }
    }
}

impl std::error::Error for ConfigStorageError {}

impl From<std::io::Error> for ConfigStorageError {
    fn from(e: std::io::Error) -> Self {
        ConfigStorageError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigStorageError {
    fn from(e: toml::de::Error) -> Self {
        ConfigStorageError::TomlParseError(e)
    }
}

impl From<toml::ser::Error> for ConfigStorageError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigStorageError::TomlSerError(e)
    }
}

impl From<ConfigStorageError> for surfacing_core::SurfacingError {
    fn from(err: ConfigStorageError) -> Self {
        match err {
            ConfigStorageError::IoError(e) => e.into(),
            ConfigStorageError::TomlParseError(e) => e.into(),
            ConfigStorageError::TomlSerError(e) => e.into(),
            ConfigStorageError::LockError(e) => surfacing_core::SurfacingError::io(e),
            ConfigStorageError::InvalidValue(e) => surfacing_core::SurfacingError::config(e),
        }
    }
}

/// A single TOML file read and written as one typed document.
///
/// - Writes go to a sibling temp file, are fsynced, then renamed over the
///   target, so readers never see a half-written file.
/// - [`update`](Self::update) holds an exclusive lock file for the whole
///   read-modify-write.
/// - Written files are readable by the owner only on Unix; they hold the API key.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and parses the file.
    ///
    /// Returns `Ok(None)` when the file doesn't exist or is blank.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, ConfigStorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Saves `data` atomically.
    pub fn save<T: Serialize>(&self, data: &T) -> Result<(), ConfigStorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(data)?;

        let tmp_path = self.get_temp_path()?;
        let mut tmp_file = open_private(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Locked read-modify-write. `default_value` is used when the file is
    /// missing. Returns the value that was written.
    pub fn update<T, F>(&self, default_value: T, f: F) -> Result<T, ConfigStorageError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<(), ConfigStorageError>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default_value);
        f(&mut data)?;
        self.save(&data)?;

        Ok(data)
    }

    fn get_temp_path(&self) -> Result<PathBuf, ConfigStorageError> {
        let parent = self.path.parent().ok_or_else(|| {
            ConfigStorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;

        let file_name = self.path.file_name().ok_or_else(|| {
            ConfigStorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }
}

/// Creates `path` for writing, owner-only on Unix from the first byte.
fn open_private(path: &Path) -> Result<File, ConfigStorageError> {
    // A leftover temp file from a crashed write keeps its old mode; start fresh.
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    Ok(options.open(path)?)
}

/// Exclusive lock on `<path>.lock`, released on drop.
struct FileLock {
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, ConfigStorageError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        fs2::FileExt::lock_exclusive(&file)
            .map_err(|e| ConfigStorageError::LockError(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: i64,
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().join("test.toml"));

        let doc = Doc {
            name: "test".into(),
            count: 42,
        };
        storage.save(&doc).unwrap();

        let loaded: Doc = storage.load().unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_load_nonexistent_or_blank_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().join("nonexistent.toml"));
        assert!(storage.load::<Doc>().unwrap().is_none());

        fs::write(storage.path(), "   \n").unwrap();
        assert!(storage.load::<Doc>().unwrap().is_none());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().join("broken.toml"));
        fs::write(storage.path(), "name = [").unwrap();

        assert!(matches!(
            storage.load::<Doc>(),
            Err(ConfigStorageError::TomlParseError(_))
        ));
    }

    #[test]
    fn test_update() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().join("nested").join("test.toml"));
        let default_doc = Doc {
            name: "default".into(),
            count: 0,
        };

        let written = storage
            .update(default_doc.clone(), |doc| {
                doc.count = 10;
                Ok(())
            })
            .unwrap();
        assert_eq!(written.count, 10);

        storage
            .update(default_doc, |doc| {
                doc.count += 5;
                Ok(())
            })
            .unwrap();

        let loaded: Doc = storage.load().unwrap().unwrap();
        assert_eq!(loaded.count, 15);
        assert_eq!(loaded.name, "default");
        assert!(!temp_dir.path().join("nested").join("test.lock").exists());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.toml");
        let storage = ConfigStorage::new(file_path.clone());

        storage
            .save(&Doc {
                name: "test".into(),
                count: 1,
            })
            .unwrap();

        assert!(!temp_dir.path().join(".test.toml.tmp").exists());
        assert!(file_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.toml");
        ConfigStorage::new(file_path.clone())
            .save(&Doc {
                name: "key".into(),
                count: 0,
            })
            .unwrap();

        let mode = fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_temp_file_is_private_before_any_write() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let tmp_path = temp_dir.path().join(".secret.toml.tmp");
        fs::write(&tmp_path, "stale").unwrap();
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o644)).unwrap();

        let file = open_private(&tmp_path).unwrap();

        let mode = file.metadata().unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(file.metadata().unwrap().len(), 0);
    }
}
