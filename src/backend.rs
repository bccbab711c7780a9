//! Storage backends for the settings store
//!
//! The store itself is backend-agnostic. Tests use [`MemoryBackend`]; the
//! binary uses [`FileBackend`], which lives in the device-protected storage
//! domain so settings are readable before the user unlocks the device.

use crate::error::Result;
use crate::types::SettingValue;
use nix::fcntl::{Flock, FlockArg};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock};
use tempfile::NamedTempFile;

/// Directory holding preference files within a storage domain
const PREFS_DIR: &str = "shared_prefs";
/// File name of the settings document
const PREFS_FILE: &str = "settings.json";

/// Key-value persistence used by [`SettingsStore`](crate::SettingsStore)
///
/// Implementations must be atomic per key and safe to share between the
/// session thread and the update pipeline.
pub trait StorageBackend: Send + Sync {
    /// Raw persisted value, `None` if absent
    fn get(&self, key: &str) -> Option<SettingValue>;

    /// Persist a value; visible to subsequent `get` calls once this returns
    fn put(&self, key: &str, value: SettingValue) -> Result<()>;

    /// Whether a value has ever been written for `key`
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Pick up changes made outside this process
    fn reload(&self) -> Result<()> {
        Ok(())
    }
}

/// Storage scope with different availability before device unlock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageDomain {
    /// Available as soon as the device boots
    DeviceProtected,
    /// Available only after the user has unlocked the device
    CredentialProtected,
}

impl StorageDomain {
    /// Root directory of this domain under the application's data directory
    pub fn resolve(self, data_root: &Path) -> PathBuf {
        match self {
            StorageDomain::DeviceProtected => data_root.join("device_protected"),
            StorageDomain::CredentialProtected => data_root.join("credential_protected"),
        }
    }
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: RwLock<HashMap<String, SettingValue>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<SettingValue> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn put(&self, key: &str, value: SettingValue) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON file backend
///
/// The file is the source of truth; several handles (in this process or
/// another one) may share it. Every `put` takes an exclusive advisory lock on
/// a sibling `.lock` file, re-reads the document, merges the one key and
/// replaces the file through a temporary file plus rename, so concurrent
/// writers never drop each other's keys and readers never observe a
/// half-written file. Every `get` re-reads the document; the in-memory copy
/// is only used when the file cannot be read.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock_path: PathBuf,
    values: Mutex<HashMap<String, SettingValue>>,
}

impl FileBackend {
    /// Open (or lazily create) the settings file in the device-protected domain
    pub fn open_device_protected(data_root: &Path) -> Result<Self> {
        let dir = StorageDomain::DeviceProtected
            .resolve(data_root)
            .join(PREFS_DIR);
        Self::open(dir.join(PREFS_FILE))
    }

    /// Open a settings file at an explicit path. A missing file is an empty store.
    pub fn open(path: PathBuf) -> Result<Self> {
        let values = read_document(&path)?;
        log::debug!("Opened settings file {} ({} keys)", path.display(), values.len());
        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        Ok(Self {
            lock_path: path.with_file_name(lock_name),
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, SettingValue>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Exclusive lock shared with every other handle on this file
    fn lock_file(&self) -> Result<Flock<File>> {
        fs::create_dir_all(self.dir())?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        Flock::lock(file, FlockArg::LockExclusive)
            .map_err(|(_, errno)| std::io::Error::from(errno).into())
    }

    /// Current document, falling back to the last known values if unreadable
    fn current(&self) -> HashMap<String, SettingValue> {
        match read_document(&self.path) {
            Ok(values) => {
                *self.cache() = values.clone();
                values
            }
            Err(e) => {
                log::warn!(
                    "Failed to re-read {}, using last known values: {}",
                    self.path.display(),
                    e
                );
                self.cache().clone()
            }
        }
    }

    fn flush(&self, values: &HashMap<String, SettingValue>) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        serde_json::to_writer_pretty(&mut tmp, values)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.current().get(key).cloned()
    }

    fn put(&self, key: &str, value: SettingValue) -> Result<()> {
        let _lock = self.lock_file()?;
        let mut values = self.current();
        values.insert(key.to_string(), value);
        self.flush(&values)?;
        *self.cache() = values;
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        let fresh = read_document(&self.path)?;
        *self.cache() = fresh;
        Ok(())
    }
}

/// Parse the settings document
///
/// Entries of an unexpected JSON type are skipped so one bad value cannot
/// make the whole store unreadable.
fn read_document(path: &Path) -> Result<HashMap<String, SettingValue>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let raw: HashMap<String, serde_json::Value> = serde_json::from_str(&content)?;
    let values = raw
        .into_iter()
        .filter_map(|(key, value)| match SettingValue::try_from(value) {
            Ok(value) => Some((key, value)),
            Err(e) => {
                log::warn!("Skipping persisted '{}' in {}: {}", key, path.display(), e);
                None
            }
        })
        .collect();
    Ok(values)
}
