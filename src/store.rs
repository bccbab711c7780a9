//! Settings store
//!
//! [`SettingsStore`] is the single source of truth for updater settings. It
//! is a cheap-to-clone handle over a shared [`StorageBackend`], so the
//! settings session and the update pipeline can hold it at the same time.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use updater_settings::{BuildDefaults, MemoryBackend, SettingKey, SettingsStore};
//!
//! let store = SettingsStore::new(Arc::new(MemoryBackend::new()), BuildDefaults::builtin()?);
//!
//! // Nothing written yet: the build default is returned, canonicalized
//! assert_eq!(store.channel(), "beta6");
//!
//! store.write(SettingKey::Channel, "stable-2021".into());
//! assert_eq!(store.channel(), "stable6");
//! # Ok::<(), updater_settings::Error>(())
//! ```

use crate::backend::StorageBackend;
use crate::channel::canonicalize;
use crate::defaults::BuildDefaults;
use crate::error::Result;
use crate::types::{SettingKey, SettingValue, Snapshot};
use std::sync::Arc;

/// Internal marker recording that defaults have been applied once
const DEFAULTS_APPLIED_KEY: &str = "_has_set_default_values";

/// Handle to the persisted updater settings
#[derive(Clone)]
pub struct SettingsStore {
    backend: Arc<dyn StorageBackend>,
    defaults: Arc<BuildDefaults>,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn StorageBackend>, defaults: BuildDefaults) -> Self {
        Self {
            backend,
            defaults: Arc::new(defaults),
        }
    }

    pub fn defaults(&self) -> &BuildDefaults {
        &self.defaults
    }

    /// Persisted value for `key`, or its build default if absent
    ///
    /// A persisted value of the wrong kind is ignored in favor of the default.
    pub fn read(&self, key: SettingKey) -> SettingValue {
        match self.backend.get(key.as_str()) {
            Some(value) if value.kind() == key.kind() => value,
            Some(value) => {
                log::warn!(
                    "Ignoring persisted '{}' of unexpected type: {:?}",
                    key,
                    value
                );
                self.defaults.value_for(key)
            }
            None => self.defaults.value_for(key),
        }
    }

    /// Persist a value, logging storage failures
    ///
    /// Callers inside the session treat writes as always succeeding; use
    /// [`try_write`](Self::try_write) to observe failures.
    pub fn write(&self, key: SettingKey, value: SettingValue) {
        if let Err(e) = self.try_write(key, value) {
            log::error!("Failed to persist '{}': {}", key, e);
        }
    }

    pub fn try_write(&self, key: SettingKey, value: SettingValue) -> Result<()> {
        log::debug!("write {} = {:?}", key, value);
        self.backend.put(key.as_str(), value)
    }

    /// Current channel, always in canonical form
    pub fn channel(&self) -> String {
        let raw = self.read(SettingKey::Channel);
        canonicalize(raw.as_str().unwrap_or(&self.defaults.channel))
    }

    /// Raw network type code
    pub fn network_type(&self) -> i64 {
        self.read(SettingKey::NetworkType)
            .as_i64()
            .unwrap_or(self.defaults.network_type)
    }

    pub fn battery_not_low(&self) -> bool {
        self.read(SettingKey::BatteryNotLow)
            .as_bool()
            .unwrap_or(self.defaults.battery_not_low)
    }

    pub fn idle_reboot(&self) -> bool {
        self.read(SettingKey::IdleReboot)
            .as_bool()
            .unwrap_or(self.defaults.idle_reboot)
    }

    /// Whether a staged update is waiting for a reboot
    pub fn waiting_for_reboot(&self) -> bool {
        self.read(SettingKey::WaitingForReboot)
            .as_bool()
            .unwrap_or(false)
    }

    /// Set the reboot-pending marker. Called by the update pipeline.
    pub fn set_waiting_for_reboot(&self, waiting: bool) {
        self.write(SettingKey::WaitingForReboot, SettingValue::Bool(waiting));
    }

    /// Write build defaults for absent keys, once per store
    ///
    /// Returns `true` if defaults were applied by this call. Existing values
    /// are never overwritten.
    pub fn apply_defaults(&self) -> Result<bool> {
        if self.backend.contains(DEFAULTS_APPLIED_KEY) {
            return Ok(false);
        }
        for key in SettingKey::ALL {
            if key.is_user_editable() && !self.backend.contains(key.as_str()) {
                self.backend.put(key.as_str(), self.defaults.value_for(key))?;
            }
        }
        self.backend
            .put(DEFAULTS_APPLIED_KEY, SettingValue::Bool(true))?;
        log::info!("Applied build defaults");
        Ok(true)
    }

    /// Re-read the backing storage
    pub fn reload(&self) -> Result<()> {
        self.backend.reload()
    }

    /// Every setting as JSON, channel canonicalized
    pub fn snapshot(&self) -> Snapshot {
        SettingKey::ALL
            .into_iter()
            .map(|key| {
                let value = match key {
                    SettingKey::Channel => SettingValue::String(self.channel()),
                    other => self.read(other),
                };
                (key.as_str().to_string(), value.to_json())
            })
            .collect()
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn memory_store() -> (SettingsStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = SettingsStore::new(backend.clone(), BuildDefaults::builtin().unwrap());
        (store, backend)
    }

    #[test]
    fn test_read_returns_default_when_absent() {
        let (store, _) = memory_store();
        assert_eq!(store.read(SettingKey::Channel), SettingValue::from("beta"));
        assert_eq!(store.network_type(), 1);
        assert!(!store.battery_not_low());
        assert!(store.idle_reboot());
        assert!(!store.waiting_for_reboot());
    }

    #[test]
    fn test_read_after_write() {
        let (store, _) = memory_store();
        store.write(SettingKey::NetworkType, 3i64.into());
        store.write(SettingKey::BatteryNotLow, true.into());
        store.write(SettingKey::Channel, "nightly".into());
        assert_eq!(store.read(SettingKey::NetworkType), SettingValue::Integer(3));
        assert_eq!(store.read(SettingKey::BatteryNotLow), SettingValue::Bool(true));
        assert_eq!(store.read(SettingKey::Channel), SettingValue::from("nightly"));
    }

    #[test]
    fn test_channel_read_is_self_healing() {
        let (store, backend) = memory_store();
        assert_eq!(store.channel(), "beta6");

        backend.put("channel", "stable-2021".into()).unwrap();
        assert_eq!(store.channel(), "stable6");
        // The legacy value stays on disk until something rewrites it
        assert_eq!(store.read(SettingKey::Channel), SettingValue::from("stable-2021"));
    }

    #[test]
    fn test_wrong_kind_falls_back_to_default() {
        let (store, backend) = memory_store();
        backend.put("battery_not_low", "yes".into()).unwrap();
        assert_eq!(store.read(SettingKey::BatteryNotLow), SettingValue::Bool(false));
    }

    #[test]
    fn test_apply_defaults_once_without_overwrite() {
        let (store, backend) = memory_store();
        backend.put("network_type", 2i64.into()).unwrap();

        assert!(store.apply_defaults().unwrap());
        assert_eq!(backend.get("network_type"), Some(SettingValue::Integer(2)));
        assert_eq!(backend.get("channel"), Some("beta".into()));
        assert_eq!(backend.get("idle_reboot"), Some(true.into()));
        assert_eq!(backend.get("waiting_for_reboot"), None);

        backend.put("channel", "stable6".into()).unwrap();
        assert!(!store.apply_defaults().unwrap());
        assert_eq!(store.channel(), "stable6");
    }

    #[test]
    fn test_snapshot_contains_every_key() {
        let (store, _) = memory_store();
        store.write(SettingKey::Channel, "security-express".into());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), SettingKey::ALL.len());
        assert_eq!(
            snapshot.get("channel"),
            Some(&serde_json::Value::String("security-express6".to_string()))
        );
        assert_eq!(
            snapshot.get("waiting_for_reboot"),
            Some(&serde_json::Value::Bool(false))
        );
    }
}
