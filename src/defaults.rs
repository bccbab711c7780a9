//! Build-time defaults
//!
//! Defaults are not hardcoded in the store. They come from an INI document
//! compiled into the binary, so a product build can target a different
//! default channel or policy by shipping a different `config/defaults.ini`.
//! A runtime override file uses the same format; keys it omits keep the
//! built-in value.
//!
//! ```ini
//! [defaults]
//! channel = beta
//! network_type = 1
//! battery_not_low = false
//! idle_reboot = true
//! ```

use crate::error::{Error, Result};
use crate::types::{SettingKey, SettingValue};
use configparser::ini::Ini;
use std::path::Path;

const BUILTIN_DEFAULTS: &str = include_str!("../config/defaults.ini");
const SECTION: &str = "defaults";

/// Default value for every setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDefaults {
    pub channel: String,
    pub network_type: i64,
    pub battery_not_low: bool,
    pub idle_reboot: bool,
}

impl BuildDefaults {
    /// Defaults compiled into this build
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_DEFAULTS, None)
    }

    /// Parse an INI document, filling missing keys from the built-in defaults
    pub fn from_ini_str(content: &str) -> Result<Self> {
        let base = Self::builtin()?;
        Self::parse(content, Some(&base))
    }

    /// Read and parse an INI file, filling missing keys from the built-in defaults
    pub fn from_ini_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|_| Error::ConfigNotFound(path.to_path_buf()))?;
        Self::from_ini_str(&content)
    }

    /// Default for a key. `waiting_for_reboot` is always `false`.
    pub fn value_for(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::Channel => SettingValue::String(self.channel.clone()),
            SettingKey::NetworkType => SettingValue::Integer(self.network_type),
            SettingKey::BatteryNotLow => SettingValue::Bool(self.battery_not_low),
            SettingKey::IdleReboot => SettingValue::Bool(self.idle_reboot),
            SettingKey::WaitingForReboot => SettingValue::Bool(false),
        }
    }

    fn parse(content: &str, base: Option<&BuildDefaults>) -> Result<Self> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|e| Error::Config(format!("failed to parse defaults: {}", e)))?;

        let channel = match ini.get(SECTION, SettingKey::Channel.as_str()) {
            Some(channel) if !channel.is_empty() => channel,
            Some(_) => return Err(Error::Config("channel must not be empty".to_string())),
            None => required(base, SettingKey::Channel)?.channel.clone(),
        };

        let network_type = match ini
            .getint(SECTION, SettingKey::NetworkType.as_str())
            .map_err(|e| Error::Config(format!("network_type: {}", e)))?
        {
            Some(code) => code,
            None => required(base, SettingKey::NetworkType)?.network_type,
        };

        let battery_not_low = match ini
            .getbool(SECTION, SettingKey::BatteryNotLow.as_str())
            .map_err(|e| Error::Config(format!("battery_not_low: {}", e)))?
        {
            Some(value) => value,
            None => required(base, SettingKey::BatteryNotLow)?.battery_not_low,
        };

        let idle_reboot = match ini
            .getbool(SECTION, SettingKey::IdleReboot.as_str())
            .map_err(|e| Error::Config(format!("idle_reboot: {}", e)))?
        {
            Some(value) => value,
            None => required(base, SettingKey::IdleReboot)?.idle_reboot,
        };

        Ok(BuildDefaults {
            channel,
            network_type,
            battery_not_low,
            idle_reboot,
        })
    }
}

fn required(base: Option<&BuildDefaults>, key: SettingKey) -> Result<&BuildDefaults> {
    base.ok_or_else(|| Error::Config(format!("missing default for '{}'", key)))
}
