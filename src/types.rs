use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// All settings keyed by their persisted name, as shown by the CLI
pub type Snapshot = BTreeMap<String, serde_json::Value>;

/// The fixed set of persisted settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Channel,
    NetworkType,
    BatteryNotLow,
    IdleReboot,
    /// Written by the update pipeline once an update is staged
    WaitingForReboot,
}

/// The value kind a key stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Bool,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::Channel,
        SettingKey::NetworkType,
        SettingKey::BatteryNotLow,
        SettingKey::IdleReboot,
        SettingKey::WaitingForReboot,
    ];

    /// Persisted key name
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Channel => "channel",
            SettingKey::NetworkType => "network_type",
            SettingKey::BatteryNotLow => "battery_not_low",
            SettingKey::IdleReboot => "idle_reboot",
            SettingKey::WaitingForReboot => "waiting_for_reboot",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            SettingKey::Channel => ValueKind::String,
            SettingKey::NetworkType => ValueKind::Integer,
            SettingKey::BatteryNotLow | SettingKey::IdleReboot | SettingKey::WaitingForReboot => {
                ValueKind::Bool
            }
        }
    }

    /// Whether a change to this key should provoke a fresh update check
    pub fn affects_eligibility(self) -> bool {
        matches!(
            self,
            SettingKey::Channel | SettingKey::NetworkType | SettingKey::BatteryNotLow
        )
    }

    pub fn is_user_editable(self) -> bool {
        self != SettingKey::WaitingForReboot
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| Error::InvalidValue {
                key: s.to_string(),
                message: "unknown setting".to_string(),
            })
    }
}

/// A persisted setting value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Integer(i64),
    String(String),
}

impl SettingValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SettingValue::Bool(_) => ValueKind::Bool,
            SettingValue::Integer(_) => ValueKind::Integer,
            SettingValue::String(_) => ValueKind::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SettingValue::Bool(b) => serde_json::Value::Bool(*b),
            SettingValue::Integer(i) => serde_json::Value::Number((*i).into()),
            SettingValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::String(value)
    }
}

impl TryFrom<serde_json::Value> for SettingValue {
    type Error = Error;

    /// Only booleans, integers that fit `i64` and strings are settings
    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(SettingValue::Bool(b)),
            serde_json::Value::String(s) => Ok(SettingValue::String(s)),
            serde_json::Value::Number(n) => {
                n.as_i64()
                    .map(SettingValue::Integer)
                    .ok_or_else(|| Error::InvalidValue {
                        key: "value".to_string(),
                        message: format!("{} is not an integer setting", n),
                    })
            }
            other => Err(Error::InvalidValue {
                key: "value".to_string(),
                message: format!("unsupported JSON value {}", other),
            }),
        }
    }
}

/// Network constraint handed to the job scheduler, stored as its code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    Any = 1,
    Unmetered = 2,
    NotRoaming = 3,
}

impl NetworkType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<NetworkType> {
        match code {
            1 => Some(NetworkType::Any),
            2 => Some(NetworkType::Unmetered),
            3 => Some(NetworkType::NotRoaming),
            _ => None,
        }
    }
}

impl FromStr for NetworkType {
    type Err = Error;

    /// Accepts either the numeric code or the snake_case name
    fn from_str(s: &str) -> Result<Self> {
        let parsed = match s.trim() {
            "any" => Some(NetworkType::Any),
            "unmetered" => Some(NetworkType::Unmetered),
            "not_roaming" => Some(NetworkType::NotRoaming),
            other => other.parse::<i64>().ok().and_then(NetworkType::from_code),
        };
        parsed.ok_or_else(|| Error::InvalidValue {
            key: SettingKey::NetworkType.to_string(),
            message: format!("'{s}' is not one of any, unmetered, not_roaming or 1-3"),
        })
    }
}
