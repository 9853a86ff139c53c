//! TOML-based application configuration.
//!
//! Stores backend settings including:
//! - Scheduler tuning (slot length, per-note cap, memory strength)
//! - ML service endpoint and timeout
//! - Auth secret and token lifetime
//!
//! Configuration is stored at `~/.config/neuronote/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::scheduler::{SchedulerConfig, MEMORY_STRENGTH};

use super::data_dir;

/// Scheduler-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: i64,
    #[serde(default = "default_max_blocks_per_note")]
    pub max_blocks_per_note: usize,
    #[serde(default = "default_memory_strength")]
    pub memory_strength: f64,
}

/// ML service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlConfig {
    #[serde(default = "default_ml_base_url")]
    pub base_url: String,
    /// Request timeout; pipeline jobs can run for minutes.
    #[serde(default = "default_ml_timeout_secs")]
    pub timeout_secs: u64,
}

/// Auth/session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_secret")]
    pub secret: String,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/neuronote/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub ml: MlConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

// Default functions
fn default_slot_minutes() -> i64 {
    30
}
fn default_max_blocks_per_note() -> usize {
    3
}
fn default_memory_strength() -> f64 {
    MEMORY_STRENGTH
}
fn default_ml_base_url() -> String {
    "http://ml:8000".into()
}
fn default_ml_timeout_secs() -> u64 {
    300
}
fn default_auth_secret() -> String {
    "dev_secret".into()
}
fn default_token_ttl_days() -> i64 {
    30
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            slot_minutes: default_slot_minutes(),
            max_blocks_per_note: default_max_blocks_per_note(),
            memory_strength: default_memory_strength(),
        }
    }
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            base_url: default_ml_base_url(),
            timeout_secs: default_ml_timeout_secs(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: default_auth_secret(),
            token_ttl_days: default_token_ttl_days(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            ml: MlConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Path of the configuration file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::DataDir(e.to_string()))?;
        Ok(dir.join("config.toml"))
    }

    /// Load the configuration from disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Load the configuration, falling back to defaults when missing or broken.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Save the configuration to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let raw =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, raw).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Runtime scheduler configuration derived from the config file.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            slot_minutes: self.schedule.slot_minutes,
            max_blocks_per_note: self.schedule.max_blocks_per_note,
            memory_strength: self.schedule.memory_strength,
        }
    }

    /// Look up a value by dotted key (e.g. "schedule.slot_minutes").
    pub fn get_value(&self, key: &str) -> Option<serde_json::Value> {
        let root = serde_json::to_value(self).ok()?;
        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?.clone();
        }
        Some(current)
    }

    /// Set a value by dotted key, coercing to the existing field's type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown_key = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".to_string(),
        };

        let mut root =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;

        let mut parts = key.split('.').peekable();
        let mut current = &mut root;
        while let Some(part) = parts.next() {
            let entry = current
                .as_object_mut()
                .ok_or_else(unknown_key)?
                .get_mut(part)
                .ok_or_else(unknown_key)?;
            if parts.peek().is_none() {
                *entry = coerce(entry, value).map_err(|message| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message,
                })?;
            }
            current = entry;
        }

        *self = serde_json::from_value(root).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(())
    }
}

/// Coerce a raw string to the JSON type already present at the target key.
fn coerce(existing: &serde_json::Value, value: &str) -> Result<serde_json::Value, String> {
    match existing {
        serde_json::Value::Bool(_) => value
            .parse::<bool>()
            .map(serde_json::Value::Bool)
            .map_err(|_| format!("cannot parse '{value}' as bool")),
        serde_json::Value::Number(_) => {
            if let Ok(n) = value.parse::<i64>() {
                Ok(serde_json::Value::Number(n.into()))
            } else if let Ok(n) = value.parse::<f64>() {
                serde_json::Number::from_f64(n)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| format!("cannot parse '{value}' as number"))
            } else {
                Err(format!("cannot parse '{value}' as number"))
            }
        }
        serde_json::Value::String(_) => Ok(serde_json::Value::String(value.to_string())),
        _ => Err("unsupported value type".to_string()),
    }
}
