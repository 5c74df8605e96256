//! Typed key/value settings accessor.
//!
//! Plugins consume persisted configuration read-only at `setup()`/`open()`
//! time: accuracy toggles, loop behavior, sampling method selection, ROM
//! strictness. The store is an opaque accessor with typed getters and a
//! default-value fallback; the on-disk format is whatever the owning
//! application serializes the map to (JSON via serde here).

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A single settings value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Boolean toggle.
    Bool(bool),
    /// Integer quantity.
    Int(i64),
    /// Free-form string (e.g. a sampling-method name).
    Str(String),
}

/// Thread-safe settings store with typed access and defaults.
#[derive(Debug, Default)]
pub struct Settings {
    values: RwLock<HashMap<String, SettingValue>>,
}

impl Settings {
    /// Read a boolean, falling back to `default` on absence or type mismatch.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.values.read().get(key) {
            Some(SettingValue::Bool(v)) => *v,
            _ => default,
        }
    }

    /// Read an integer, falling back to `default` on absence or type mismatch.
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        match self.values.read().get(key) {
            Some(SettingValue::Int(v)) => *v,
            _ => default,
        }
    }

    /// Read a string, falling back to `default` on absence or type mismatch.
    pub fn str_or(&self, key: &str, default: &str) -> String {
        match self.values.read().get(key) {
            Some(SettingValue::Str(v)) => v.clone(),
            _ => default.to_string(),
        }
    }

    /// Store a boolean.
    pub fn set_bool(&self, key: &str, value: bool) {
        self.values
            .write()
            .insert(key.to_string(), SettingValue::Bool(value));
    }

    /// Store an integer.
    pub fn set_int(&self, key: &str, value: i64) {
        self.values
            .write()
            .insert(key.to_string(), SettingValue::Int(value));
    }

    /// Store a string.
    pub fn set_str(&self, key: &str, value: &str) {
        self.values
            .write()
            .insert(key.to_string(), SettingValue::Str(value.to_string()));
    }

    /// Serialize the full map to a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.values.read())
    }

    /// Replace the store contents from a JSON object string.
    pub fn load_json(&self, json: &str) -> serde_json::Result<()> {
        let map: HashMap<String, SettingValue> = serde_json::from_str(json)?;
        *self.values.write() = map;
        Ok(())
    }
}
