//! Configuration tree handed to the registry, backends and filters
//!
//! A [`Config`] wraps an already-parsed JSON-compatible document. The
//! registry recognizes these top-level sections:
//!
//! - `backend.{name}`: options for the backend registered under `name`
//! - `filter.{name}`: options for the filter whose [`name`](crate::Filter::name) is `name`
//! - `default`: `{ backend, level }` used for loggers without their own entry
//! - `logger.{name}`: `{ backend, level }` overrides per logger name
//!
//! # Example
//!
//! ```
//! use rust_log_facade::Config;
//! use serde_json::json;
//!
//! let config = Config::new(json!({
//!     "backend": { "file": { "path": "/var/log/app", "maxsize": 1048576 } },
//!     "default": { "backend": "file", "level": "info" },
//! }));
//!
//! let file = config.sub_config(&["backend", "file"]);
//! assert_eq!(file.get_str("path", "./"), "/var/log/app");
//! assert_eq!(file.get_u64("maxsize", 0), 1048576);
//! ```

use super::error::{LoggerError, Result};
use super::level::Level;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    root: Value,
}

impl Config {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// An empty configuration; every lookup falls back to its default
    pub fn empty() -> Self {
        Self { root: Value::Null }
    }

    /// Parse a JSON document
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(s)?))
    }

    /// Build from any serializable tree, e.g. a document loaded from YAML or TOML
    pub fn from_serializable<T: Serialize>(tree: &T) -> Result<Self> {
        Ok(Self::new(serde_json::to_value(tree)?))
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// True when the node is absent or null
    pub fn is_empty(&self) -> bool {
        self.root.is_null()
    }

    fn lookup(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.root, |node, key| node.get(*key))
            .filter(|node| !node.is_null())
    }

    /// The sub-tree at `path`, or an empty config when any segment is missing
    pub fn sub_config(&self, path: &[&str]) -> Config {
        Config::new(self.lookup(path).cloned().unwrap_or(Value::Null))
    }

    pub fn get_str(&self, key: &str, default: &str) -> String {
        self.lookup(&[key])
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.lookup(&[key]).and_then(Value::as_u64).unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.lookup(&[key]).and_then(Value::as_f64).unwrap_or(default)
    }

    /// Read a duration given either as a humantime string (`"24h"`, `"90s"`,
    /// `"500ms"`) or as whole seconds.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is present but is neither form.
    pub fn get_duration(&self, key: &str, default: Duration) -> Result<Duration> {
        match self.lookup(&[key]) {
            None => Ok(default),
            Some(value) => parse_duration(value)
                .map_err(|message| LoggerError::config(key, message)),
        }
    }

    /// Deserialize the node at `path` into `T`; `None` when the node is absent
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] when the node exists but
    /// does not have the expected shape.
    pub fn scan<T: DeserializeOwned>(&self, path: &[&str]) -> Result<Option<T>> {
        match self.lookup(path) {
            None => Ok(None),
            Some(node) => serde_json::from_value(node.clone())
                .map(Some)
                .map_err(|e| LoggerError::config(path.join("."), e.to_string())),
        }
    }
}

fn parse_duration(value: &Value) -> std::result::Result<Duration, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(Duration::from_secs)
            .ok_or_else(|| format!("expected whole seconds, got {}", n)),
        Value::String(s) => humantime::parse_duration(s.trim()).map_err(|e| e.to_string()),
        other => Err(format!("expected a duration, got {}", other)),
    }
}

/// Backend name and threshold applied to a logger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub backend: String,
    pub level: Level,
}

impl LoggerConfig {
    pub fn new(backend: impl Into<String>, level: Level) -> Self {
        Self {
            backend: backend.into(),
            level,
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new("null", Level::Debug)
    }
}

/// The `default` and `logger` sections of a registry configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggerSettings {
    pub default: LoggerConfig,
    pub loggers: HashMap<String, LoggerConfig>,
}

impl LoggerSettings {
    /// Parse both sections. An absent `default` yields the built-in default
    /// and an absent `logger` section yields no overrides.
    ///
    /// # Errors
    ///
    /// Fails when either section is present but malformed, including
    /// unknown level tokens.
    pub fn from_config(config: &Config) -> Result<Self> {
        let default = config
            .scan::<LoggerConfig>(&["default"])?
            .unwrap_or_default();
        let loggers = config
            .scan::<HashMap<String, LoggerConfig>>(&["logger"])?
            .unwrap_or_default();

        Ok(Self { default, loggers })
    }
}
