//! Event entry structure

use super::field::Attributes;
use super::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Call-site metadata attached to every entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub function: &'static str,
}

impl CallSite {
    pub const fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        Self {
            file,
            line,
            function,
        }
    }

    /// Capture the caller's file and line; the function name is unknown
    /// outside of the logging macros.
    #[track_caller]
    pub fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
            function: "",
        }
    }
}

/// One log event, created once per call and never mutated afterwards.
///
/// Entries own all of their data so they can be queued and consumed on the
/// async dispatch thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    #[serde(rename = "@t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "@l")]
    pub level: Level,
    #[serde(rename = "@m")]
    pub message: String,
    #[serde(rename = "@a", default)]
    pub attrs: Attributes,
    #[serde(rename = "@s")]
    pub source: String,
    #[serde(rename = "@f", default)]
    pub file: String,
    #[serde(rename = "@line", default)]
    pub line: u32,
    #[serde(rename = "@func", default)]
    pub function: String,
}

impl EventEntry {
    pub fn new(level: Level, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            attrs: Attributes::new(),
            source: source.into(),
            file: String::new(),
            line: 0,
            function: String::new(),
        }
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    #[must_use]
    pub fn with_call_site(mut self, site: CallSite) -> Self {
        self.file = site.file.to_string();
        self.line = site.line;
        self.function = site.function.to_string();
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Serialize as a single JSON line (without the trailing newline)
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
