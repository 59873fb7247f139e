//! Console backend
//!
//! Renders each entry through an output pattern and writes it to stdout, or
//! to stderr for `error` entries. Pattern tokens:
//!
//! | token   | replaced by                 |
//! |---------|-----------------------------|
//! | `@t`    | timestamp                   |
//! | `@s`    | source (logger name)        |
//! | `@l`    | level, colored when enabled |
//! | `@m`    | rendered message            |
//! | `@func` | function or module path     |
//! | `@line` | line number                 |
//! | `@f`    | file                        |
//!
//! Options under `backend.console`:
//!
//! ```json
//! { "formatter": { "timestamp": "iso8601", "output": "@t @l @m", "colors": false } }
//! ```

use crate::core::{Backend, Config, EventEntry, Level, Result, TimestampFormat};
use colored::Colorize;
use parking_lot::RwLock;
use std::io::Write;

/// Output pattern used when `formatter.output` is not set
pub const DEFAULT_OUTPUT: &str = "@t |@s| |@l| @m \n from: @func:@line";

/// Longer tokens first so `@func` is not read as `@f`
const TOKENS: [&str; 7] = ["func", "line", "t", "s", "l", "m", "f"];

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleFormatter {
    pub timestamp: TimestampFormat,
    pub output: String,
    pub colors: bool,
}

impl Default for ConsoleFormatter {
    fn default() -> Self {
        Self {
            timestamp: TimestampFormat::default(),
            output: DEFAULT_OUTPUT.to_string(),
            colors: true,
        }
    }
}

impl ConsoleFormatter {
    fn from_config(config: &Config) -> Result<Self> {
        let defaults = Self::default();
        let formatter = config.sub_config(&["formatter"]);
        let timestamp =
            TimestampFormat::parse(&formatter.get_str("timestamp", &defaults.timestamp.to_string()));
        timestamp.validate()?;

        Ok(Self {
            timestamp,
            output: formatter.get_str("output", &defaults.output),
            colors: formatter
                .as_value()
                .get("colors")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(defaults.colors),
        })
    }

    /// Render `entry` through the output pattern
    pub fn format(&self, entry: &EventEntry) -> String {
        let mut out = String::with_capacity(self.output.len() + entry.message.len() + 64);
        let mut rest = self.output.as_str();

        while let Some(at) = rest.find('@') {
            out.push_str(&rest[..at]);
            let after = &rest[at + 1..];
            match TOKENS.iter().find(|token| after.starts_with(**token)) {
                Some(token) => {
                    self.push_token(&mut out, token, entry);
                    rest = &after[token.len()..];
                }
                None => {
                    out.push('@');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn push_token(&self, out: &mut String, token: &str, entry: &EventEntry) {
        match token {
            "t" => out.push_str(&self.timestamp.format(&entry.timestamp)),
            "s" => out.push_str(&entry.source),
            "l" => out.push_str(&self.level_text(entry.level)),
            "m" => out.push_str(&entry.message),
            "func" => out.push_str(&entry.function),
            "line" => out.push_str(&entry.line.to_string()),
            "f" => out.push_str(&entry.file),
            _ => {}
        }
    }

    fn level_text(&self, level: Level) -> String {
        if self.colors {
            level.to_str().color(level.color_code()).to_string()
        } else {
            level.to_str().to_string()
        }
    }
}

pub struct ConsoleBackend {
    formatter: RwLock<ConsoleFormatter>,
}

impl ConsoleBackend {
    pub fn new() -> Self {
        Self::with_formatter(ConsoleFormatter::default())
    }

    pub fn with_formatter(formatter: ConsoleFormatter) -> Self {
        Self {
            formatter: RwLock::new(formatter),
        }
    }

    pub fn formatter(&self) -> ConsoleFormatter {
        self.formatter.read().clone()
    }
}

impl Default for ConsoleBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for ConsoleBackend {
    fn configure(&self, config: &Config) -> Result<()> {
        *self.formatter.write() = ConsoleFormatter::from_config(config)?;
        Ok(())
    }

    fn send(&self, entry: EventEntry) {
        let output = self.formatter.read().format(&entry);

        // Route errors to stderr, everything else to stdout
        match entry.level {
            Level::Error => eprintln!("{}", output),
            _ => println!("{}", output),
        }
    }

    fn sync(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}
