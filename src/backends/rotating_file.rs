//! Rotating file backend
//!
//! Appends every entry as one JSON line to `{path}/{name}-{timestamp}.{extension}`.
//! After each write the backend checks the current file against `maxsize` and
//! `rotation_time`; once either is exceeded the next write goes to a fresh
//! file. On `configure` the directory is scanned so a restarted process keeps
//! appending to its latest file when that file is still within limits.
//!
//! Options under `backend.file`:
//!
//! | key             | default                     |
//! |-----------------|-----------------------------|
//! | `path`          | `./`                        |
//! | `name`          | `unknown`                   |
//! | `extension`     | `log`                       |
//! | `maxsize`       | 10 MiB                      |
//! | `rotation_time` | `24h` (or integer seconds)  |
//! | `timestamp`     | `%Y-%m-%dT%H-%M-%S%.6f`     |

use crate::core::diagnostic;
use crate::core::{Backend, Config, EventEntry, LoggerError, Result, TimestampFormat};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_ROTATION_TIME: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_FILE_TIMESTAMP: &str = "%Y-%m-%dT%H-%M-%S%.6f";

/// Where files go and when they roll over
#[derive(Debug, Clone, PartialEq)]
pub struct FileSettings {
    pub directory: PathBuf,
    pub name: String,
    pub extension: String,
    pub max_size: u64,
    pub rotation_time: Duration,
    pub timestamp: TimestampFormat,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./"),
            name: "unknown".to_string(),
            extension: "log".to_string(),
            max_size: DEFAULT_MAX_SIZE,
            rotation_time: DEFAULT_ROTATION_TIME,
            timestamp: TimestampFormat::Custom(DEFAULT_FILE_TIMESTAMP.to_string()),
        }
    }
}

impl FileSettings {
    /// Read settings from a `backend.file` section, falling back to the
    /// defaults key by key.
    ///
    /// # Errors
    ///
    /// Fails when `rotation_time` is present but not a duration, or when
    /// `timestamp` is not a valid strftime pattern.
    pub fn from_config(config: &Config) -> Result<Self> {
        let defaults = Self::default();
        let timestamp = TimestampFormat::parse(&config.get_str("timestamp", DEFAULT_FILE_TIMESTAMP));
        timestamp.validate()?;

        Ok(Self {
            directory: PathBuf::from(config.get_str("path", "./")),
            name: config.get_str("name", &defaults.name),
            extension: config
                .get_str("extension", &defaults.extension)
                .trim_start_matches('.')
                .to_string(),
            max_size: config.get_u64("maxsize", defaults.max_size),
            rotation_time: config.get_duration("rotation_time", defaults.rotation_time)?,
            timestamp,
        })
    }

    pub fn file_path(&self, timestamp: &DateTime<Utc>) -> PathBuf {
        self.directory.join(format!(
            "{}-{}.{}",
            self.name,
            self.timestamp.format(timestamp),
            self.extension
        ))
    }

    /// Recover the timestamp encoded in a file name produced by
    /// [`file_path`](Self::file_path); `None` for foreign files.
    fn timestamp_of(&self, file_name: &str) -> Option<std::result::Result<DateTime<Utc>, String>> {
        let suffix = file_name
            .strip_prefix(self.name.as_str())?
            .strip_prefix('-')?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;

        Some(
            self.timestamp
                .parse_timestamp(suffix)
                .ok_or_else(|| format!("'{}' does not match '{}'", suffix, self.timestamp)),
        )
    }

    fn expired(&self, selected_at: &DateTime<Utc>, now: &DateTime<Utc>) -> bool {
        // A clock that moved backwards counts as no time elapsed
        (*now - *selected_at)
            .to_std()
            .map(|elapsed| elapsed > self.rotation_time)
            .unwrap_or(false)
    }
}

/// The file currently written to
struct FileState {
    settings: FileSettings,
    current_path: Option<PathBuf>,
    current_timestamp: Option<DateTime<Utc>>,
    current_size: u64,
    writer: Option<BufWriter<File>>,
}

impl FileState {
    fn new(settings: FileSettings) -> Self {
        Self {
            settings,
            current_path: None,
            current_timestamp: None,
            current_size: 0,
            writer: None,
        }
    }

    /// Point the cursor at a brand new file. Its timestamp is strictly later
    /// than the previous one so the name never repeats.
    fn select_new_file(&mut self, previous: Option<DateTime<Utc>>) {
        let now = Utc::now();
        let timestamp = match previous {
            Some(previous) if now <= previous => previous + chrono::Duration::microseconds(1),
            _ => now,
        };

        self.current_path = Some(self.settings.file_path(&timestamp));
        self.current_timestamp = Some(timestamp);
        self.current_size = 0;
    }

    fn close_writer(&mut self) -> std::io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }

    /// Scan the directory for the newest usable file of this backend
    fn recover(&mut self) -> Result<()> {
        let settings = &self.settings;
        fs::create_dir_all(&settings.directory).map_err(|e| {
            LoggerError::io_operation(
                "creating log directory",
                settings.directory.display().to_string(),
                e,
            )
        })?;

        let entries = fs::read_dir(&settings.directory).map_err(|e| {
            LoggerError::io_operation(
                "scanning log directory",
                settings.directory.display().to_string(),
                e,
            )
        })?;

        let mut latest: Option<(DateTime<Utc>, PathBuf, u64)> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let timestamp = match settings.timestamp_of(file_name) {
                None => continue,
                Some(Ok(timestamp)) => timestamp,
                Some(Err(reason)) => {
                    diagnostic::warn(format!(
                        "Skipping log file {}: unparseable timestamp {}",
                        path.display(),
                        reason
                    ));
                    continue;
                }
            };

            let size = match entry.metadata() {
                Ok(metadata) if metadata.is_file() => metadata.len(),
                Ok(_) => continue,
                Err(e) => {
                    diagnostic::warn(format!("Skipping log file {}: {}", path.display(), e));
                    continue;
                }
            };
            if size > settings.max_size {
                continue;
            }

            if latest.as_ref().map_or(true, |(best, _, _)| timestamp > *best) {
                latest = Some((timestamp, path, size));
            }
        }

        match latest {
            Some((timestamp, path, size)) if !settings.expired(&timestamp, &Utc::now()) => {
                self.current_path = Some(path);
                self.current_timestamp = Some(timestamp);
                self.current_size = size;
            }
            Some((timestamp, _, _)) => self.select_new_file(Some(timestamp)),
            None => self.select_new_file(None),
        }
        Ok(())
    }

    fn open_current(&mut self) -> Result<&mut BufWriter<File>> {
        if self.current_path.is_none() {
            self.select_new_file(self.current_timestamp);
        }
        let path = self.current_path.clone().unwrap_or_default();

        if self.writer.is_none() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| {
                    LoggerError::file_backend(path.display().to_string(), format!("Failed to open: {}", e))
                })?;
            self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
            self.writer = Some(BufWriter::new(file));
        }

        self.writer
            .as_mut()
            .ok_or_else(|| LoggerError::other("writer not initialized"))
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let writer = self.open_current()?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        self.current_size += line.len() as u64 + 1;

        let now = Utc::now();
        let too_old = self
            .current_timestamp
            .map_or(false, |selected_at| self.settings.expired(&selected_at, &now));

        if self.current_size > self.settings.max_size || too_old {
            self.close_writer()?;
            self.select_new_file(self.current_timestamp);
        }
        Ok(())
    }
}

/// File backend registered as `file`
pub struct RotatingFileBackend {
    state: Mutex<FileState>,
}

impl RotatingFileBackend {
    pub fn new() -> Self {
        Self::with_settings(FileSettings::default())
    }

    /// Use `settings` without scanning the directory; the first write opens
    /// a new file.
    pub fn with_settings(settings: FileSettings) -> Self {
        Self {
            state: Mutex::new(FileState::new(settings)),
        }
    }

    pub fn settings(&self) -> FileSettings {
        self.state.lock().settings.clone()
    }

    /// File the next entry will be appended to, once one has been selected
    pub fn current_path(&self) -> Option<PathBuf> {
        self.state.lock().current_path.clone()
    }

    pub fn current_size(&self) -> u64 {
        self.state.lock().current_size
    }

    /// Apply `settings` and recover the cursor from `settings.directory`
    pub fn reconfigure(&self, settings: FileSettings) -> Result<()> {
        let mut state = self.state.lock();
        if let Err(e) = state.close_writer() {
            diagnostic::error(format!("Failed to flush log file before reconfigure: {}", e));
        }
        *state = FileState::new(settings);
        state.recover()
    }
}

impl Default for RotatingFileBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for RotatingFileBackend {
    fn configure(&self, config: &Config) -> Result<()> {
        self.reconfigure(FileSettings::from_config(config)?)
    }

    fn send(&self, entry: EventEntry) {
        let line = match entry.to_json() {
            Ok(line) => line,
            Err(e) => {
                diagnostic::error(format!("Failed to serialize log entry: {}", e));
                return;
            }
        };

        let mut state = self.state.lock();
        if let Err(e) = state.write_line(&line) {
            diagnostic::error(format!(
                "Failed to write log entry to {}: {}",
                state
                    .current_path
                    .as_deref()
                    .unwrap_or_else(|| Path::new("<unselected>"))
                    .display(),
                e
            ));
        }
    }

    fn sync(&self) {
        let mut state = self.state.lock();
        let flushed = match state.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        };
        if let Err(e) = flushed {
            diagnostic::error(format!("Failed to flush log file: {}", e));
        }
    }
}

impl Drop for RotatingFileBackend {
    fn drop(&mut self) {
        // Best effort flush - ignore errors during drop
        let _ = self.state.get_mut().close_writer();
    }
}
