//! Logger facade
//!
//! A [`Logger`] is a named view onto a [`Registry`](super::registry::Registry).
//! Every call resolves the backend and threshold for the logger's name at
//! that moment, so reconfiguring the registry affects existing loggers.

use super::event_entry::{CallSite, EventEntry};
use super::field::FieldValue;
use super::error::Result;
use super::level::Level;
use super::registry::RegistryState;
use super::template;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Weak;

pub struct Logger {
    name: String,
    registry: Weak<RwLock<RegistryState>>,
}

impl Logger {
    pub(crate) fn new(name: impl Into<String>, registry: Weak<RwLock<RegistryState>>) -> Self {
        Self {
            name: name.into(),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether an entry at `level` would currently reach a backend
    pub fn is_enabled(&self, level: Level) -> bool {
        self.registry
            .upgrade()
            .and_then(|state| state.read().resolve(&self.name))
            .map_or(false, |(_, threshold)| level >= threshold)
    }

    /// Log at `level`, recording the caller's file and line
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::ArgumentMismatch`](crate::LoggerError::ArgumentMismatch)
    /// when the number of `{@name}` placeholders differs from `args.len()`.
    #[track_caller]
    pub fn log(&self, level: Level, template: &str, args: &[FieldValue]) -> Result<()> {
        self.log_at(level, CallSite::caller(), template, args)
    }

    /// Log at `level` with an explicit call site, as the logging macros do
    pub fn log_at(
        &self,
        level: Level,
        site: CallSite,
        template: &str,
        args: &[FieldValue],
    ) -> Result<()> {
        // Registry dropped: nothing to deliver to
        let Some(state) = self.registry.upgrade() else {
            return Ok(());
        };
        let resolved = state.read().resolve(&self.name);
        drop(state);

        let Some((backend, threshold)) = resolved else {
            return Ok(());
        };
        if level < threshold {
            return Ok(());
        }

        let (message, attrs) = template::render(template, args)?;
        backend.send(
            EventEntry::new(level, self.name.as_str(), message)
                .with_attrs(attrs)
                .with_call_site(site),
        );
        Ok(())
    }

    #[track_caller]
    pub fn trace(&self, template: &str, args: &[FieldValue]) -> Result<()> {
        self.log(Level::Trace, template, args)
    }

    #[track_caller]
    pub fn debug(&self, template: &str, args: &[FieldValue]) -> Result<()> {
        self.log(Level::Debug, template, args)
    }

    #[track_caller]
    pub fn info(&self, template: &str, args: &[FieldValue]) -> Result<()> {
        self.log(Level::Info, template, args)
    }

    #[track_caller]
    pub fn warn(&self, template: &str, args: &[FieldValue]) -> Result<()> {
        self.log(Level::Warn, template, args)
    }

    #[track_caller]
    pub fn error(&self, template: &str, args: &[FieldValue]) -> Result<()> {
        self.log(Level::Error, template, args)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish()
    }
}
