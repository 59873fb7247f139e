//! Logger registry
//!
//! The registry owns every backend (already wrapped in the filter chain),
//! the ordered filter list, the per-name logger configuration and the cache
//! of [`Logger`] handles.
//!
//! Filter chain order is registration order: the first registered filter is
//! innermost, the last registered is outermost. The order is the same
//! whether a backend is registered before or after the filters.

use super::backend::{Backend, Filter};
use super::config::{Config, LoggerConfig, LoggerSettings};
use super::diagnostic;
use super::error::Result;
use super::level::Level;
use super::logger::Logger;
use crate::backends::NullBackend;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct RegistryState {
    filters: Vec<Arc<dyn Filter>>,
    backends: HashMap<String, Arc<dyn Backend>>,
    loggers: HashMap<String, Arc<Logger>>,
    default: LoggerConfig,
    configs: HashMap<String, LoggerConfig>,
}

impl RegistryState {
    /// Backend and threshold for `name`; `None` drops the event
    pub(crate) fn resolve(&self, name: &str) -> Option<(Arc<dyn Backend>, Level)> {
        let config = self.configs.get(name).unwrap_or(&self.default);
        match self.backends.get(&config.backend) {
            Some(backend) => Some((Arc::clone(backend), config.level)),
            None => {
                diagnostic::warn(format!(
                    "Logger '{}' targets unregistered backend '{}'; event dropped",
                    name, config.backend
                ));
                None
            }
        }
    }

    fn wrap(&self, backend: Arc<dyn Backend>) -> Arc<dyn Backend> {
        self.filters
            .iter()
            .fold(backend, |inner, filter| filter.make_chain(inner))
    }
}

/// Registry of backends, filters and loggers
///
/// Cloning is cheap and yields a handle to the same registry.
///
/// # Example
///
/// ```
/// use rust_log_facade::{Config, Registry};
/// use serde_json::json;
///
/// let registry = Registry::new();
/// registry
///     .configure(&Config::new(json!({ "default": { "backend": "null", "level": "info" } })))
///     .unwrap();
///
/// let logger = registry.get("app");
/// logger.info("started in {@ms} ms", &[12.into()]).unwrap();
/// registry.sync();
/// ```
#[derive(Clone)]
pub struct Registry {
    state: Arc<RwLock<RegistryState>>,
}

impl Registry {
    /// A registry with only the `null` backend and no filters
    pub fn new() -> Self {
        let registry = Self {
            state: Arc::new(RwLock::new(RegistryState {
                filters: Vec::new(),
                backends: HashMap::new(),
                loggers: HashMap::new(),
                default: LoggerConfig::default(),
                configs: HashMap::new(),
            })),
        };
        registry.register_backend("null", Arc::new(NullBackend::new()));
        registry
    }

    /// A registry with the `console` and `file` backends and the `async`
    /// filter, as enabled by crate features
    pub fn with_builtins() -> Self {
        let registry = Self::new();

        #[cfg(feature = "console")]
        registry.register_backend("console", Arc::new(crate::backends::ConsoleBackend::new()));

        #[cfg(feature = "file")]
        registry.register_backend("file", Arc::new(crate::backends::RotatingFileBackend::new()));

        registry.register_filter(Arc::new(crate::filters::AsyncFilter::default()));
        registry
    }

    /// Register `backend` under `name`, wrapped in every registered filter.
    /// An existing backend with the same name is replaced.
    pub fn register_backend(&self, name: impl Into<String>, backend: Arc<dyn Backend>) {
        let replaced = {
            let mut state = self.state.write();
            let wrapped = state.wrap(backend);
            state.backends.insert(name.into(), wrapped)
        };
        // Dropping an async chain drains it; never do that under the lock
        drop(replaced);
    }

    /// Append `filter` and make it the outermost layer of every registered
    /// backend
    pub fn register_filter(&self, filter: Arc<dyn Filter>) {
        let mut state = self.state.write();
        for backend in state.backends.values_mut() {
            *backend = filter.make_chain(Arc::clone(backend));
        }
        state.filters.push(filter);
    }

    /// Apply a configuration tree.
    ///
    /// Each backend receives its `backend.{name}` section and each filter its
    /// `filter.{name}` section; a failure there is reported on stderr and the
    /// remaining components are still configured. The `default` and `logger`
    /// sections then replace the logger configuration wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`](crate::LoggerError::InvalidConfiguration)
    /// when the `default` or `logger` section is malformed.
    pub fn configure(&self, config: &Config) -> Result<()> {
        let (backends, filters) = {
            let state = self.state.read();
            let backends: Vec<(String, Arc<dyn Backend>)> = state
                .backends
                .iter()
                .map(|(name, backend)| (name.clone(), Arc::clone(backend)))
                .collect();
            (backends, state.filters.clone())
        };

        for (name, backend) in &backends {
            if let Err(e) = backend.configure(&config.sub_config(&["backend", name])) {
                diagnostic::error(format!("Failed to configure backend '{}': {}", name, e));
            }
        }
        for filter in &filters {
            if let Err(e) = filter.configure(&config.sub_config(&["filter", filter.name()])) {
                diagnostic::error(format!(
                    "Failed to configure filter '{}': {}",
                    filter.name(),
                    e
                ));
            }
        }

        let settings = LoggerSettings::from_config(config)?;
        let mut state = self.state.write();
        state.default = settings.default;
        state.configs = settings.loggers;
        Ok(())
    }

    /// The logger named `name`; repeated calls return the same instance
    pub fn get(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self.state.read().loggers.get(name) {
            return Arc::clone(logger);
        }

        let mut state = self.state.write();
        let weak = Arc::downgrade(&self.state);
        Arc::clone(
            state
                .loggers
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Logger::new(name, weak))),
        )
    }

    /// Sync every registered backend in turn, blocking until each has
    /// delivered everything it accepted
    pub fn sync(&self) {
        let backends: Vec<Arc<dyn Backend>> = self.state.read().backends.values().cloned().collect();
        for backend in backends {
            backend.sync();
        }
    }

    /// The wrapped backend and threshold that apply to logger `name`
    pub fn resolve(&self, name: &str) -> Option<(Arc<dyn Backend>, Level)> {
        self.state.read().resolve(name)
    }

    /// Replace the configuration used by loggers without their own entry
    pub fn set_default(&self, backend: impl Into<String>, level: Level) {
        self.state.write().default = LoggerConfig::new(backend, level);
    }

    /// Set the configuration for one logger name
    pub fn set_logger_config(&self, name: impl Into<String>, backend: impl Into<String>, level: Level) {
        self.state
            .write()
            .configs
            .insert(name.into(), LoggerConfig::new(backend, level));
    }

    /// Registered backend names, sorted
    pub fn backend_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered filter names, innermost first
    pub fn filter_names(&self) -> Vec<String> {
        self.state
            .read()
            .filters
            .iter()
            .map(|filter| filter.name().to_string())
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::with_builtins);

/// Process-wide registry with the built-in backends and filters
pub fn global() -> &'static Registry {
    &GLOBAL
}
