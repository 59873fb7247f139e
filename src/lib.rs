//! # Rust Log Facade
//!
//! A structured-logging facade: applications obtain named loggers from a
//! [`Registry`], emit leveled events with `{@name}` message templates, and
//! the events are routed to pluggable backends through an ordered chain of
//! filters.
//!
//! ## Features
//!
//! - **Named loggers**: backend and threshold resolved per logger name
//! - **Filter chains**: asynchronous buffering and sampling wrap any backend
//! - **Backends**: console, rotating JSON-lines files, null
//! - **Structured entries**: template arguments kept as typed attributes
//!
//! ```
//! use rust_log_facade::{info, Config, Registry};
//! use serde_json::json;
//!
//! let registry = Registry::with_builtins();
//! registry
//!     .configure(&Config::new(json!({
//!         "default": { "backend": "null", "level": "info" },
//!     })))
//!     .unwrap();
//!
//! let logger = registry.get("app");
//! info!(logger, "user {@id} signed in", 42).unwrap();
//! registry.sync();
//! ```

pub mod backends;
pub mod core;
pub mod filters;
pub mod macros;

#[cfg(test)]
mod testing;

pub mod prelude {
    pub use crate::backends::NullBackend;
    #[cfg(feature = "console")]
    pub use crate::backends::ConsoleBackend;
    #[cfg(feature = "file")]
    pub use crate::backends::RotatingFileBackend;
    pub use crate::core::{
        global, Backend, CallSite, Config, EventEntry, FieldValue, Filter, Level, Logger,
        LoggerError, Registry, Result,
    };
    pub use crate::filters::{AsyncFilter, SamplingConfig, SamplingFilter};
}

pub use crate::core::{
    global, Attributes, Backend, CallSite, Config, EventEntry, FieldValue, Filter, Level, Logger,
    LoggerConfig, LoggerError, QueueMetrics, Registry, Result, TimestampFormat,
};
pub use filters::{AsyncFilter, SamplingFilter};
