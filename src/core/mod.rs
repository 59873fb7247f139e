//! Core facade types and traits

pub mod backend;
pub mod config;
pub(crate) mod diagnostic;
pub mod error;
pub mod event_entry;
pub mod field;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod registry;
pub mod template;
pub mod timestamp;

pub use backend::{Backend, Filter};
pub use config::{Config, LoggerConfig, LoggerSettings};
pub use error::{LoggerError, Result};
pub use event_entry::{CallSite, EventEntry};
pub use field::{Attributes, FieldValue};
pub use level::Level;
pub use logger::Logger;
pub use metrics::QueueMetrics;
pub use registry::{global, Registry};
pub use timestamp::TimestampFormat;
