//! Backend implementations

#[cfg(feature = "console")]
pub mod console;
pub mod null;
#[cfg(feature = "file")]
pub mod rotating_file;

#[cfg(feature = "console")]
pub use console::{ConsoleBackend, ConsoleFormatter};
pub use null::NullBackend;
#[cfg(feature = "file")]
pub use rotating_file::{FileSettings, RotatingFileBackend};
