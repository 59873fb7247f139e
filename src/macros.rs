//! Logging macros recording the full call site.
//!
//! The macros forward to [`Logger::log_at`](crate::Logger::log_at) with the
//! file, line and module path of the invocation. Every argument is converted
//! with [`FieldValue::from`](crate::FieldValue), and the macro evaluates to
//! the `Result` of the call.
//!
//! # Examples
//!
//! ```
//! use rust_log_facade::{info, Level, Registry};
//!
//! let registry = Registry::new();
//! registry.set_default("null", Level::Info);
//! let logger = registry.get("server");
//!
//! // Plain message
//! info!(logger, "Server started").unwrap();
//!
//! // Named placeholders, filled by position
//! let port = 8080;
//! info!(logger, "Listening on {@host}:{@port}", "0.0.0.0", port).unwrap();
//! ```

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_log_facade::Registry;
/// # let registry = Registry::new();
/// # let logger = registry.get("app");
/// use rust_log_facade::{log, Level};
/// log!(logger, Level::Info, "Simple message").unwrap();
/// log!(logger, Level::Error, "Error code: {@code}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.log_at(
            $level,
            $crate::CallSite::new(file!(), line!(), module_path!()),
            $template,
            &[$($crate::FieldValue::from($arg)),*],
        )
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// ```
/// # use rust_log_facade::Registry;
/// # let logger = Registry::new().get("app");
/// use rust_log_facade::debug;
/// debug!(logger, "Counter value: {@counter}", 10).unwrap();
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// # use rust_log_facade::Registry;
/// # let logger = Registry::new().get("app");
/// use rust_log_facade::error;
/// error!(logger, "Request {@id} failed: {@reason}", 17u64, "timeout").unwrap();
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}
