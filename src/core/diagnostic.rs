//! Side channel for problems the facade cannot report through itself.
//!
//! Delivery failures never propagate to the logging call site; they are
//! written to stderr with a bracketed severity tag instead.

use std::any::Any;

pub(crate) fn warn(message: impl AsRef<str>) {
    eprintln!("[LOGGER WARNING] {}", message.as_ref());
}

pub(crate) fn error(message: impl AsRef<str>) {
    eprintln!("[LOGGER ERROR] {}", message.as_ref());
}

pub(crate) fn critical(message: impl AsRef<str>) {
    eprintln!("[LOGGER CRITICAL] {}", message.as_ref());
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
