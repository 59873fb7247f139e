//! Backend that discards everything

use crate::core::{Backend, Config, EventEntry, Result};

/// Default target of every logger until configured otherwise
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl NullBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for NullBackend {
    fn configure(&self, _config: &Config) -> Result<()> {
        Ok(())
    }

    fn send(&self, _entry: EventEntry) {}

    fn sync(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::entry;
    use serde_json::json;

    #[test]
    fn test_null_backend_accepts_anything() {
        let backend = NullBackend::new();
        backend
            .configure(&Config::new(json!({ "whatever": [1, 2, 3] })))
            .unwrap();
        backend.send(entry("gone"));
        backend.sync();
    }
}
