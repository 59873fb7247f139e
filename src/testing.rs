//! Test doubles shared by the unit tests

use crate::core::{Backend, Config, EventEntry, Level, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Records every entry it receives, optionally sleeping in `send`
#[derive(Default)]
pub(crate) struct RecordingBackend {
    pub events: Mutex<Vec<EventEntry>>,
    pub configs: Mutex<Vec<Config>>,
    pub syncs: AtomicUsize,
    pub delay: Option<Duration>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }
}

impl Backend for RecordingBackend {
    fn configure(&self, config: &Config) -> Result<()> {
        self.configs.lock().push(config.clone());
        Ok(())
    }

    fn send(&self, entry: EventEntry) {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.events.lock().push(entry);
    }

    fn sync(&self) {
        self.syncs.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn entry(message: impl Into<String>) -> EventEntry {
    EventEntry::new(Level::Info, "test", message)
}
