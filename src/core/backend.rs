//! Capability contracts for delivery backends and filter chain stages

use super::{config::Config, error::Result, event_entry::EventEntry};
use std::sync::Arc;

/// A terminal or intermediate consumer of entries.
///
/// Backends are shared across logging threads, so every method takes `&self`
/// and implementations guard their own mutable state.
pub trait Backend: Send + Sync {
    /// Apply the backend's own options sub-section
    fn configure(&self, config: &Config) -> Result<()>;

    /// Deliver one entry, best effort. Delivery failures are reported on the
    /// diagnostic channel and never surface to the caller.
    fn send(&self, entry: EventEntry);

    /// Block until every previously accepted entry has been forwarded
    fn sync(&self);
}

/// A backend decorator factory providing cross-cutting behavior.
pub trait Filter: Send + Sync {
    /// Unique identifier, also the key of the filter's `filter.{name}` section
    fn name(&self) -> &str;

    /// Apply the filter's options sub-section
    fn configure(&self, config: &Config) -> Result<()>;

    /// Wrap `inner` in a new outer backend honoring the same contract
    fn make_chain(&self, inner: Arc<dyn Backend>) -> Arc<dyn Backend>;
}
