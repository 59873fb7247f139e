//! Sampling filter for high-volume scenarios
//!
//! Forwards only a fraction of entries to the wrapped backend while levels
//! listed in `always_sample` are never dropped.
//!
//! Options under `filter.sampling`:
//!
//! - `rate`: sample rate between 0.0 and 1.0 (default 1.0)
//! - `always`: level tokens that bypass sampling (default `["error"]`)
//! - `loggers`: per logger name rates overriding `rate`

use crate::core::{Backend, Config, EventEntry, Filter, Level, Result};
use parking_lot::RwLock;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Configuration for log sampling
///
/// # Example
///
/// ```
/// use rust_log_facade::filters::SamplingConfig;
/// use rust_log_facade::Level;
///
/// // Sample 10% of entries, keep every warning and error, keep all of "audit"
/// let config = SamplingConfig::new(0.1)
///     .with_always_sample(vec![Level::Warn, Level::Error])
///     .with_logger_rate("audit", 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Sample rate between 0.0 and 1.0
    pub rate: f64,

    /// Levels that are never sampled out
    pub always_sample: Vec<Level>,

    /// Per logger name sample rates
    pub logger_rates: HashMap<String, f64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            always_sample: vec![Level::Error],
            logger_rates: HashMap::new(),
        }
    }
}

impl SamplingConfig {
    /// Create a new sampling config with the specified rate
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Set the levels that should always be forwarded
    #[must_use]
    pub fn with_always_sample(mut self, levels: Vec<Level>) -> Self {
        self.always_sample = levels;
        self
    }

    /// Add a rate for entries whose source is `logger`
    #[must_use]
    pub fn with_logger_rate(mut self, logger: impl Into<String>, rate: f64) -> Self {
        self.logger_rates.insert(logger.into(), rate.clamp(0.0, 1.0));
        self
    }

    fn clamped(mut self) -> Self {
        self.rate = self.rate.clamp(0.0, 1.0);
        for rate in self.logger_rates.values_mut() {
            *rate = rate.clamp(0.0, 1.0);
        }
        self
    }

    fn effective_rate(&self, source: &str) -> f64 {
        self.logger_rates.get(source).copied().unwrap_or(self.rate)
    }

    /// Decide whether `entry` passes the sampler
    pub fn should_sample(&self, entry: &EventEntry) -> bool {
        if self.always_sample.contains(&entry.level) {
            return true;
        }

        let rate = self.effective_rate(&entry.source);
        if rate >= 1.0 {
            return true;
        }
        if rate <= 0.0 {
            return false;
        }

        rand::thread_rng().gen::<f64>() < rate
    }
}

/// Metrics for sampling observability
#[derive(Debug, Default)]
pub struct SamplerMetrics {
    sampled_count: AtomicU64,
    dropped_count: AtomicU64,
}

impl SamplerMetrics {
    pub const fn new() -> Self {
        Self {
            sampled_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn sampled_count(&self) -> u64 {
        self.sampled_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_count(&self) -> u64 {
        self.sampled_count() + self.dropped_count()
    }

    /// Fraction of entries forwarded; 1.0 before anything was seen
    pub fn effective_sample_rate(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            1.0
        } else {
            self.sampled_count() as f64 / total as f64
        }
    }

    fn record(&self, sampled: bool) {
        if sampled {
            self.sampled_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.dropped_count.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Backend stage forwarding the entries that pass the sampler
pub struct SampledBackend {
    backend: Arc<dyn Backend>,
    config: Arc<RwLock<SamplingConfig>>,
    metrics: Arc<SamplerMetrics>,
}

impl Backend for SampledBackend {
    fn configure(&self, config: &Config) -> Result<()> {
        self.backend.configure(config)
    }

    fn send(&self, entry: EventEntry) {
        let sampled = self.config.read().should_sample(&entry);
        self.metrics.record(sampled);
        if sampled {
            self.backend.send(entry);
        }
    }

    fn sync(&self) {
        self.backend.sync();
    }
}

/// Filter named `sampling`; every chain it makes shares its configuration
/// and metrics.
pub struct SamplingFilter {
    config: Arc<RwLock<SamplingConfig>>,
    metrics: Arc<SamplerMetrics>,
}

impl SamplingFilter {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config.clamped())),
            metrics: Arc::new(SamplerMetrics::new()),
        }
    }

    pub fn config(&self) -> SamplingConfig {
        self.config.read().clone()
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }
}

impl Default for SamplingFilter {
    fn default() -> Self {
        Self::new(SamplingConfig::default())
    }
}

impl Filter for SamplingFilter {
    fn name(&self) -> &str {
        "sampling"
    }

    fn configure(&self, config: &Config) -> Result<()> {
        let defaults = SamplingConfig::default();
        let parsed = SamplingConfig {
            rate: config.scan(&["rate"])?.unwrap_or(defaults.rate),
            always_sample: config
                .scan(&["always"])?
                .unwrap_or(defaults.always_sample),
            logger_rates: config.scan(&["loggers"])?.unwrap_or_default(),
        };
        *self.config.write() = parsed.clamped();
        Ok(())
    }

    fn make_chain(&self, inner: Arc<dyn Backend>) -> Arc<dyn Backend> {
        Arc::new(SampledBackend {
            backend: inner,
            config: Arc::clone(&self.config),
            metrics: Arc::clone(&self.metrics),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBackend;
    use serde_json::json;

    fn entry_at(level: Level, source: &str) -> EventEntry {
        EventEntry::new(level, source, "sampled?")
    }

    #[test]
    fn test_sampling_config_new_clamps() {
        assert_eq!(SamplingConfig::new(0.5).rate, 0.5);
        assert_eq!(SamplingConfig::new(1.5).rate, 1.0);
        assert_eq!(SamplingConfig::new(-0.5).rate, 0.0);
    }

    #[test]
    fn test_rate_zero_keeps_only_always_levels() {
        let config = SamplingConfig::new(0.0);
        for _ in 0..10 {
            assert!(config.should_sample(&entry_at(Level::Error, "app")));
            assert!(!config.should_sample(&entry_at(Level::Info, "app")));
            assert!(!config.should_sample(&entry_at(Level::Warn, "app")));
        }
    }

    #[test]
    fn test_logger_rate_overrides_default() {
        let config = SamplingConfig::new(1.0).with_logger_rate("noisy", 0.0);
        assert!(config.should_sample(&entry_at(Level::Info, "quiet")));
        for _ in 0..10 {
            assert!(!config.should_sample(&entry_at(Level::Info, "noisy")));
        }
    }

    #[test]
    fn test_statistical_rate() {
        let config = SamplingConfig::new(0.5);
        let total = 10_000;
        let sampled = (0..total)
            .filter(|_| config.should_sample(&entry_at(Level::Info, "app")))
            .count();

        let rate = sampled as f64 / total as f64;
        assert!(
            (0.45..=0.55).contains(&rate),
            "Expected ~50% sample rate, got {}%",
            rate * 100.0
        );
    }

    #[test]
    fn test_sampled_backend_forwards_and_counts() {
        let filter = SamplingFilter::new(SamplingConfig::new(0.0));
        let sink = RecordingBackend::new();
        let chain = filter.make_chain(sink.clone());

        for _ in 0..20 {
            chain.send(entry_at(Level::Debug, "app"));
        }
        chain.send(entry_at(Level::Error, "app"));
        chain.sync();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.sync_count(), 1);
        assert_eq!(filter.metrics().sampled_count(), 1);
        assert_eq!(filter.metrics().dropped_count(), 20);
        assert!(filter.metrics().effective_sample_rate() < 0.1);
    }

    #[test]
    fn test_configure_from_section() {
        let filter = SamplingFilter::default();
        assert_eq!(filter.name(), "sampling");

        filter
            .configure(&Config::new(json!({
                "rate": 2.0,
                "always": ["warn", "ERROR"],
                "loggers": { "db": 0.25 },
            })))
            .unwrap();

        let config = filter.config();
        assert_eq!(config.rate, 1.0);
        assert_eq!(config.always_sample, vec![Level::Warn, Level::Error]);
        assert_eq!(config.logger_rates.get("db"), Some(&0.25));
    }

    #[test]
    fn test_configure_rejects_bad_level() {
        let filter = SamplingFilter::default();
        let err = filter
            .configure(&Config::new(json!({ "always": ["fatal"] })))
            .unwrap_err();
        assert!(matches!(err, crate::LoggerError::InvalidConfiguration { ref component, .. } if component == "always"));
        assert!(err.to_string().contains("fatal"));
        assert_eq!(filter.config(), SamplingConfig::default());
    }

    #[test]
    fn test_empty_section_resets_defaults() {
        let filter = SamplingFilter::new(SamplingConfig::new(0.1));
        filter.configure(&Config::empty()).unwrap();
        assert_eq!(filter.config(), SamplingConfig::default());
    }
}
