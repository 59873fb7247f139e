//! Filters that decorate backends with cross-cutting behavior

pub mod async_buffer;
pub mod sampling;

pub use async_buffer::{AsyncBackend, AsyncFilter, QueueState, DEFAULT_QUEUE_SIZE, DEFAULT_SHUTDOWN_TIMEOUT};
pub use sampling::{SampledBackend, SamplerMetrics, SamplingConfig, SamplingFilter};
