//! Asynchronous buffering filter
//!
//! [`AsyncFilter`] wraps any backend in an [`AsyncBackend`]: producers push
//! entries into a bounded queue and a dedicated dispatch thread forwards them,
//! in order, to the wrapped backend. A slow sink therefore only blocks callers
//! when the queue is full.
//!
//! Lifecycle of one wrapper:
//!
//! ```text
//! Unstarted --first send--> Running --sync--> Draining --queue empty--> Closed
//! ```
//!
//! Every entry accepted before `sync` is called is delivered before `sync`
//! returns. Once draining has begun, further sends are dropped silently.

use crate::core::diagnostic;
use crate::core::{Backend, Config, EventEntry, Filter, QueueMetrics, Result};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Queue capacity used when the filter section does not set `size`
pub const DEFAULT_QUEUE_SIZE: usize = 1000;

/// Upper bound on how long dropping a running wrapper waits for its queue
/// to drain. Explicit [`Backend::sync`] calls wait without a bound.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// No queue or dispatch thread yet
    Unstarted,
    /// Dispatch thread forwarding entries
    Running,
    /// Closed to producers, dispatch thread emptying the queue
    Draining,
    /// Dispatch thread finished; terminal
    Closed,
}

struct Inner {
    state: QueueState,
    sender: Option<Sender<EventEntry>>,
    worker: Option<JoinHandle<()>>,
    capacity: Option<usize>,
}

/// State shared between the wrapper and its dispatch thread
struct Shared {
    inner: Mutex<Inner>,
    drained: Condvar,
    metrics: QueueMetrics,
}

/// Backend that queues entries for a dispatch thread; see the module docs.
pub struct AsyncBackend {
    backend: Arc<dyn Backend>,
    capacity: Arc<AtomicUsize>,
    shared: Arc<Shared>,
}

impl AsyncBackend {
    /// Wrap `backend` with a queue of `capacity` entries
    pub fn new(backend: Arc<dyn Backend>, capacity: usize) -> Self {
        Self::with_shared_capacity(backend, Arc::new(AtomicUsize::new(capacity)))
    }

    /// The capacity is read when the queue is created on the first send, so
    /// configuring the owning filter before logging starts takes effect.
    fn with_shared_capacity(backend: Arc<dyn Backend>, capacity: Arc<AtomicUsize>) -> Self {
        Self {
            backend,
            capacity,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: QueueState::Unstarted,
                    sender: None,
                    worker: None,
                    capacity: None,
                }),
                drained: Condvar::new(),
                metrics: QueueMetrics::new(),
            }),
        }
    }

    pub fn state(&self) -> QueueState {
        self.shared.inner.lock().state
    }

    /// Capacity of the live queue, `None` before the first send
    pub fn queue_capacity(&self) -> Option<usize> {
        self.shared.inner.lock().capacity
    }

    pub fn metrics(&self) -> &QueueMetrics {
        &self.shared.metrics
    }

    /// Create the queue and spawn the dispatch thread. Called with the lock
    /// held, so concurrent first sends start exactly one thread.
    fn start(&self, inner: &mut Inner) {
        let capacity = self.capacity.load(Ordering::Relaxed);
        let (sender, receiver) = bounded::<EventEntry>(capacity);
        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.shared);

        let spawned = thread::Builder::new()
            .name("log-dispatch".to_string())
            .spawn(move || {
                for entry in receiver.iter() {
                    let delivered = catch_unwind(AssertUnwindSafe(|| backend.send(entry)));
                    match delivered {
                        Ok(()) => {
                            shared.metrics.record_delivered();
                        }
                        Err(payload) => {
                            shared.metrics.record_panic();
                            diagnostic::critical(format!(
                                "Backend panicked during async delivery: {}. Dispatch continues.",
                                diagnostic::panic_message(payload.as_ref())
                            ));
                        }
                    }
                }

                let mut inner = shared.inner.lock();
                inner.state = QueueState::Closed;
                shared.drained.notify_all();
            });

        match spawned {
            Ok(handle) => {
                inner.state = QueueState::Running;
                inner.sender = Some(sender);
                inner.worker = Some(handle);
                inner.capacity = Some(capacity);
            }
            Err(e) => {
                diagnostic::critical(format!(
                    "Failed to spawn log dispatch thread: {}. Entries for this backend will be dropped.",
                    e
                ));
                inner.state = QueueState::Closed;
            }
        }
    }

    /// Close the queue and wait until the dispatch thread has drained it.
    ///
    /// Returns `true` when this call performed (or waited for) the drain,
    /// `false` when there was nothing to drain or the deadline passed first.
    fn drain(&self, deadline: Option<Instant>) -> bool {
        let mut inner = self.shared.inner.lock();
        match inner.state {
            QueueState::Unstarted | QueueState::Closed => return false,
            QueueState::Running => {
                inner.state = QueueState::Draining;
                // Dropping the last producer-side handle closes the channel;
                // producers mid-send hold their own clone until they finish.
                inner.sender = None;
            }
            QueueState::Draining => {}
        }

        while inner.state != QueueState::Closed {
            match deadline {
                None => self.shared.drained.wait(&mut inner),
                Some(deadline) => {
                    if self
                        .shared
                        .drained
                        .wait_until(&mut inner, deadline)
                        .timed_out()
                    {
                        return inner.state == QueueState::Closed;
                    }
                }
            }
        }

        let worker = inner.worker.take();
        drop(inner);
        if let Some(handle) = worker {
            if let Err(e) = handle.join() {
                diagnostic::error(format!("Log dispatch thread panicked during shutdown: {:?}", e));
            }
        }
        true
    }

    /// Like [`Backend::sync`] but gives up after `timeout`.
    ///
    /// Returns `true` if the wrapper is fully drained (or never started)
    /// when the call returns.
    pub fn sync_timeout(&self, timeout: Duration) -> bool {
        if self.drain(Some(Instant::now() + timeout)) {
            self.backend.sync();
        }
        matches!(self.state(), QueueState::Closed | QueueState::Unstarted)
    }
}

impl Backend for AsyncBackend {
    fn configure(&self, config: &Config) -> Result<()> {
        self.backend.configure(config)
    }

    fn send(&self, entry: EventEntry) {
        let sender = {
            let mut inner = self.shared.inner.lock();
            if inner.state == QueueState::Unstarted {
                self.start(&mut inner);
            }
            match (inner.state, inner.sender.clone()) {
                (QueueState::Running, Some(sender)) => sender,
                _ => {
                    drop(inner);
                    self.shared.metrics.record_dropped();
                    return;
                }
            }
        };

        match sender.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                self.shared.metrics.record_block();
                if sender.send(entry).is_err() {
                    self.shared.metrics.record_dropped();
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                self.shared.metrics.record_dropped();
            }
        }
    }

    fn sync(&self) {
        if self.drain(None) {
            self.backend.sync();
        }
    }
}

impl Drop for AsyncBackend {
    fn drop(&mut self) {
        if self.state() == QueueState::Running && !self.sync_timeout(DEFAULT_SHUTDOWN_TIMEOUT) {
            diagnostic::warn(format!(
                "Log dispatch thread did not drain within {:?}. Some entries may be lost.",
                DEFAULT_SHUTDOWN_TIMEOUT
            ));
        }
    }
}

/// Filter named `async`; config key `size` sets the queue capacity.
pub struct AsyncFilter {
    capacity: Arc<AtomicUsize>,
}

impl AsyncFilter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Arc::new(AtomicUsize::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }
}

impl Default for AsyncFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for AsyncFilter {
    fn name(&self) -> &str {
        "async"
    }

    fn configure(&self, config: &Config) -> Result<()> {
        let size = config.scan::<usize>(&["size"])?.unwrap_or(DEFAULT_QUEUE_SIZE);
        self.capacity.store(size, Ordering::Relaxed);
        Ok(())
    }

    fn make_chain(&self, inner: Arc<dyn Backend>) -> Arc<dyn Backend> {
        Arc::new(AsyncBackend::with_shared_capacity(
            inner,
            Arc::clone(&self.capacity),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entry, RecordingBackend};
    use serde_json::json;
    use std::sync::Barrier;

    /// Blocks every delivery until the gate sender is dropped
    struct GatedBackend {
        entered: crossbeam_channel::Sender<()>,
        gate: crossbeam_channel::Receiver<()>,
        events: Mutex<Vec<String>>,
    }

    impl GatedBackend {
        fn new() -> (Arc<Self>, crossbeam_channel::Receiver<()>, crossbeam_channel::Sender<()>) {
            let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
            let (gate_tx, gate_rx) = crossbeam_channel::bounded(0);
            let backend = Arc::new(Self {
                entered: entered_tx,
                gate: gate_rx,
                events: Mutex::new(Vec::new()),
            });
            (backend, entered_rx, gate_tx)
        }
    }

    impl Backend for GatedBackend {
        fn configure(&self, _config: &Config) -> Result<()> {
            Ok(())
        }

        fn send(&self, entry: EventEntry) {
            let _ = self.entered.send(());
            let _ = self.gate.recv();
            self.events.lock().push(entry.message);
        }

        fn sync(&self) {}
    }

    struct PanickingBackend {
        delivered: AtomicUsize,
    }

    impl Backend for PanickingBackend {
        fn configure(&self, _config: &Config) -> Result<()> {
            Ok(())
        }

        fn send(&self, entry: EventEntry) {
            if entry.message == "boom" {
                panic!("backend exploded");
            }
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }

        fn sync(&self) {}
    }

    #[test]
    fn test_starts_lazily() {
        let sink = RecordingBackend::new();
        let wrapper = AsyncBackend::new(sink.clone(), 10);
        assert_eq!(wrapper.state(), QueueState::Unstarted);
        assert_eq!(wrapper.queue_capacity(), None);

        wrapper.send(entry("first"));
        assert_eq!(wrapper.state(), QueueState::Running);
        assert_eq!(wrapper.queue_capacity(), Some(10));

        wrapper.sync();
        assert_eq!(wrapper.state(), QueueState::Closed);
        assert_eq!(sink.messages(), vec!["first"]);
    }

    #[test]
    fn test_fifo_delivery_before_sync_returns() {
        let sink = RecordingBackend::slow(Duration::from_micros(50));
        let wrapper = AsyncBackend::new(sink.clone(), 16);

        for i in 1..=500 {
            wrapper.send(entry(format!("e{}", i)));
        }
        wrapper.sync();

        let expected: Vec<String> = (1..=500).map(|i| format!("e{}", i)).collect();
        assert_eq!(sink.messages(), expected);
        assert_eq!(wrapper.metrics().delivered_count(), 500);
        assert_eq!(sink.sync_count(), 1);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let sink = RecordingBackend::new();
        let wrapper = AsyncBackend::new(sink.clone(), 4);
        wrapper.send(entry("only"));

        wrapper.sync();
        let started = Instant::now();
        wrapper.sync();
        assert!(started.elapsed() < Duration::from_secs(1));

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.sync_count(), 1);
    }

    #[test]
    fn test_sync_before_first_send_is_noop() {
        let sink = RecordingBackend::new();
        let wrapper = AsyncBackend::new(sink.clone(), 4);

        wrapper.sync();
        assert_eq!(wrapper.state(), QueueState::Unstarted);

        wrapper.send(entry("still accepted"));
        wrapper.sync();
        assert_eq!(sink.messages(), vec!["still accepted"]);
    }

    #[test]
    fn test_send_after_sync_is_dropped() {
        let sink = RecordingBackend::new();
        let wrapper = AsyncBackend::new(sink.clone(), 4);
        wrapper.send(entry("before"));
        wrapper.sync();

        let started = Instant::now();
        for _ in 0..100 {
            wrapper.send(entry("after"));
        }
        assert!(started.elapsed() < Duration::from_secs(1));

        assert_eq!(sink.messages(), vec!["before"]);
        assert_eq!(wrapper.metrics().dropped_count(), 100);
    }

    #[test]
    fn test_full_queue_applies_backpressure() {
        let (sink, entered, gate) = GatedBackend::new();
        let wrapper = Arc::new(AsyncBackend::new(sink.clone(), 1));

        // e1 is picked up by the dispatch thread and parks on the gate,
        // e2 fills the queue, e3 has to wait.
        wrapper.send(entry("e1"));
        entered.recv().unwrap();
        wrapper.send(entry("e2"));

        let producer = {
            let wrapper = Arc::clone(&wrapper);
            std::thread::spawn(move || wrapper.send(entry("e3")))
        };
        std::thread::sleep(Duration::from_millis(100));
        assert!(!producer.is_finished(), "send should block while the queue is full");

        drop(gate);
        producer.join().unwrap();
        wrapper.sync();

        assert_eq!(*sink.events.lock(), vec!["e1", "e2", "e3"]);
        assert_eq!(wrapper.metrics().block_events(), 1);
        assert_eq!(wrapper.metrics().dropped_count(), 0);
    }

    #[test]
    fn test_concurrent_first_sends_start_one_queue() {
        let sink = RecordingBackend::new();
        let wrapper = Arc::new(AsyncBackend::new(sink.clone(), 8));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let wrapper = Arc::clone(&wrapper);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    for i in 0..50 {
                        wrapper.send(entry(format!("t{}-{}", t, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        wrapper.sync();

        assert_eq!(sink.len(), 400);
        assert_eq!(wrapper.metrics().delivered_count(), 400);

        // Per-producer order is preserved.
        let messages = sink.messages();
        for t in 0..8 {
            let prefix = format!("t{}-", t);
            let seen: Vec<usize> = messages
                .iter()
                .filter_map(|m| m.strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(seen, (0..50).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_concurrent_sync_callers_all_wait() {
        let sink = RecordingBackend::slow(Duration::from_millis(1));
        let wrapper = Arc::new(AsyncBackend::new(sink.clone(), 100));
        for i in 0..100 {
            wrapper.send(entry(format!("{}", i)));
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let wrapper = Arc::clone(&wrapper);
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    wrapper.sync();
                    sink.len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 100);
        }
    }

    #[test]
    fn test_backend_panic_does_not_stall_drain() {
        let sink = Arc::new(PanickingBackend {
            delivered: AtomicUsize::new(0),
        });
        let wrapper = AsyncBackend::new(sink.clone(), 8);

        wrapper.send(entry("ok"));
        wrapper.send(entry("boom"));
        wrapper.send(entry("ok"));
        wrapper.sync();

        assert_eq!(sink.delivered.load(Ordering::SeqCst), 2);
        assert_eq!(wrapper.metrics().panic_count(), 1);
        assert_eq!(wrapper.state(), QueueState::Closed);
    }

    #[test]
    fn test_sync_timeout_gives_up_then_completes() {
        let (sink, entered, gate) = GatedBackend::new();
        let wrapper = AsyncBackend::new(sink.clone(), 4);
        wrapper.send(entry("stuck"));
        entered.recv().unwrap();

        assert!(!wrapper.sync_timeout(Duration::from_millis(50)));
        assert_eq!(wrapper.state(), QueueState::Draining);

        drop(gate);
        assert!(wrapper.sync_timeout(Duration::from_secs(5)));
        assert_eq!(*sink.events.lock(), vec!["stuck"]);
    }

    #[test]
    fn test_drop_drains_running_queue() {
        let sink = RecordingBackend::new();
        {
            let wrapper = AsyncBackend::new(sink.clone(), 4);
            for i in 0..10 {
                wrapper.send(entry(format!("{}", i)));
            }
        }
        assert_eq!(sink.len(), 10);
    }

    #[test]
    fn test_configure_forwards_to_inner() {
        let sink = RecordingBackend::new();
        let wrapper = AsyncBackend::new(sink.clone(), 4);
        wrapper
            .configure(&Config::new(json!({ "path": "/tmp" })))
            .unwrap();
        assert_eq!(sink.configs.lock()[0].get_str("path", ""), "/tmp");
    }

    #[test]
    fn test_filter_size_applies_to_existing_chains() {
        let filter = AsyncFilter::new();
        assert_eq!(filter.name(), "async");
        assert_eq!(filter.capacity(), DEFAULT_QUEUE_SIZE);

        let sink = RecordingBackend::new();
        let chain = filter.make_chain(sink.clone());

        filter.configure(&Config::new(json!({ "size": 3 }))).unwrap();
        assert_eq!(filter.capacity(), 3);

        chain.send(entry("x"));
        chain.sync();
        assert_eq!(sink.messages(), vec!["x"]);
    }

    #[test]
    fn test_filter_rejects_bad_size() {
        let filter = AsyncFilter::new();
        assert!(filter.configure(&Config::new(json!({ "size": "big" }))).is_err());
        filter.configure(&Config::empty()).unwrap();
        assert_eq!(filter.capacity(), DEFAULT_QUEUE_SIZE);
    }
}
