use std::sync::atomic::{AtomicU64, Ordering};

/// Global counters for event bus operations using lock-free atomics.
///
/// All counters use `Ordering::SeqCst` so snapshot reads are coherent
/// across fields. Per-tag counters live with the tag controllers and are
/// read under the state lock instead.
#[derive(Debug, Default)]
pub struct BusMetrics {
    pub events_published: AtomicU64,
    pub events_delivered: AtomicU64,
    pub events_vetoed: AtomicU64,
    pub events_deferred: AtomicU64,
    pub handler_failures: AtomicU64,
}

impl BusMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_published(&self) {
        self.events_published.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_delivered(&self) {
        self.events_delivered.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_vetoed(&self) {
        self.events_vetoed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_deferred(&self) {
        self.events_deferred.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_handler_failures(&self) {
        self.handler_failures.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_published: self.events_published.load(Ordering::SeqCst),
            events_delivered: self.events_delivered.load(Ordering::SeqCst),
            events_vetoed: self.events_vetoed.load(Ordering::SeqCst),
            events_deferred: self.events_deferred.load(Ordering::SeqCst),
            handler_failures: self.handler_failures.load(Ordering::SeqCst),
        }
    }

    pub fn reset(&self) {
        self.events_published.store(0, Ordering::SeqCst);
        self.events_delivered.store(0, Ordering::SeqCst);
        self.events_vetoed.store(0, Ordering::SeqCst);
        self.events_deferred.store(0, Ordering::SeqCst);
        self.handler_failures.store(0, Ordering::SeqCst);
    }
}

/// Consistent point-in-time view of the global counters
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub events_published: u64,
    pub events_delivered: u64,
    pub events_vetoed: u64,
    pub events_deferred: u64,
    pub handler_failures: u64,
}

impl MetricsSnapshot {
    /// Fraction of delivery attempts that invoked a handler successfully
    #[must_use]
    pub fn delivery_success_rate(&self) -> f64 {
        let attempts = self.events_delivered + self.handler_failures;
        if attempts == 0 {
            return 1.0;
        }
        self.events_delivered as f64 / attempts as f64
    }

    /// Human-readable multi-line report
    #[must_use]
    pub fn report(&self) -> String {
        format!(
            "Event Bus Metrics:\n\
             - Events Published: {}\n\
             - Events Delivered: {}\n\
             - Events Vetoed: {}\n\
             - Events Deferred: {}\n\
             - Handler Failures: {}\n\
             - Delivery Success Rate: {:.2}%",
            self.events_published,
            self.events_delivered,
            self.events_vetoed,
            self.events_deferred,
            self.handler_failures,
            self.delivery_success_rate() * 100.0
        )
    }
}
