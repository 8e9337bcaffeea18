//! Core EventBus struct definition and constructors

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use parking_lot::{Mutex, RwLock};

use crate::cache::BoundedEventCache;
use crate::config::EventBusConfig;
use crate::metrics::BusMetrics;
use crate::middleware::{Middleware, MiddlewarePipeline};
use crate::recorder::EventRecorder;
use crate::subscription::{Subscription, SubscriptionId};
use crate::types::{AppEvent, EventTag};

/// Dispatch gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BusMode {
    /// Publishes fan out immediately
    Active,
    /// Live fan-out is deferred to the pending queue
    Paused,
    /// `resume` is flushing the pending queue; new publishes still defer so
    /// they land behind the already-queued set
    Draining,
}

/// An event held back while the bus is paused
///
/// `sub_cutoff` is the registration-sequence watermark at enqueue time.
/// Subscriptions registered at or after it received the event from their
/// cache catch-up, so the resume drain must skip them.
pub(crate) struct PendingEvent {
    pub(crate) event: AppEvent,
    pub(crate) sub_cutoff: u64,
}

/// Per-tag subscriber set and event cache
pub(crate) struct TagController {
    /// Kept sorted by priority descending, registration order on ties
    pub(crate) subscriptions: Vec<Arc<Subscription>>,
    pub(crate) cache: BoundedEventCache,
    pub(crate) published: u64,
}

impl TagController {
    fn new(cache_capacity: usize) -> Self {
        Self {
            subscriptions: Vec::new(),
            cache: BoundedEventCache::new(cache_capacity),
            published: 0,
        }
    }
}

/// All shared mutable bus state, guarded by one coarse lock.
///
/// The lock is held only for state transitions, never across a handler or
/// middleware invocation.
pub(crate) struct BusState {
    pub(crate) controllers: HashMap<EventTag, TagController>,
    pub(crate) pending: VecDeque<PendingEvent>,
    pub(crate) mode: BusMode,
    /// Pattern-subscription group id -> member subscription ids
    pub(crate) groups: HashMap<SubscriptionId, Vec<SubscriptionId>>,
    /// Subscription id -> owning tag, for unsubscribe lookups
    pub(crate) index: HashMap<SubscriptionId, EventTag>,
}

impl BusState {
    fn new() -> Self {
        Self {
            controllers: HashMap::new(),
            pending: VecDeque::new(),
            mode: BusMode::Active,
            groups: HashMap::new(),
            index: HashMap::new(),
        }
    }

    pub(crate) fn controller_mut(
        &mut self,
        tag: &EventTag,
        cache_capacity: usize,
    ) -> &mut TagController {
        self.controllers
            .entry(tag.clone())
            .or_insert_with(|| TagController::new(cache_capacity))
    }

    /// Active subscriptions for a tag in delivery order
    pub(crate) fn sorted_targets(&self, tag: &EventTag) -> Vec<Arc<Subscription>> {
        self.controllers
            .get(tag)
            .map(|controller| {
                controller
                    .subscriptions
                    .iter()
                    .filter(|sub| sub.is_active())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Typed in-process publish/subscribe event bus
///
/// One instance per process (or per logical scope in tests); collaborators
/// receive a clone, which shares all state with the original.
#[derive(Clone)]
pub struct EventBus {
    pub(crate) state: Arc<Mutex<BusState>>,
    pub(crate) middleware: Arc<RwLock<MiddlewarePipeline>>,
    pub(crate) recorder: Arc<Mutex<EventRecorder>>,
    pub(crate) metrics: Arc<BusMetrics>,
    pub(crate) config: Arc<EventBusConfig>,
    /// Registration-order counter used as the priority tiebreak
    pub(crate) next_seq: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create a new event bus with custom configuration
    ///
    /// # Arguments
    /// * `config` - Event bus configuration
    #[must_use]
    pub fn with_config(config: EventBusConfig) -> Self {
        let recorder = EventRecorder::new(config.history_capacity);
        Self {
            state: Arc::new(Mutex::new(BusState::new())),
            middleware: Arc::new(RwLock::new(MiddlewarePipeline::default())),
            recorder: Arc::new(Mutex::new(recorder)),
            metrics: Arc::new(BusMetrics::new()),
            config: Arc::new(config),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// Get the global counters
    ///
    /// Individual reads are atomic; for a coherent multi-counter view use
    /// `metrics().snapshot()`.
    #[must_use]
    pub fn metrics(&self) -> &BusMetrics {
        &self.metrics
    }

    /// Register a middleware; re-adding the same name replaces it in place
    pub fn add_middleware(&self, middleware: Arc<dyn Middleware>) {
        self.middleware.write().add(middleware);
    }

    /// Remove a middleware by name; unknown names are a no-op
    pub fn remove_middleware(&self, name: &str) -> bool {
        self.middleware.write().remove(name)
    }
}
