//! Configuration types for the event bus
//!
//! This module contains the configuration structure controlling cache and
//! history bounds, middleware timeouts, and replay pacing.

use std::time::Duration;

/// Configuration for the event bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Maximum number of cached events retained per tag for late subscribers
    pub cache_capacity: usize,

    /// Maximum number of recorded events retained while recording is enabled
    pub history_capacity: usize,

    /// Maximum number of events deferred while the bus is paused
    /// Oldest deferred events are dropped (with a warning) on overflow
    pub max_pending: usize,

    /// Upper bound on a single middleware `on_publish` invocation
    /// A hook exceeding this continues the chain with the unmodified event
    pub middleware_timeout: Duration,

    /// Inter-event delay used by `replay_events` to preserve approximate
    /// temporal ordering for order-sensitive consumers
    pub replay_delay: Duration,

    /// Whether to collect published/delivered counters
    pub enable_metrics: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 50,
            history_capacity: 500,
            max_pending: 1024,
            middleware_timeout: Duration::from_secs(1),
            replay_delay: Duration::from_millis(10),
            enable_metrics: true,
        }
    }
}
