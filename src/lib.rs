//! Typed in-process publish/subscribe event bus
//!
//! Components publish domain events (security alerts, OAuth lifecycle
//! notices, health and resource changes) without knowing who is listening;
//! other components subscribe to typed event tags with rich delivery control:
//! priority ordering, filters, transforms, timeout-based throttling, and
//! maximum-invocation caps.
//!
//! Around the dispatch core sit a veto-capable middleware pipeline, a bounded
//! per-tag cache that catches late subscribers up on recent history, a
//! pause/resume gate with ordered replay of deferred events, and a separate
//! record/replay subsystem for debugging and test fixtures.
//!
//! ```no_run
//! use appbus::{AlertSeverity, AppEvent, EventBus, EventTag};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! bus.subscribe(EventTag::SecurityAlert, |event| {
//!     if let AppEvent::SecurityAlert { message, .. } = event {
//!         println!("alert: {message}");
//!     }
//! });
//! bus.publish(AppEvent::security_alert(
//!     AlertSeverity::Warning,
//!     "audit".into(),
//!     "repeated auth failures".into(),
//! ))
//! .await;
//! # }
//! ```

pub mod bus;
mod cache;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod middleware;
pub mod recorder;
pub mod stats;
pub mod subscription;
pub mod types;

// Re-exports for public API
pub use bus::{BatchPublishOutcome, EventBus, PublishOutcome};
pub use config::EventBusConfig;
pub use errors::EventBusError;
pub use metrics::{BusMetrics, MetricsSnapshot};
pub use middleware::Middleware;
pub use recorder::{RecordedEvent, ReplayFilter};
pub use stats::{BusStatistics, SubscriptionInfo};
pub use subscription::{
    EventFilter, EventHandler, EventTransform, SubscribeOptions, SubscriptionId,
};
pub use types::{AlertSeverity, AppEvent, EventTag};
