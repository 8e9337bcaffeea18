//! Subscription records and delivery gating
//!
//! A subscription wraps a handler closure with optional filter, transform,
//! priority, timeout-based throttling, and a maximum-invocation cap. Cached
//! catch-up and live delivery both go through the same [`Subscription::claim`]
//! / [`Subscription::invoke`] path so the limits apply identically.

use crate::errors::{EventBusError, panic_message};
use crate::types::{AppEvent, EventTag};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Handler invoked with the (possibly transformed) event
pub type EventHandler = Box<dyn Fn(AppEvent) + Send + Sync>;

/// Predicate deciding whether a subscription wants an event
pub type EventFilter = Box<dyn Fn(&AppEvent) -> bool + Send + Sync>;

/// Payload transform applied just before the handler fires
pub type EventTransform = Box<dyn Fn(AppEvent) -> AppEvent + Send + Sync>;

/// Process-unique subscription identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivery-control options for `subscribe_advanced`
///
/// Built with struct-update or the chained setters; every field is optional.
///
/// ```no_run
/// use appbus::{AppEvent, SubscribeOptions};
/// use std::time::Duration;
///
/// let opts = SubscribeOptions::new()
///     .priority(10)
///     .filter(|event: &AppEvent| matches!(event, AppEvent::SecurityAlert { .. }))
///     .timeout_guard(Duration::from_millis(100))
///     .max_invocations(5);
/// ```
#[derive(Default)]
pub struct SubscribeOptions {
    pub priority: i32,
    pub filter: Option<EventFilter>,
    pub transform: Option<EventTransform>,
    pub timeout_guard: Option<Duration>,
    pub max_invocations: Option<u32>,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
}

impl SubscribeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivery priority; higher fires first, default 0
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Only deliver events for which the predicate returns true
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&AppEvent) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Transform the event just before the handler fires
    #[must_use]
    pub fn transform(
        mut self,
        transform: impl Fn(AppEvent) -> AppEvent + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Suppress re-invocation faster than this interval (throttle, not an error)
    #[must_use]
    pub fn timeout_guard(mut self, guard: Duration) -> Self {
        self.timeout_guard = Some(guard);
        self
    }

    /// Stop delivering after this many invocations; the subscription stays
    /// registered but dormant
    #[must_use]
    pub fn max_invocations(mut self, max: u32) -> Self {
        self.max_invocations = Some(max);
        self
    }

    /// Human-readable description surfaced in introspection listings
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Arbitrary metadata attached to the subscription record
    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Default)]
struct DeliveryState {
    invocation_count: u32,
    last_invocation_at: Option<Instant>,
}

/// One registered subscription
///
/// Mutable delivery state (invocation counter, throttle clock) sits behind
/// its own lock so claims stay race-free without holding the bus state lock
/// across handler execution.
pub(crate) struct Subscription {
    id: SubscriptionId,
    tag: EventTag,
    priority: i32,
    seq: u64,
    handler: EventHandler,
    filter: Option<EventFilter>,
    transform: Option<EventTransform>,
    timeout_guard: Option<Duration>,
    max_invocations: Option<u32>,
    description: Option<String>,
    metadata: serde_json::Value,
    active: AtomicBool,
    state: Mutex<DeliveryState>,
}

impl Subscription {
    pub(crate) fn new(
        tag: EventTag,
        seq: u64,
        handler: EventHandler,
        options: SubscribeOptions,
    ) -> Self {
        Self {
            id: SubscriptionId::generate(),
            tag,
            priority: options.priority,
            seq,
            handler,
            filter: options.filter,
            transform: options.transform,
            timeout_guard: options.timeout_guard,
            max_invocations: options.max_invocations,
            description: options.description,
            metadata: options.metadata,
            active: AtomicBool::new(true),
            state: Mutex::new(DeliveryState::default()),
        }
    }

    pub(crate) fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub(crate) fn tag(&self) -> &EventTag {
        &self.tag
    }

    pub(crate) fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Cancel the subscription; no delivery can begin after this returns
    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Atomically decide whether this delivery may proceed and, if so,
    /// consume an invocation slot.
    ///
    /// Gate order is fixed: active, max-invocations, timeout guard, filter.
    /// The first failing gate wins and nothing is consumed.
    pub(crate) fn claim(&self, event: &AppEvent) -> bool {
        if !self.is_active() {
            return false;
        }
        let mut state = self.state.lock();
        if let Some(max) = self.max_invocations {
            if state.invocation_count >= max {
                return false;
            }
        }
        if let Some(guard) = self.timeout_guard {
            if let Some(last) = state.last_invocation_at {
                if last.elapsed() < guard {
                    return false;
                }
            }
        }
        if let Some(filter) = &self.filter {
            if !filter(event) {
                return false;
            }
        }
        state.invocation_count += 1;
        state.last_invocation_at = Some(Instant::now());
        true
    }

    /// Apply the transform (if any) and invoke the handler.
    ///
    /// Panics are caught and reported; they never reach the publisher or
    /// sibling subscribers.
    pub(crate) fn invoke(&self, event: AppEvent) -> Result<(), EventBusError> {
        let event = match &self.transform {
            Some(transform) => transform(event),
            None => event,
        };
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (self.handler)(event))).map_err(
            |payload| EventBusError::HandlerPanicked {
                subscription_id: self.id.clone(),
                message: panic_message(payload),
            },
        )
    }

    pub(crate) fn invocation_count(&self) -> u32 {
        self.state.lock().invocation_count
    }

    pub(crate) fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("priority", &self.priority)
            .field("seq", &self.seq)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> EventHandler {
        Box::new(|_| {})
    }

    #[test]
    fn max_invocations_makes_subscription_dormant() {
        let sub = Subscription::new(
            EventTag::HealthChanged,
            0,
            noop(),
            SubscribeOptions::new().max_invocations(2),
        );
        let event = AppEvent::health_changed("db".into(), true, None);
        assert!(sub.claim(&event));
        assert!(sub.claim(&event));
        assert!(!sub.claim(&event));
        assert!(sub.is_active(), "dormant, not auto-removed");
        assert_eq!(sub.invocation_count(), 2);
    }

    #[test]
    fn timeout_guard_throttles_rapid_claims() {
        let sub = Subscription::new(
            EventTag::ResourceWarning,
            0,
            noop(),
            SubscribeOptions::new().timeout_guard(Duration::from_secs(60)),
        );
        let event = AppEvent::resource_warning("memory".into(), 91.0);
        assert!(sub.claim(&event));
        assert!(!sub.claim(&event), "second claim inside the guard window");
        assert_eq!(sub.invocation_count(), 1);
    }

    #[test]
    fn filter_rejection_consumes_nothing() {
        let sub = Subscription::new(
            EventTag::SecurityAlert,
            0,
            noop(),
            SubscribeOptions::new().filter(|_| false),
        );
        let event = AppEvent::security_alert(
            crate::types::AlertSeverity::Info,
            "audit".into(),
            "hello".into(),
        );
        assert!(!sub.claim(&event));
        assert_eq!(sub.invocation_count(), 0);
    }

    #[test]
    fn deactivated_subscription_claims_nothing() {
        let sub = Subscription::new(EventTag::TokenExpired, 0, noop(), SubscribeOptions::new());
        sub.deactivate();
        assert!(!sub.claim(&AppEvent::token_expired("github".into())));
    }
}
