//! Veto-capable middleware pipeline
//!
//! Middleware is folded over every publish in priority order (highest first,
//! ties by insertion order). Returning `None` from `on_publish` vetoes the
//! event: it is neither cached, recorded, nor delivered. A veto is a
//! deliberate decision, not an error, and is only logged at debug level.
//!
//! Each `on_publish` hook runs under a bounded timeout so a misbehaving
//! middleware can never hang a publish indefinitely. `on_deliver` is an
//! optional per-recipient micro-pipeline (e.g. redaction); its veto suppresses
//! that one delivery only.

use crate::errors::{EventBusError, panic_message};
use crate::subscription::SubscriptionId;
use crate::types::AppEvent;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// An interceptor registered on the bus
///
/// Stateless with respect to the bus; implementations may hold their own
/// internal state (counters, redaction tables) behind interior mutability.
pub trait Middleware: Send + Sync {
    /// Unique name, used for idempotent registration and removal
    fn name(&self) -> &str;

    /// Ordering weight; higher runs first, default 0
    fn priority(&self) -> i32 {
        0
    }

    /// Inspect or rewrite an event on publish; `None` vetoes it entirely
    fn on_publish(&self, event: AppEvent) -> Option<AppEvent> {
        Some(event)
    }

    /// Per-recipient hook just before a handler fires; `None` suppresses
    /// delivery to that one subscriber
    fn on_deliver(&self, event: AppEvent, _subscriber: &SubscriptionId) -> Option<AppEvent> {
        Some(event)
    }

    /// Best-effort notification that a downstream handler failed
    fn on_error(&self, _error: &EventBusError, _event: &AppEvent) {}
}

struct Entry {
    middleware: Arc<dyn Middleware>,
    seq: u64,
}

/// Ordered chain of middleware, shared cheaply via `Arc` entries
///
/// The pipeline is cloned out of the bus lock before processing so no lock is
/// held while hooks run.
#[derive(Default)]
pub(crate) struct MiddlewarePipeline {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl Clone for MiddlewarePipeline {
    fn clone(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|e| Entry {
                    middleware: e.middleware.clone(),
                    seq: e.seq,
                })
                .collect(),
            next_seq: self.next_seq,
        }
    }
}

impl MiddlewarePipeline {
    /// Register a middleware; re-adding the same name replaces it in place
    pub(crate) fn add(&mut self, middleware: Arc<dyn Middleware>) {
        let name = middleware.name().to_string();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.middleware.name() == name)
        {
            existing.middleware = middleware;
        } else {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.entries.push(Entry { middleware, seq });
        }
        // Priority descending, insertion order on ties
        self.entries
            .sort_by(|a, b| b.middleware.priority().cmp(&a.middleware.priority()).then(a.seq.cmp(&b.seq)));
        log::debug!("middleware '{name}' registered ({} total)", self.entries.len());
    }

    /// Remove by name; unknown names are a no-op
    pub(crate) fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.middleware.name() != name);
        let removed = self.entries.len() < before;
        if removed {
            log::debug!("middleware '{name}' removed");
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Fold the event through every `on_publish` hook in priority order.
    ///
    /// Returns `None` if any middleware vetoed the event. A hook that times
    /// out or panics leaves the event unmodified for the remaining chain.
    pub(crate) async fn process(&self, event: AppEvent, timeout: Duration) -> Option<AppEvent> {
        let mut current = event;
        for entry in &self.entries {
            let middleware = entry.middleware.clone();
            let name = middleware.name().to_string();
            let input = current.clone();
            let hook = tokio::task::spawn_blocking(move || middleware.on_publish(input));

            match tokio::time::timeout(timeout, hook).await {
                Ok(Ok(Some(next))) => current = next,
                Ok(Ok(None)) => {
                    log::debug!("event vetoed by middleware '{name}'");
                    return None;
                }
                Ok(Err(join_error)) => {
                    // A panic inside the hook; continue with the unmodified event
                    log::warn!(
                        "{}",
                        EventBusError::MiddlewarePanicked {
                            name: name.clone(),
                            message: join_error.to_string(),
                        }
                    );
                }
                Err(_elapsed) => {
                    log::warn!(
                        "{}",
                        EventBusError::MiddlewareTimeout {
                            name: name.clone(),
                            timeout
                        }
                    );
                }
            }
        }
        Some(current)
    }

    /// Run the per-recipient `on_deliver` chain.
    ///
    /// Returns `None` if any middleware suppressed delivery to this
    /// subscriber. Panics are isolated and leave the event unmodified.
    pub(crate) fn apply_deliver(
        &self,
        event: AppEvent,
        subscriber: &SubscriptionId,
    ) -> Option<AppEvent> {
        let mut current = event;
        for entry in &self.entries {
            let input = current.clone();
            match std::panic::catch_unwind(AssertUnwindSafe(|| {
                entry.middleware.on_deliver(input, subscriber)
            })) {
                Ok(Some(next)) => current = next,
                Ok(None) => {
                    log::debug!(
                        "delivery to {subscriber} suppressed by middleware '{}'",
                        entry.middleware.name()
                    );
                    return None;
                }
                Err(payload) => {
                    log::warn!(
                        "middleware '{}' on_deliver panicked: {}",
                        entry.middleware.name(),
                        panic_message(payload)
                    );
                }
            }
        }
        Some(current)
    }

    /// Notify every middleware of a handler failure, best-effort
    pub(crate) fn notify_error(&self, error: &EventBusError, event: &AppEvent) {
        for entry in &self.entries {
            if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(|| {
                entry.middleware.on_error(error, event);
            })) {
                log::warn!(
                    "middleware '{}' on_error panicked: {}",
                    entry.middleware.name(),
                    panic_message(payload)
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Named {
        name: &'static str,
        priority: i32,
        calls: Arc<AtomicUsize>,
    }

    impl Middleware for Named {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn on_publish(&self, event: AppEvent) -> Option<AppEvent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(event)
        }
    }

    #[test]
    fn add_is_idempotent_by_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pipeline = MiddlewarePipeline::default();
        pipeline.add(Arc::new(Named {
            name: "audit",
            priority: 0,
            calls: calls.clone(),
        }));
        pipeline.add(Arc::new(Named {
            name: "audit",
            priority: 5,
            calls,
        }));
        assert_eq!(pipeline.len(), 1);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut pipeline = MiddlewarePipeline::default();
        assert!(!pipeline.remove("missing"));
    }

    #[tokio::test]
    async fn priority_order_and_veto_short_circuit() {
        struct Tracker {
            name: &'static str,
            priority: i32,
            order: Arc<parking_lot::Mutex<Vec<&'static str>>>,
            veto: bool,
        }
        impl Middleware for Tracker {
            fn name(&self) -> &str {
                self.name
            }
            fn priority(&self) -> i32 {
                self.priority
            }
            fn on_publish(&self, event: AppEvent) -> Option<AppEvent> {
                self.order.lock().push(self.name);
                if self.veto { None } else { Some(event) }
            }
        }

        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut pipeline = MiddlewarePipeline::default();
        pipeline.add(Arc::new(Tracker {
            name: "low",
            priority: -1,
            order: order.clone(),
            veto: false,
        }));
        pipeline.add(Arc::new(Tracker {
            name: "high",
            priority: 10,
            order: order.clone(),
            veto: true,
        }));

        let result = pipeline
            .process(
                AppEvent::token_expired("github".into()),
                Duration::from_secs(1),
            )
            .await;
        assert!(result.is_none());
        // The veto in the high-priority middleware stops the fold before "low"
        assert_eq!(*order.lock(), vec!["high"]);
    }
}
