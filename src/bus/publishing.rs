//! Publishing operations for the EventBus

use std::sync::Arc;

use crate::middleware::MiddlewarePipeline;
use crate::subscription::Subscription;
use crate::types::AppEvent;

use super::core::{BusMode, EventBus, PendingEvent};

/// Completion report for a single publish
///
/// Not an error type: a veto is a deliberate middleware decision and a
/// deferral just means the bus is paused. The caller's fire-and-forget
/// contract holds in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Fanned out live to this many handlers
    Delivered(usize),
    /// Dropped by a middleware before caching or delivery
    Vetoed,
    /// Cached and recorded, live fan-out deferred until `resume`
    Deferred,
}

impl PublishOutcome {
    #[must_use]
    pub fn was_delivered(&self) -> bool {
        matches!(self, PublishOutcome::Delivered(_))
    }

    #[must_use]
    pub fn delivered_count(&self) -> usize {
        match self {
            PublishOutcome::Delivered(count) => *count,
            _ => 0,
        }
    }

    #[must_use]
    pub fn was_vetoed(&self) -> bool {
        matches!(self, PublishOutcome::Vetoed)
    }

    #[must_use]
    pub fn was_deferred(&self) -> bool {
        matches!(self, PublishOutcome::Deferred)
    }
}

/// Result of publishing a batch of events
///
/// Best-effort: every event in the batch is attempted regardless of
/// individual vetoes, with explicit counts reporting what happened.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchPublishOutcome {
    /// Total number of events in the batch
    pub total: usize,
    /// Events that fanned out live
    pub published: usize,
    /// Events dropped by middleware
    pub vetoed: usize,
    /// Events deferred to the pending queue
    pub deferred: usize,
    /// Sum of handler invocations across the batch
    pub deliveries: usize,
}

impl BatchPublishOutcome {
    /// True when nothing in the batch was vetoed
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.vetoed == 0
    }
}

impl EventBus {
    /// Publish an event to all subscribers of its tag
    ///
    /// Control flow: middleware fold (may veto) → recorder (if enabled) →
    /// bounded cache insert → live fan-out, or deferral to the pending queue
    /// while paused. Returns promptly in all cases; never blocks on
    /// subscriber completion and never returns an error.
    pub async fn publish(&self, event: AppEvent) -> PublishOutcome {
        let pipeline = self.middleware.read().clone();
        let Some(event) = pipeline
            .process(event, self.config.middleware_timeout)
            .await
        else {
            if self.config.enable_metrics {
                self.metrics.increment_vetoed();
            }
            return PublishOutcome::Vetoed;
        };

        let tag = event.tag();
        let targets = {
            let mut state = self.state.lock();
            // Recording shares the cache's critical section so the two
            // histories agree on event order.
            self.recorder.lock().record(&event, serde_json::Map::new());
            let controller = state.controller_mut(&tag, self.config.cache_capacity);
            controller.cache.push(event.clone());
            controller.published += 1;
            if self.config.enable_metrics {
                self.metrics.increment_published();
            }

            if state.mode != BusMode::Active {
                if state.pending.len() >= self.config.max_pending {
                    state.pending.pop_front();
                    log::warn!("pending queue full, dropped oldest deferred event");
                }
                // Subscriptions registered from here on catch this event up
                // from the cache; the drain must not deliver it to them again.
                let sub_cutoff = self.next_seq.load(std::sync::atomic::Ordering::SeqCst);
                state.pending.push_back(PendingEvent { event, sub_cutoff });
                if self.config.enable_metrics {
                    self.metrics.increment_deferred();
                }
                log::trace!("bus paused, deferred event on tag '{tag}'");
                return PublishOutcome::Deferred;
            }

            state.sorted_targets(&tag)
        };

        let delivered = self.fan_out(&pipeline, &event, &targets);
        PublishOutcome::Delivered(delivered)
    }

    /// Publish multiple events sequentially, best-effort
    pub async fn publish_batch(&self, events: Vec<AppEvent>) -> BatchPublishOutcome {
        let mut outcome = BatchPublishOutcome {
            total: events.len(),
            ..Default::default()
        };
        for event in events {
            match self.publish(event).await {
                PublishOutcome::Delivered(count) => {
                    outcome.published += 1;
                    outcome.deliveries += count;
                }
                PublishOutcome::Vetoed => outcome.vetoed += 1,
                PublishOutcome::Deferred => outcome.deferred += 1,
            }
        }
        outcome
    }

    /// Deliver one event to each target in order; returns the invocation count
    pub(crate) fn fan_out(
        &self,
        pipeline: &MiddlewarePipeline,
        event: &AppEvent,
        targets: &[Arc<Subscription>],
    ) -> usize {
        let mut delivered = 0;
        for subscription in targets {
            if self.deliver_one(pipeline, subscription, event) {
                delivered += 1;
            }
        }
        delivered
    }

    /// The single delivery path shared by live fan-out, cached catch-up, and
    /// the resume drain.
    ///
    /// Order: active check → per-recipient `on_deliver` pipeline → claim gate
    /// (max-invocations, timeout guard, filter) → transform → handler.
    pub(crate) fn deliver_one(
        &self,
        pipeline: &MiddlewarePipeline,
        subscription: &Arc<Subscription>,
        event: &AppEvent,
    ) -> bool {
        if !subscription.is_active() {
            return false;
        }
        let Some(event) = pipeline.apply_deliver(event.clone(), subscription.id()) else {
            return false;
        };
        if !subscription.claim(&event) {
            return false;
        }
        match subscription.invoke(event.clone()) {
            Ok(()) => {
                if self.config.enable_metrics {
                    self.metrics.increment_delivered();
                }
                true
            }
            Err(error) => {
                log::error!("{error}");
                if self.config.enable_metrics {
                    self.metrics.increment_handler_failures();
                }
                pipeline.notify_error(&error, &event);
                false
            }
        }
    }
}
