//! Statistics and introspection for the EventBus

use std::collections::HashMap;

use crate::stats::{BusStatistics, SubscriptionInfo};
use crate::types::EventTag;

use super::core::{BusMode, EventBus};

impl EventBus {
    /// Point-in-time statistics snapshot; never mutates state
    #[must_use]
    pub fn statistics(&self) -> BusStatistics {
        let snapshot = self.metrics.snapshot();
        let state = self.state.lock();

        let mut published_per_tag = HashMap::new();
        let mut subscribers_per_tag = HashMap::new();
        let mut cache_depth_per_tag = HashMap::new();
        let mut active_subscriptions = 0;
        for (tag, controller) in &state.controllers {
            let key = tag.to_string();
            published_per_tag.insert(key.clone(), controller.published);
            subscribers_per_tag.insert(key.clone(), controller.subscriptions.len());
            cache_depth_per_tag.insert(key, controller.cache.len());
            active_subscriptions += controller
                .subscriptions
                .iter()
                .filter(|sub| sub.is_active())
                .count();
        }

        let recorder = self.recorder.lock();
        BusStatistics {
            events_published: snapshot.events_published,
            events_delivered: snapshot.events_delivered,
            events_vetoed: snapshot.events_vetoed,
            handler_failures: snapshot.handler_failures,
            active_subscriptions,
            tag_controllers: state.controllers.len(),
            pending_events: state.pending.len(),
            paused: state.mode != BusMode::Active,
            middleware_count: self.middleware.read().len(),
            published_per_tag,
            subscribers_per_tag,
            cache_depth_per_tag,
            recording_enabled: recorder.is_enabled(),
            recorded_events: recorder.len(),
        }
    }

    /// Listing of every registered subscription
    #[must_use]
    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        let state = self.state.lock();
        let mut listing: Vec<SubscriptionInfo> = state
            .controllers
            .values()
            .flat_map(|controller| controller.subscriptions.iter())
            .map(|sub| SubscriptionInfo {
                id: sub.id().clone(),
                tag: sub.tag().clone(),
                priority: sub.priority(),
                invocation_count: sub.invocation_count(),
                active: sub.is_active(),
                description: sub.description().map(str::to_string),
                metadata: sub.metadata().clone(),
            })
            .collect();
        listing.sort_by(|a, b| a.tag.to_string().cmp(&b.tag.to_string()));
        listing
    }

    /// Number of registered subscriptions for a tag
    #[must_use]
    pub fn subscriber_count(&self, tag: &EventTag) -> usize {
        self.state
            .lock()
            .controllers
            .get(tag)
            .map_or(0, |controller| controller.subscriptions.len())
    }

    /// Whether any subscription is registered for a tag
    #[must_use]
    pub fn has_subscribers(&self, tag: &EventTag) -> bool {
        self.subscriber_count(tag) > 0
    }

    /// Human-readable counter report
    #[must_use]
    pub fn metrics_report(&self) -> String {
        if !self.config.enable_metrics {
            return "Metrics disabled".to_string();
        }
        self.metrics.snapshot().report()
    }
}
