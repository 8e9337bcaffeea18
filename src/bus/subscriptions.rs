//! Subscription operations for the EventBus

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::errors::EventBusError;
use crate::subscription::{SubscribeOptions, Subscription, SubscriptionId};
use crate::types::{AppEvent, EventTag};

use super::core::{BusState, EventBus};

impl EventBus {
    /// Subscribe to a tag with default delivery options
    ///
    /// # Returns
    /// The new subscription's id
    pub fn subscribe(
        &self,
        tag: EventTag,
        handler: impl Fn(AppEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribe_advanced(tag, handler, SubscribeOptions::default())
    }

    /// Subscribe with full delivery control
    ///
    /// Any still-cached events of the tag are replayed to the new handler
    /// synchronously before this returns, oldest first, through the same
    /// delivery path as live events; filters, transforms, and invocation
    /// limits apply identically to the catch-up.
    pub fn subscribe_advanced(
        &self,
        tag: EventTag,
        handler: impl Fn(AppEvent) + Send + Sync + 'static,
        options: SubscribeOptions,
    ) -> SubscriptionId {
        // Sequence allocation, registration, and the cache snapshot share one
        // critical section so a concurrent publish is either in the snapshot
        // or in the live fan-out, never both, and so the resume drain can
        // tell from the sequence alone whether a deferred event predates this
        // subscription's catch-up.
        let (subscription, cached) = {
            let mut state = self.state.lock();
            let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            let subscription = Arc::new(Subscription::new(
                tag.clone(),
                seq,
                Box::new(handler),
                options,
            ));
            state.index.insert(subscription.id().clone(), tag.clone());
            let controller = state.controller_mut(&tag, self.config.cache_capacity);
            controller.subscriptions.push(subscription.clone());
            controller.subscriptions.sort_by(|a, b| {
                b.priority()
                    .cmp(&a.priority())
                    .then(a.seq().cmp(&b.seq()))
            });
            (subscription, controller.cache.snapshot())
        };
        let id = subscription.id().clone();

        // Catch-up delivery happens outside the lock
        let pipeline = self.middleware.read().clone();
        for event in &cached {
            self.deliver_one(&pipeline, &subscription, event);
        }

        log::debug!("subscription {id} registered on tag '{tag}'");
        id
    }

    /// Subscribe to every currently-known tag matching a regex pattern
    ///
    /// Resolves the pattern once, at call time, against the static tag set
    /// plus any custom tags the bus has already seen; tags introduced later
    /// are not covered. Returns a group id whose `unsubscribe` cancels every
    /// member. An invalid pattern logs a warning and yields an inert id.
    pub fn subscribe_pattern(
        &self,
        pattern: &str,
        handler: impl Fn(AppEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let group_id = SubscriptionId::generate();
        let regex = match regex::Regex::new(pattern) {
            Ok(regex) => regex,
            Err(source) => {
                log::warn!(
                    "{}",
                    EventBusError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    }
                );
                self.state.lock().groups.insert(group_id.clone(), Vec::new());
                return group_id;
            }
        };

        let mut tags = EventTag::known();
        {
            let state = self.state.lock();
            for tag in state.controllers.keys() {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }

        let handler = Arc::new(handler);
        let mut members = Vec::new();
        for tag in tags {
            if regex.is_match(&tag.to_string()) {
                let handler = handler.clone();
                members.push(self.subscribe(tag, move |event| (*handler)(event)));
            }
        }
        if members.is_empty() {
            log::debug!("pattern '{pattern}' matched no known tags");
        }
        self.state.lock().groups.insert(group_id.clone(), members);
        group_id
    }

    /// Cancel a subscription (or a pattern group)
    ///
    /// Immediate and total: once this returns, no delivery for the id can
    /// begin; an invocation already executing is allowed to finish. Unknown
    /// ids log a warning and are a no-op.
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        let mut state = self.state.lock();
        if let Some(members) = state.groups.remove(id) {
            for member in &members {
                Self::remove_subscription(&mut state, member);
            }
            log::debug!("pattern group {id} cancelled ({} members)", members.len());
            return true;
        }
        let removed = Self::remove_subscription(&mut state, id);
        if removed {
            log::debug!("subscription {id} cancelled");
        } else {
            log::warn!("unsubscribe: unknown subscription id {id}");
        }
        removed
    }

    fn remove_subscription(state: &mut BusState, id: &SubscriptionId) -> bool {
        let Some(tag) = state.index.remove(id) else {
            return false;
        };
        if let Some(controller) = state.controllers.get_mut(&tag) {
            if let Some(position) = controller
                .subscriptions
                .iter()
                .position(|sub| sub.id() == id)
            {
                let subscription = controller.subscriptions.remove(position);
                subscription.deactivate();
                return true;
            }
        }
        false
    }
}
