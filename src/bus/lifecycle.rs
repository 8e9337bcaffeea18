//! Recording, replay, and teardown operations for the EventBus

use crate::recorder::{RecordedEvent, ReplayFilter};

use super::core::{BusMode, EventBus};

impl EventBus {
    /// Start capturing published events into the bounded history
    pub fn start_recording(&self) {
        self.recorder.lock().start();
        log::debug!("event recording started");
    }

    /// Stop capturing; existing history is retained
    pub fn stop_recording(&self) {
        self.recorder.lock().stop();
        log::debug!("event recording stopped");
    }

    /// Whether recording is currently enabled
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recorder.lock().is_enabled()
    }

    /// Return the recorded slice matching the filter without republishing
    #[must_use]
    pub fn event_history(&self, filter: &ReplayFilter) -> Vec<RecordedEvent> {
        self.recorder.lock().slice(filter)
    }

    /// Re-publish a filtered slice of recorded history to a target bus
    ///
    /// Events are replayed in original capture order with a small inter-event
    /// delay (`config.replay_delay`) so consumers sensitive to arrival order
    /// see approximately the original pacing. The target may be this bus or a
    /// separate instance (e.g. a test fixture).
    ///
    /// # Returns
    /// The number of events replayed
    pub async fn replay_events(&self, target: &EventBus, filter: &ReplayFilter) -> usize {
        let slice = self.recorder.lock().slice(filter);
        let total = slice.len();
        log::debug!("replaying {total} recorded events");
        for (index, record) in slice.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.replay_delay).await;
            }
            let _ = target.publish(record.event).await;
        }
        total
    }

    /// Cancel every subscription and clear all state; test/teardown use only
    ///
    /// Drops tag controllers (and their caches), the pending queue, pattern
    /// groups, counters, and recorded history. The middleware chain is kept:
    /// it is configuration, not state.
    pub fn reset(&self) {
        {
            let mut state = self.state.lock();
            for controller in state.controllers.values() {
                for subscription in &controller.subscriptions {
                    subscription.deactivate();
                }
            }
            state.controllers.clear();
            state.pending.clear();
            state.groups.clear();
            state.index.clear();
            state.mode = BusMode::Active;
        }
        self.recorder.lock().clear();
        self.metrics.reset();
        log::debug!("event bus reset");
    }
}
