//! Pause/resume gate for the EventBus
//!
//! While paused, `publish` still runs middleware, recording, and caching
//! immediately, because the event occurred at publish time regardless of
//! delivery timing. Only the live fan-out is deferred to the pending queue.

use super::core::{BusMode, EventBus};

impl EventBus {
    /// Suspend live fan-out; idempotent
    pub fn pause(&self) {
        let mut state = self.state.lock();
        if state.mode == BusMode::Paused {
            return;
        }
        state.mode = BusMode::Paused;
        log::debug!("event bus paused");
    }

    /// Whether live fan-out is currently suspended (or draining)
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.lock().mode != BusMode::Active
    }

    /// Drain the pending queue strictly in arrival order, then go active
    ///
    /// Events deferred while paused were already middleware-processed and
    /// cached at publish time, so the drain performs fan-out only. Publishes
    /// arriving mid-drain append behind the queued set instead of
    /// interleaving; a `pause` call mid-drain stops the flush with the
    /// remainder still queued.
    pub fn resume(&self) {
        {
            let mut state = self.state.lock();
            match state.mode {
                BusMode::Active | BusMode::Draining => return,
                BusMode::Paused => state.mode = BusMode::Draining,
            }
        }
        log::debug!("event bus resuming, draining pending queue");

        let pipeline = self.middleware.read().clone();
        loop {
            // Take one event (and its target snapshot) per critical section;
            // delivery runs outside the lock.
            let next = {
                let mut state = self.state.lock();
                if state.mode != BusMode::Draining {
                    return;
                }
                match state.pending.pop_front() {
                    Some(pending) => {
                        // Subscriptions registered after the event was
                        // enqueued already received it from their cache
                        // catch-up; delivering again would double up.
                        let mut targets = state.sorted_targets(&pending.event.tag());
                        targets.retain(|sub| sub.seq() < pending.sub_cutoff);
                        Some((pending.event, targets))
                    }
                    None => {
                        state.mode = BusMode::Active;
                        None
                    }
                }
            };
            let Some((event, targets)) = next else {
                break;
            };
            self.fan_out(&pipeline, &event, &targets);
        }
        log::debug!("event bus active");
    }
}
