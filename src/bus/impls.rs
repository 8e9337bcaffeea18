//! Standard trait implementations for EventBus

use std::fmt;

use super::core::EventBus;

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("EventBus")
            .field("config", &self.config)
            .field("tag_controllers", &state.controllers.len())
            .field("pending_events", &state.pending.len())
            .field("mode", &state.mode)
            .field("middleware_count", &self.middleware.read().len())
            .finish_non_exhaustive()
    }
}
