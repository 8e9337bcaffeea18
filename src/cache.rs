//! Bounded per-tag event cache for late-subscriber catch-up

use crate::types::AppEvent;
use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent events for one tag.
///
/// Entries are never mutated or removed except by capacity eviction;
/// unsubscribing does not purge the cache.
#[derive(Debug)]
pub(crate) struct BoundedEventCache {
    capacity: usize,
    entries: VecDeque<AppEvent>,
}

impl BoundedEventCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(64)),
        }
    }

    /// Insert an event, evicting the oldest entry when at capacity
    pub(crate) fn push(&mut self, event: AppEvent) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    /// Snapshot of the cached events, oldest first
    pub(crate) fn snapshot(&self) -> Vec<AppEvent> {
        self.entries.iter().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
