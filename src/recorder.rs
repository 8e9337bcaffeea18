//! Debug-oriented record/replay subsystem
//!
//! Independent of the live per-tag cache: while recording is enabled, every
//! successfully published (non-vetoed) event is appended to a bounded
//! timestamped history. A filtered slice of that history can be re-published
//! to any target bus instance, or returned for passive inspection.

use crate::types::AppEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// One captured history entry
#[derive(Debug, Clone, Serialize)]
pub struct RecordedEvent {
    pub event: AppEvent,
    pub recorded_at: DateTime<Utc>,
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// Bounded event history, capturing only while enabled
#[derive(Debug)]
pub(crate) struct EventRecorder {
    enabled: bool,
    capacity: usize,
    history: VecDeque<RecordedEvent>,
}

impl EventRecorder {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            enabled: false,
            capacity,
            history: VecDeque::new(),
        }
    }

    pub(crate) fn start(&mut self) {
        self.enabled = true;
    }

    pub(crate) fn stop(&mut self) {
        self.enabled = false;
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn len(&self) -> usize {
        self.history.len()
    }

    /// Append an entry if recording is enabled, evicting the oldest at capacity
    pub(crate) fn record(
        &mut self,
        event: &AppEvent,
        context: serde_json::Map<String, serde_json::Value>,
    ) {
        if !self.enabled || self.capacity == 0 {
            return;
        }
        while self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(RecordedEvent {
            event: event.clone(),
            recorded_at: Utc::now(),
            context,
        });
    }

    /// Entries matching the filter, in original capture order
    pub(crate) fn slice(&self, filter: &ReplayFilter) -> Vec<RecordedEvent> {
        self.history
            .iter()
            .filter(|record| filter.accepts(record))
            .cloned()
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.history.clear();
        self.enabled = false;
    }
}

/// Selection criteria for `replay_events` and `event_history`
///
/// An empty filter matches everything.
#[derive(Clone, Default)]
pub struct ReplayFilter {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    predicate: Option<Arc<dyn Fn(&AppEvent) -> bool + Send + Sync>>,
}

impl ReplayFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only entries recorded at or after this instant
    #[must_use]
    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Only entries recorded at or before this instant
    #[must_use]
    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Only entries whose event satisfies the predicate
    #[must_use]
    pub fn matching(mut self, predicate: impl Fn(&AppEvent) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub(crate) fn accepts(&self, record: &RecordedEvent) -> bool {
        if let Some(from) = self.from {
            if record.recorded_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.recorded_at > to {
                return false;
            }
        }
        match &self.predicate {
            Some(predicate) => predicate(&record.event),
            None => true,
        }
    }
}

impl std::fmt::Debug for ReplayFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayFilter")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}
