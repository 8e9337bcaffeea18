//! Serializable introspection snapshots
//!
//! Purely observational views over the bus: building one never mutates state.

use crate::subscription::SubscriptionId;
use crate::types::EventTag;
use serde::Serialize;
use std::collections::HashMap;

/// Point-in-time statistics for the whole bus
#[derive(Debug, Clone, Serialize)]
pub struct BusStatistics {
    pub events_published: u64,
    pub events_delivered: u64,
    pub events_vetoed: u64,
    pub handler_failures: u64,
    pub active_subscriptions: usize,
    pub tag_controllers: usize,
    pub pending_events: usize,
    pub paused: bool,
    pub middleware_count: usize,
    /// Publish count per tag (tags keyed by their display form)
    pub published_per_tag: HashMap<String, u64>,
    /// Registered handler count per tag
    pub subscribers_per_tag: HashMap<String, usize>,
    /// Current cache depth per tag
    pub cache_depth_per_tag: HashMap<String, usize>,
    pub recording_enabled: bool,
    pub recorded_events: usize,
}

/// One entry in the active-subscription listing
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionInfo {
    pub id: SubscriptionId,
    pub tag: EventTag,
    pub priority: i32,
    pub invocation_count: u32,
    pub active: bool,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
}
