//! Error types for event bus operations
//!
//! None of these propagate out of `publish`/`subscribe`/`unsubscribe`; the
//! bus stays usable after any single producer or consumer misbehaves. They
//! exist for logging and for the `on_error` middleware hook.

use crate::subscription::SubscriptionId;
use std::time::Duration;

/// Error types for event bus operations
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    /// A subscriber callback panicked during delivery
    #[error("handler panicked for subscription {subscription_id}: {message}")]
    HandlerPanicked {
        subscription_id: SubscriptionId,
        message: String,
    },

    /// A middleware `on_publish` hook exceeded the configured timeout
    #[error("middleware '{name}' timed out after {timeout:?}")]
    MiddlewareTimeout { name: String, timeout: Duration },

    /// A middleware hook panicked
    #[error("middleware '{name}' panicked: {message}")]
    MiddlewarePanicked { name: String, message: String },

    /// `subscribe_pattern` was given a pattern that does not compile
    #[error("invalid subscription pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Best-effort extraction of a panic payload for logging
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
