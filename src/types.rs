//! Event type definitions for the application event bus
//!
//! This module contains the domain event enum, the tag discriminant used as
//! the sole routing key, and helper constructors for the common event shapes
//! published by the security-audit, OAuth, and health collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Severity attached to security alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// Routing discriminant for events
///
/// The tag is the sole routing key: subscriptions, caches, and per-tag
/// counters are all keyed by it. `Custom` carries the name of an
/// application-defined event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTag {
    SecurityAlert,
    AuditEntryRecorded,
    AuthorizationRequested,
    BrowserOpenRequested,
    TokenRefreshed,
    TokenExpired,
    HealthChanged,
    ResourceWarning,
    BackgroundTaskCompleted,
    Custom(String),
}

impl EventTag {
    /// The statically known tags, in declaration order
    ///
    /// Used by pattern subscriptions to resolve against tags that exist
    /// before any event of that tag has been published.
    #[must_use]
    pub fn known() -> Vec<EventTag> {
        vec![
            EventTag::SecurityAlert,
            EventTag::AuditEntryRecorded,
            EventTag::AuthorizationRequested,
            EventTag::BrowserOpenRequested,
            EventTag::TokenRefreshed,
            EventTag::TokenExpired,
            EventTag::HealthChanged,
            EventTag::ResourceWarning,
            EventTag::BackgroundTaskCompleted,
        ]
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTag::SecurityAlert => write!(f, "security_alert"),
            EventTag::AuditEntryRecorded => write!(f, "audit_entry_recorded"),
            EventTag::AuthorizationRequested => write!(f, "authorization_requested"),
            EventTag::BrowserOpenRequested => write!(f, "browser_open_requested"),
            EventTag::TokenRefreshed => write!(f, "token_refreshed"),
            EventTag::TokenExpired => write!(f, "token_expired"),
            EventTag::HealthChanged => write!(f, "health_changed"),
            EventTag::ResourceWarning => write!(f, "resource_warning"),
            EventTag::BackgroundTaskCompleted => write!(f, "background_task_completed"),
            EventTag::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Domain events published on the bus
///
/// Immutable once published. Every variant carries its creation timestamp;
/// `Custom` additionally carries an arbitrary JSON payload for events the
/// core application does not model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// Emitted by the security-audit component alongside every audit entry
    SecurityAlert {
        severity: AlertSeverity,
        source: String,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// Emitted when an audit entry has been written
    AuditEntryRecorded {
        entry_id: String,
        action: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// OAuth flow needs user interaction; a platform listener is expected to
    /// open the authorization URL in a browser or WebView
    AuthorizationRequested {
        provider: String,
        authorization_url: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// Explicit request to open a URL in the system browser
    BrowserOpenRequested {
        url: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// An OAuth token was refreshed successfully
    TokenRefreshed {
        provider: String,
        expires_in: Option<Duration>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// An OAuth token expired and could not be refreshed
    TokenExpired {
        provider: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// A monitored component changed health state
    HealthChanged {
        component: String,
        healthy: bool,
        detail: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// A resource (memory, disk, connections) crossed a warning threshold
    ResourceWarning {
        resource: String,
        usage_percent: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// A scheduled background task finished
    BackgroundTaskCompleted {
        task: String,
        duration: Duration,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// Application-defined event with an arbitrary payload
    Custom {
        name: String,
        payload: serde_json::Value,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl AppEvent {
    /// The routing tag for this event
    #[must_use]
    pub fn tag(&self) -> EventTag {
        match self {
            AppEvent::SecurityAlert { .. } => EventTag::SecurityAlert,
            AppEvent::AuditEntryRecorded { .. } => EventTag::AuditEntryRecorded,
            AppEvent::AuthorizationRequested { .. } => EventTag::AuthorizationRequested,
            AppEvent::BrowserOpenRequested { .. } => EventTag::BrowserOpenRequested,
            AppEvent::TokenRefreshed { .. } => EventTag::TokenRefreshed,
            AppEvent::TokenExpired { .. } => EventTag::TokenExpired,
            AppEvent::HealthChanged { .. } => EventTag::HealthChanged,
            AppEvent::ResourceWarning { .. } => EventTag::ResourceWarning,
            AppEvent::BackgroundTaskCompleted { .. } => EventTag::BackgroundTaskCompleted,
            AppEvent::Custom { name, .. } => EventTag::Custom(name.clone()),
        }
    }

    /// Creation timestamp stamped when the event was constructed
    #[must_use]
    pub fn timestamp(&self) -> chrono::DateTime<chrono::Utc> {
        match self {
            AppEvent::SecurityAlert { timestamp, .. }
            | AppEvent::AuditEntryRecorded { timestamp, .. }
            | AppEvent::AuthorizationRequested { timestamp, .. }
            | AppEvent::BrowserOpenRequested { timestamp, .. }
            | AppEvent::TokenRefreshed { timestamp, .. }
            | AppEvent::TokenExpired { timestamp, .. }
            | AppEvent::HealthChanged { timestamp, .. }
            | AppEvent::ResourceWarning { timestamp, .. }
            | AppEvent::BackgroundTaskCompleted { timestamp, .. }
            | AppEvent::Custom { timestamp, .. } => *timestamp,
        }
    }
}

/// Helper functions for creating common events
impl AppEvent {
    /// Create a `SecurityAlert` event
    #[must_use]
    pub fn security_alert(severity: AlertSeverity, source: String, message: String) -> Self {
        Self::SecurityAlert {
            severity,
            source,
            message,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create an `AuditEntryRecorded` event
    #[must_use]
    pub fn audit_entry_recorded(entry_id: String, action: String) -> Self {
        Self::AuditEntryRecorded {
            entry_id,
            action,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create an `AuthorizationRequested` event
    #[must_use]
    pub fn authorization_requested(provider: String, authorization_url: String) -> Self {
        Self::AuthorizationRequested {
            provider,
            authorization_url,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a `BrowserOpenRequested` event
    #[must_use]
    pub fn browser_open_requested(url: String) -> Self {
        Self::BrowserOpenRequested {
            url,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a `TokenRefreshed` event
    #[must_use]
    pub fn token_refreshed(provider: String, expires_in: Option<Duration>) -> Self {
        Self::TokenRefreshed {
            provider,
            expires_in,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a `TokenExpired` event
    #[must_use]
    pub fn token_expired(provider: String) -> Self {
        Self::TokenExpired {
            provider,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a `HealthChanged` event
    #[must_use]
    pub fn health_changed(component: String, healthy: bool, detail: Option<String>) -> Self {
        Self::HealthChanged {
            component,
            healthy,
            detail,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a `ResourceWarning` event
    #[must_use]
    pub fn resource_warning(resource: String, usage_percent: f64) -> Self {
        Self::ResourceWarning {
            resource,
            usage_percent,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a `BackgroundTaskCompleted` event
    #[must_use]
    pub fn background_task_completed(task: String, duration: Duration) -> Self {
        Self::BackgroundTaskCompleted {
            task,
            duration,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a `Custom` event with an arbitrary JSON payload
    #[must_use]
    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Custom {
            name: name.into(),
            payload,
            timestamp: chrono::Utc::now(),
        }
    }
}
