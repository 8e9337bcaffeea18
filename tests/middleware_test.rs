use appbus::{
    AppEvent, EventBus, EventBusConfig, EventBusError, EventTag, Middleware, PublishOutcome,
    ReplayFilter, SubscriptionId,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Vetoes any custom event whose payload carries `"blocked": true`
struct BlockedEventGate;

impl Middleware for BlockedEventGate {
    fn name(&self) -> &str {
        "blocked_event_gate"
    }

    fn on_publish(&self, event: AppEvent) -> Option<AppEvent> {
        if let AppEvent::Custom { payload, .. } = &event {
            if payload["blocked"].as_bool() == Some(true) {
                return None;
            }
        }
        Some(event)
    }
}

#[tokio::test]
async fn test_veto_suppresses_cache_record_and_delivery() {
    let bus = EventBus::new();
    bus.start_recording();
    bus.add_middleware(Arc::new(BlockedEventGate));

    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = invocations.clone();
    bus.subscribe(EventTag::Custom("job".into()), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let outcome = bus
        .publish(AppEvent::custom("job", serde_json::json!({ "blocked": true })))
        .await;
    assert_eq!(outcome, PublishOutcome::Vetoed);
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert!(bus.event_history(&ReplayFilter::new()).is_empty());

    let stats = bus.statistics();
    assert_eq!(stats.events_published, 0);
    assert_eq!(stats.events_vetoed, 1);
    assert_eq!(stats.cache_depth_per_tag.get("job"), None);

    // Unblocked events pass through unchanged
    let outcome = bus
        .publish(AppEvent::custom("job", serde_json::json!({ "blocked": false })))
        .await;
    assert_eq!(outcome, PublishOutcome::Delivered(1));
}

#[tokio::test]
async fn test_on_publish_runs_in_priority_order() {
    struct Stamp {
        name: &'static str,
        priority: i32,
        order: Arc<Mutex<Vec<&'static str>>>,
    }
    impl Middleware for Stamp {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn on_publish(&self, event: AppEvent) -> Option<AppEvent> {
            self.order.lock().push(self.name);
            Some(event)
        }
    }

    let bus = EventBus::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    bus.add_middleware(Arc::new(Stamp {
        name: "second",
        priority: 1,
        order: order.clone(),
    }));
    bus.add_middleware(Arc::new(Stamp {
        name: "first",
        priority: 9,
        order: order.clone(),
    }));
    bus.add_middleware(Arc::new(Stamp {
        name: "third",
        priority: -1,
        order: order.clone(),
    }));

    bus.publish(AppEvent::token_expired("github".into())).await;
    assert_eq!(*order.lock(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_add_and_remove_middleware_idempotent() {
    let bus = EventBus::new();
    bus.add_middleware(Arc::new(BlockedEventGate));
    bus.add_middleware(Arc::new(BlockedEventGate));
    assert_eq!(bus.statistics().middleware_count, 1);

    bus.remove_middleware("blocked_event_gate");
    bus.remove_middleware("blocked_event_gate");
    assert_eq!(bus.statistics().middleware_count, 0);
}

#[tokio::test]
async fn test_on_deliver_redacts_for_one_subscriber_only() {
    /// Suppresses delivery of security alerts to one specific subscriber
    struct PerRecipientGate {
        denied: Mutex<Option<SubscriptionId>>,
    }
    impl Middleware for PerRecipientGate {
        fn name(&self) -> &str {
            "per_recipient_gate"
        }
        fn on_deliver(&self, event: AppEvent, subscriber: &SubscriptionId) -> Option<AppEvent> {
            if self.denied.lock().as_ref() == Some(subscriber) {
                return None;
            }
            Some(event)
        }
    }

    let bus = EventBus::new();
    let gate = Arc::new(PerRecipientGate {
        denied: Mutex::new(None),
    });
    bus.add_middleware(gate.clone());

    let denied_hits = Arc::new(AtomicUsize::new(0));
    let allowed_hits = Arc::new(AtomicUsize::new(0));

    let counter = denied_hits.clone();
    let denied_id = bus.subscribe(EventTag::TokenExpired, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = allowed_hits.clone();
    bus.subscribe(EventTag::TokenExpired, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    *gate.denied.lock() = Some(denied_id);
    let outcome = bus.publish(AppEvent::token_expired("github".into())).await;

    assert_eq!(outcome, PublishOutcome::Delivered(1));
    assert_eq!(denied_hits.load(Ordering::SeqCst), 0);
    assert_eq!(allowed_hits.load(Ordering::SeqCst), 1);

    // The per-recipient veto did not stop the event from being cached
    assert_eq!(
        bus.statistics().cache_depth_per_tag.get("token_expired"),
        Some(&1)
    );
}

#[tokio::test]
async fn test_on_error_hook_sees_handler_failures() {
    struct ErrorCollector {
        errors: Arc<Mutex<Vec<String>>>,
    }
    impl Middleware for ErrorCollector {
        fn name(&self) -> &str {
            "error_collector"
        }
        fn on_error(&self, error: &EventBusError, _event: &AppEvent) {
            self.errors.lock().push(error.to_string());
        }
    }

    let bus = EventBus::new();
    let errors = Arc::new(Mutex::new(Vec::new()));
    bus.add_middleware(Arc::new(ErrorCollector {
        errors: errors.clone(),
    }));
    bus.subscribe(EventTag::HealthChanged, |_| panic!("boom"));

    bus.publish(AppEvent::health_changed("db".into(), true, None))
        .await;

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("handler panicked"));
    assert!(errors[0].contains("boom"));
}

#[tokio::test]
async fn test_slow_middleware_cannot_hang_publish() {
    struct Sleeper;
    impl Middleware for Sleeper {
        fn name(&self) -> &str {
            "sleeper"
        }
        fn on_publish(&self, _event: AppEvent) -> Option<AppEvent> {
            std::thread::sleep(Duration::from_millis(400));
            None // would veto, but the timeout discards this result
        }
    }

    let config = EventBusConfig {
        middleware_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let bus = EventBus::with_config(config);
    bus.add_middleware(Arc::new(Sleeper));

    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = invocations.clone();
    bus.subscribe(EventTag::TokenExpired, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let started = std::time::Instant::now();
    let outcome = bus.publish(AppEvent::token_expired("github".into())).await;
    assert!(started.elapsed() < Duration::from_secs(2));

    // The timed-out middleware's veto never took effect: the original event
    // continued through the chain and was delivered.
    assert_eq!(outcome, PublishOutcome::Delivered(1));
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_panicking_middleware_leaves_event_unmodified() {
    struct Faulty;
    impl Middleware for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }
        fn priority(&self) -> i32 {
            10
        }
        fn on_publish(&self, _event: AppEvent) -> Option<AppEvent> {
            panic!("middleware bug");
        }
    }

    let bus = EventBus::new();
    bus.add_middleware(Arc::new(Faulty));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.subscribe(EventTag::BrowserOpenRequested, move |event| {
        if let AppEvent::BrowserOpenRequested { url, .. } = event {
            sink.lock().push(url);
        }
    });

    let outcome = bus
        .publish(AppEvent::browser_open_requested("https://example.com".into()))
        .await;
    assert_eq!(outcome, PublishOutcome::Delivered(1));
    assert_eq!(*seen.lock(), vec!["https://example.com".to_string()]);
}
