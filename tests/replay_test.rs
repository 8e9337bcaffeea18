use appbus::{AppEvent, EventBus, EventBusConfig, EventTag, ReplayFilter};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

fn seq_event(seq: u64) -> AppEvent {
    AppEvent::custom("trace", serde_json::json!({ "seq": seq }))
}

fn seq_of(event: &AppEvent) -> u64 {
    match event {
        AppEvent::Custom { payload, .. } => payload["seq"].as_u64().unwrap_or(0),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_recording_toggle() {
    let bus = EventBus::new();
    bus.publish(seq_event(1)).await;
    assert!(!bus.is_recording());
    assert!(bus.event_history(&ReplayFilter::new()).is_empty());

    bus.start_recording();
    bus.publish(seq_event(2)).await;
    bus.stop_recording();
    bus.publish(seq_event(3)).await;

    let history = bus.event_history(&ReplayFilter::new());
    assert_eq!(history.len(), 1);
    assert_eq!(seq_of(&history[0].event), 2);
}

#[tokio::test]
async fn test_history_is_bounded() {
    let config = EventBusConfig {
        history_capacity: 2,
        ..Default::default()
    };
    let bus = EventBus::with_config(config);
    bus.start_recording();
    for seq in 1..=4 {
        bus.publish(seq_event(seq)).await;
    }

    let seqs: Vec<u64> = bus
        .event_history(&ReplayFilter::new())
        .iter()
        .map(|record| seq_of(&record.event))
        .collect();
    assert_eq!(seqs, vec![3, 4]);
    assert_eq!(bus.statistics().recorded_events, 2);
}

#[tokio::test]
async fn test_history_time_window() {
    let bus = EventBus::new();
    bus.start_recording();
    bus.publish(seq_event(1)).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let cutoff = chrono::Utc::now();
    tokio::time::sleep(Duration::from_millis(20)).await;
    bus.publish(seq_event(2)).await;

    let recent = bus.event_history(&ReplayFilter::new().since(cutoff));
    assert_eq!(recent.len(), 1);
    assert_eq!(seq_of(&recent[0].event), 2);

    let earlier = bus.event_history(&ReplayFilter::new().until(cutoff));
    assert_eq!(earlier.len(), 1);
    assert_eq!(seq_of(&earlier[0].event), 1);
}

#[tokio::test]
async fn test_replay_to_separate_target_in_order() {
    let source = EventBus::new();
    source.start_recording();
    for seq in 1..=3 {
        source.publish(seq_event(seq)).await;
    }

    let target = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    target.subscribe(EventTag::Custom("trace".into()), move |event| {
        sink.lock().push(seq_of(&event));
    });

    let replayed = source
        .replay_events(&target, &ReplayFilter::new())
        .await;
    assert_eq!(replayed, 3);
    assert_eq!(*seen.lock(), vec![1, 2, 3]);

    // The source's own subscribers were not re-notified
    assert_eq!(source.statistics().events_delivered, 0);
}

#[tokio::test]
async fn test_replay_with_predicate_filter() {
    let source = EventBus::new();
    source.start_recording();
    source.publish(AppEvent::token_expired("github".into())).await;
    source
        .publish(AppEvent::token_refreshed("github".into(), None))
        .await;

    let target = EventBus::new();
    let hits = Arc::new(Mutex::new(Vec::new()));
    let sink = hits.clone();
    target.subscribe(EventTag::TokenExpired, move |event| {
        sink.lock().push(event.tag().to_string());
    });
    let sink = hits.clone();
    target.subscribe(EventTag::TokenRefreshed, move |event| {
        sink.lock().push(event.tag().to_string());
    });

    let filter =
        ReplayFilter::new().matching(|event| matches!(event, AppEvent::TokenExpired { .. }));
    let replayed = source.replay_events(&target, &filter).await;

    assert_eq!(replayed, 1);
    assert_eq!(*hits.lock(), vec!["token_expired".to_string()]);
}

#[tokio::test]
async fn test_replay_into_same_bus() {
    let bus = EventBus::new();
    bus.start_recording();
    bus.publish(seq_event(1)).await;
    bus.stop_recording();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.subscribe(EventTag::Custom("trace".into()), move |event| {
        sink.lock().push(seq_of(&event));
    });
    seen.lock().clear(); // drop the cache catch-up delivery

    let bus_clone = bus.clone();
    let replayed = bus.replay_events(&bus_clone, &ReplayFilter::new()).await;
    assert_eq!(replayed, 1);
    assert_eq!(*seen.lock(), vec![1]);
}
