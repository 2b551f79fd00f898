use crate::{
    ClientError, ConnectionState, ErrorClass, Notification, NotificationKind,
    tests::mock_transport::{OnOpen, connected_client, next_of_kind, test_config},
    transport::TransportEvent,
};

use std::time::Duration;

use tokio::time::Instant;

/// WHAT: Established moves to Connected, requests settings and starts the heartbeat
/// WHY: Scenario A, the connect handshake
#[tokio::test(start_paused = true)]
async fn given_disconnected_client_when_transport_established_then_connected_with_settings_and_heartbeat()
 {
    // Given/When: connect() and the transport establishes
    let (client, transport, mut notifications) = connected_client(test_config()).await;

    // Then: Connected, get_settings sent once, heartbeat active
    let snapshot = client.snapshot();
    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert_eq!(snapshot.attempts_made, 0);
    assert!(snapshot.heartbeat_active);
    assert_eq!(transport.sent_of_kind("get_settings").len(), 1);
    assert_eq!(
        next_of_kind(&mut notifications, NotificationKind::Connected).await,
        Some(Notification::Connected)
    );
}

/// WHAT: Start with auto-record disabled returns an error and sends nothing
/// WHY: Scenario B, local policy short-circuit
#[tokio::test(start_paused = true)]
async fn given_auto_record_disabled_when_starting_then_state_error_and_no_frame() {
    // Given: Connected, server pushed auto_record_enabled=false
    let (client, transport, mut notifications) = connected_client(test_config()).await;
    transport.receive(
        r#"{"type":"settings","auto_record_enabled":false,"max_recording_duration":300,"video_quality":"high"}"#,
    );
    next_of_kind(&mut notifications, NotificationKind::SettingsChanged).await;
    assert!(!client.settings().auto_record_enabled);

    // When: start_recording("boss_fight")
    let result = client.start_recording("boss_fight").await;

    // Then: Refused, nothing on the wire, state-class error notified
    assert!(matches!(result, Err(ClientError::AutoRecordDisabled { .. })));
    assert!(transport.sent_of_kind("start_recording").is_empty());
    assert!(matches!(
        next_of_kind(&mut notifications, NotificationKind::Error).await,
        Some(Notification::Error {
            class: ErrorClass::State,
            ..
        })
    ));
}

/// WHAT: Delayed stop sends exactly one frame, no earlier than the delay
/// WHY: Scenario C, deferred stop that does not block other callers
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_connected_when_stopping_with_delay_then_single_frame_after_delay() {
    // Given: Connected
    let (client, transport, _notifications) = connected_client(test_config()).await;
    let called_at = Instant::now();

    // When: stop_recording("rec-1", 3s) runs in the background
    let stopper = client.clone();
    let stop = tokio::spawn(async move {
        stopper
            .stop_recording("rec-1", Duration::from_secs(3))
            .await
    });

    // Then: Other operations proceed during the delay
    client.register_event("boss", "Boss Fight").await.unwrap();
    assert_eq!(transport.sent_of_kind("register_event").len(), 1);

    tokio::time::sleep(Duration::from_millis(2_999)).await;
    assert!(transport.sent_of_kind("stop_recording").is_empty());

    // Then: Exactly one stop frame, at or after the 3s mark
    stop.await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let frames = transport.sent_of_kind("stop_recording");
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0["recording_id"], "rec-1");
    assert!(frames[0].1.duration_since(called_at) >= Duration::from_secs(3));
}

/// WHAT: Repeated closes exhaust the attempt cap and stop in Failed
/// WHY: Scenario D, fixed-delay bounded reconnect
#[tokio::test(start_paused = true)]
async fn given_cap_of_two_when_transport_keeps_closing_then_two_attempts_then_failed() {
    // Given: Connected with max_reconnect_attempts=2, reconnect_delay=1s
    let (client, transport, mut notifications) = connected_client(test_config()).await;
    transport.set_on_open(OnOpen::Refuse);

    // When: The transport reports Closed, and every reconnect is refused
    let closed_at = Instant::now();
    transport.inject(TransportEvent::Closed { was_clean: false });
    let waited = client.wait_for_state(ConnectionState::Failed).await;
    assert!(waited.is_ok());

    // Then: Exactly two reconnect attempts, each at least 1s after the previous drop
    let opens = transport.open_times();
    assert_eq!(opens.len(), 3);
    assert!(opens[1].duration_since(closed_at) >= Duration::from_secs(1));
    assert!(opens[2].duration_since(opens[1]) >= Duration::from_secs(1));
    assert_eq!(client.snapshot().attempts_made, 2);

    // Then: No third attempt, however long we wait
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.open_times().len(), 3);
    assert_eq!(client.state(), ConnectionState::Failed);

    assert_eq!(
        next_of_kind(&mut notifications, NotificationKind::Disconnected).await,
        Some(Notification::Disconnected)
    );
    assert!(matches!(
        next_of_kind(&mut notifications, NotificationKind::Error).await,
        Some(Notification::Error {
            class: ErrorClass::Connection,
            ..
        })
    ));
}

/// WHAT: Start then matching stop sets and clears the recording id
/// WHY: Scenario E, confirmation correlation by recording id
#[tokio::test(start_paused = true)]
async fn given_connected_when_start_and_stop_confirmations_arrive_then_id_set_then_cleared() {
    // Given: Connected, with the connect notification drained
    let (client, transport, mut notifications) = connected_client(test_config()).await;
    next_of_kind(&mut notifications, NotificationKind::Connected).await;

    // When: recording_started rec-9 arrives
    transport.receive(r#"{"type":"recording_started","recording_id":"rec-9"}"#);
    let first = notifications.recv().await;

    // Then: id is rec-9
    assert_eq!(
        first,
        Some(Notification::RecordingStarted {
            recording_id: "rec-9".to_string()
        })
    );
    assert_eq!(client.current_recording_id().as_deref(), Some("rec-9"));

    // When: the matching recording_stopped arrives
    transport.receive(r#"{"type":"recording_stopped","recording_id":"rec-9","file_path":"/tmp/a.mp4"}"#);
    let second = notifications.recv().await;

    // Then: id cleared; exactly these two notifications fired, in order
    assert!(matches!(
        second,
        Some(Notification::RecordingStopped { ref recording_id, ref file_path, .. })
            if recording_id == "rec-9" && file_path == "/tmp/a.mp4"
    ));
    assert_eq!(client.current_recording_id(), None);
    assert!(notifications.try_recv().is_err());
}
