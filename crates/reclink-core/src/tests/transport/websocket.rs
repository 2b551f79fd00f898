use crate::{
    ClientError,
    transport::{Transport, TransportEvent, WsTransport},
};

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::{net::TcpListener, sync::mpsc};
use tokio_tungstenite::tungstenite::Message;

#[allow(clippy::unwrap_used)]
async fn next_event(rx: &mut mpsc::UnboundedReceiver<TransportEvent>) -> TransportEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap()
}

/// WHAT: Non-WebSocket URLs are rejected synchronously
/// WHY: A bad endpoint is a configuration error, not something to retry
#[tokio::test]
async fn given_http_url_when_opening_then_connection_failed() {
    // Given: A fresh transport
    let mut transport = WsTransport::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // When: Opening an http:// URL
    let result = transport.open("http://localhost:9876", tx);

    // Then: ConnectionFailed and no events
    assert!(matches!(result, Err(ClientError::ConnectionFailed { .. })));
    assert!(rx.try_recv().is_err());
}

/// WHAT: Sending before open fails
/// WHY: There is no socket to write to
#[test]
fn given_unopened_transport_when_sending_then_connection_failed() {
    let mut transport = WsTransport::new();

    let result = transport.send("{}".to_string());

    assert!(matches!(result, Err(ClientError::ConnectionFailed { .. })));
}

/// WHAT: Handshake, outbound frame, inbound text and peer close map onto transport events
/// WHY: This is the only production transport the manager runs on
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_loopback_server_when_exchanging_frames_then_events_in_order() {
    // Given: A server that reads one frame, pushes one back, then closes
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

        let first = match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => text.as_str().to_owned(),
            other => format!("{other:?}"),
        };

        ws.send(Message::text(
            r#"{"type":"recording_started","recording_id":"r1"}"#,
        ))
        .await
        .unwrap();
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}

        first
    });

    // When: Opening and sending one frame once established
    let mut transport = WsTransport::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.open(&format!("ws://{addr}"), tx).unwrap();

    assert_eq!(next_event(&mut rx).await, TransportEvent::Established);
    transport
        .send(r#"{"type":"get_settings","timestamp":1.0}"#.to_string())
        .unwrap();

    // Then: The server's frame arrives, followed by a clean close
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::DataReceived(
            r#"{"type":"recording_started","recording_id":"r1"}"#.to_string()
        )
    );
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Closed { was_clean: true }
    );

    // Then: The server saw our frame verbatim
    assert_eq!(
        server.await.unwrap(),
        r#"{"type":"get_settings","timestamp":1.0}"#
    );
}

/// WHAT: A refused connect reports Error then an unclean Closed
/// WHY: The manager treats Closed as the trigger for its reconnect policy
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_nothing_listening_when_opening_then_error_then_closed() {
    // Given: A port that was just released
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    // When: Opening against it
    let mut transport = WsTransport::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.open(&format!("ws://{addr}"), tx).unwrap();

    // Then: Error, then Closed { was_clean: false }
    assert!(matches!(
        next_event(&mut rx).await,
        TransportEvent::Error { .. }
    ));
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Closed { was_clean: false }
    );
}

/// WHAT: A peer that never answers the handshake times out
/// WHY: A blackholed host must not hold the client in Connecting indefinitely
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_silent_peer_when_handshake_exceeds_timeout_then_error_then_closed() {
    // Given: A listener that never accepts, so the upgrade is never answered
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // When: Opening with a short handshake limit
    let mut transport = WsTransport::with_connect_timeout(Duration::from_millis(200));
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.open(&format!("ws://{addr}"), tx).unwrap();

    // Then: A timeout error, then an unclean close
    assert!(matches!(
        next_event(&mut rx).await,
        TransportEvent::Error { ref reason } if reason.contains("timed out")
    ));
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Closed { was_clean: false }
    );
    drop(listener);
}

/// WHAT: close() during the handshake abandons the attempt
/// WHY: A superseded attempt must not linger until the OS gives up
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_pending_handshake_when_closed_then_attempt_abandoned() {
    // Given: A handshake that will never complete
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut transport = WsTransport::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    transport.open(&format!("ws://{addr}"), tx).unwrap();

    // When: Closing before it finishes
    transport.close();

    // Then: The task reports an unclean close well before the handshake limit
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Closed { was_clean: false }
    );
    drop(listener);
}
