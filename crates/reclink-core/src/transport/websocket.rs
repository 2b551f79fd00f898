use crate::{
    ClientError, CoreResult,
    transport::{Transport, TransportEvent, TransportEvents},
};

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};

/// Limit on TCP connect plus the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

enum Outgoing {
    Frame(String),
    Close,
}

/// [`Transport`] backed by a tokio-tungstenite WebSocket.
///
/// Each `open` spawns one connection task that owns the socket. Frames are
/// handed to it through an unbounded channel, so `send` never blocks.
#[derive(Debug)]
pub struct WsTransport {
    connect_timeout: Duration,
    outgoing: Option<mpsc::UnboundedSender<Outgoing>>,
    task: Option<JoinHandle<()>>,
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::with_connect_timeout(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl WsTransport {
    /// Creates a closed transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a closed transport that gives up on handshakes after `connect_timeout`.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            outgoing: None,
            task: None,
        }
    }
}

impl Transport for WsTransport {
    #[track_caller]
    #[instrument(skip(self, events))]
    fn open(&mut self, url: &str, events: TransportEvents) -> CoreResult<()> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(ClientError::connection(format!(
                "Unsupported URL scheme: {url}"
            )));
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.outgoing = Some(tx);
        self.task = Some(tokio::spawn(run_connection(
            url.to_string(),
            self.connect_timeout,
            rx,
            events,
        )));

        Ok(())
    }

    #[track_caller]
    fn send(&mut self, frame: String) -> CoreResult<()> {
        let Some(outgoing) = self.outgoing.as_ref() else {
            return Err(ClientError::connection("WebSocket is not open"));
        };

        outgoing
            .send(Outgoing::Frame(frame))
            .map_err(|_| ClientError::connection("WebSocket writer has stopped"))
    }

    fn close(&mut self) {
        if let Some(outgoing) = self.outgoing.take() {
            // Receiver already gone means the connection task has finished.
            let _ = outgoing.send(Outgoing::Close);
        }
        // The task finishes on its own after the close frame.
        self.task = None;
    }
}

async fn run_connection(
    url: String,
    connect_timeout: Duration,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: TransportEvents,
) {
    let connect = tokio::time::timeout(
        connect_timeout,
        tokio_tungstenite::connect_async(url.as_str()),
    );
    tokio::pin!(connect);

    // Frames queued before the handshake finishes go out right after it.
    let mut pending = Vec::new();

    let stream = loop {
        tokio::select! {
            result = &mut connect => {
                let reason = match result {
                    Ok(Ok((stream, _response))) => break stream,
                    Ok(Err(e)) => e.to_string(),
                    Err(_) => format!(
                        "WebSocket handshake timed out after {}ms",
                        connect_timeout.as_millis()
                    ),
                };
                warn!(url = %url, error = %reason, "WebSocket connect failed");
                let _ = events.send(TransportEvent::Error { reason });
                let _ = events.send(TransportEvent::Closed { was_clean: false });
                return;
            }

            command = outgoing.recv() => match command {
                Some(Outgoing::Frame(text)) => pending.push(text),
                Some(Outgoing::Close) | None => {
                    debug!(url = %url, "Closed before the handshake finished");
                    let _ = events.send(TransportEvent::Closed { was_clean: false });
                    return;
                }
            },
        }
    };

    info!(url = %url, "WebSocket established");
    let _ = events.send(TransportEvent::Established);

    let (mut write, mut read) = stream.split();

    for text in pending {
        if let Err(e) = write.send(Message::text(text)).await {
            warn!(error = %e, "WebSocket send failed");
            let _ = events.send(TransportEvent::Error { reason: e.to_string() });
            let _ = events.send(TransportEvent::Closed { was_clean: false });
            return;
        }
    }

    loop {
        tokio::select! {
            command = outgoing.recv() => match command {
                Some(Outgoing::Frame(text)) => {
                    if let Err(e) = write.send(Message::text(text)).await {
                        warn!(error = %e, "WebSocket send failed");
                        let _ = events.send(TransportEvent::Error { reason: e.to_string() });
                        let _ = events.send(TransportEvent::Closed { was_clean: false });
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    let _ = events.send(TransportEvent::Closed { was_clean: true });
                    break;
                }
            },

            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(TransportEvent::DataReceived(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Peer closed WebSocket");
                    let _ = events.send(TransportEvent::Closed { was_clean: true });
                    break;
                }
                // Binary frames are not part of the protocol; ping/pong is answered by tungstenite.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket receive failed");
                    let _ = events.send(TransportEvent::Error { reason: e.to_string() });
                    let _ = events.send(TransportEvent::Closed { was_clean: false });
                    break;
                }
                None => {
                    let _ = events.send(TransportEvent::Closed { was_clean: false });
                    break;
                }
            },
        }
    }

    debug!("WebSocket connection task finished");
}
