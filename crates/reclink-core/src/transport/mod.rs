//! Duplex text-message channel to the recorder.
//!
//! A [`Transport`] only moves frames. It reports lifecycle changes and inbound
//! data through the event sink handed to [`Transport::open`] and never
//! retries on its own; reconnection belongs to the connection manager.

mod websocket;

pub use websocket::{DEFAULT_CONNECT_TIMEOUT, WsTransport};

use crate::CoreResult;

use tokio::sync::mpsc;

/// Lifecycle and data notifications produced by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The channel is open and ready for frames.
    Established,
    /// The channel closed.
    Closed {
        /// `true` when the close handshake completed.
        was_clean: bool,
    },
    /// The channel failed. Usually followed by `Closed`.
    Error {
        /// Description of the failure.
        reason: String,
    },
    /// One inbound text frame.
    DataReceived(String),
}

/// Sink a transport pushes its events into for one connection attempt.
pub type TransportEvents = mpsc::UnboundedSender<TransportEvent>;

/// Duplex message channel used by the connection manager.
///
/// Implementations must not block: `open` starts connecting and returns,
/// with the outcome reported later as [`TransportEvent::Established`] or
/// [`TransportEvent::Closed`].
pub trait Transport: Send + 'static {
    /// Starts connecting to `url`, reporting progress into `events`.
    ///
    /// Any previous connection is abandoned.
    fn open(&mut self, url: &str, events: TransportEvents) -> CoreResult<()>;

    /// Queues one text frame for delivery.
    fn send(&mut self, frame: String) -> CoreResult<()>;

    /// Closes the channel. Safe to call when already closed.
    fn close(&mut self);
}
