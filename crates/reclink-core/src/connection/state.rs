use crate::session::{RecordingSession, SettingsSnapshot};

use std::{fmt, time::Duration};

use tokio::time::Instant;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Idle; no connection wanted or the caller disconnected.
    #[default]
    Disconnected,
    /// Transport is opening.
    Connecting,
    /// Transport is open.
    Connected,
    /// Waiting out the reconnect delay.
    Reconnecting,
    /// Reconnect attempts exhausted. Needs an explicit `connect()`.
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Reconnecting => "Reconnecting",
            ConnectionState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Fixed-delay, bounded-attempt retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Whether unexpected disconnects are retried at all.
    pub enabled: bool,
    /// Wait before each attempt.
    pub delay: Duration,
    /// Attempts allowed before entering [`ConnectionState::Failed`].
    pub max_attempts: u32,
}

/// Point-in-time view of the client published after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientSnapshot {
    /// Current lifecycle state.
    pub state: ConnectionState,
    /// Reconnect attempts since the last successful connection.
    pub attempts_made: u32,
    /// Active recording, if any.
    pub session: RecordingSession,
    /// Last settings pushed by the recorder.
    pub settings: SettingsSnapshot,
    /// Whether a keep-alive loop is running.
    pub heartbeat_active: bool,
    /// When the last `pong` arrived on the current connection.
    pub last_pong: Option<Instant>,
}

impl ClientSnapshot {
    /// Shortcut for the active recording id.
    pub fn current_recording_id(&self) -> Option<&str> {
        self.session.current_recording_id.as_deref()
    }
}
