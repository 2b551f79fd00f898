use crate::session::SettingsSnapshot;

/// Commands the client sends to the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Ask the recorder to start capturing for a game event.
    StartRecording {
        /// Caller-chosen identifier of the triggering event.
        event_id: String,
    },
    /// Ask the recorder to stop a capture.
    StopRecording {
        /// Identifier the recorder assigned when the capture started.
        recording_id: String,
    },
    /// Announce an event type the recorder may later be asked to capture.
    RegisterEvent {
        /// Event identifier.
        event_id: String,
        /// Human-readable event name.
        event_name: String,
    },
    /// Request the current recorder settings.
    GetSettings,
    /// Keep-alive.
    Ping,
}

impl Outbound {
    /// Wire discriminator of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::StartRecording { .. } => "start_recording",
            Outbound::StopRecording { .. } => "stop_recording",
            Outbound::RegisterEvent { .. } => "register_event",
            Outbound::GetSettings => "get_settings",
            Outbound::Ping => "ping",
        }
    }
}

/// Messages the recorder pushes to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Full replacement of the recorder settings.
    Settings(SettingsSnapshot),
    /// A capture began.
    RecordingStarted {
        /// Recorder-assigned capture identifier.
        recording_id: String,
    },
    /// A capture finished and was written out.
    RecordingStopped {
        /// Identifier of the finished capture.
        recording_id: String,
        /// Where the recorder stored the output.
        file_path: String,
        /// Capture length in seconds.
        duration: f64,
        /// Output size in bytes.
        file_size: u64,
    },
    /// Acknowledgment of a `register_event` command. Carries no identifier.
    EventRegistered,
    /// Keep-alive reply.
    Pong,
    /// The recorder is going away and suggests when to come back.
    ServerShutdown {
        /// Suggested wait before reconnecting, in milliseconds.
        reconnect_delay_ms: u64,
    },
    /// The recorder reported a failure.
    Error {
        /// Verbatim error text.
        message: String,
    },
}
