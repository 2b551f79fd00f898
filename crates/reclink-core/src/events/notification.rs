use crate::{ErrorClass, SettingsSnapshot};

/// Typed notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The transport reached the recorder.
    Connected,
    /// A live connection was lost or closed.
    Disconnected,
    /// The recorder confirmed a capture started.
    RecordingStarted {
        /// Recorder-assigned capture identifier.
        recording_id: String,
    },
    /// The recorder confirmed a capture finished.
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
    /// The recorder pushed new settings.
    SettingsChanged(SettingsSnapshot),
    /// The recorder acknowledged a `register_event` command.
    EventRegistered,
    /// The recorder announced it is shutting down.
    ServerShutdown {
        /// Suggested wait before reconnecting, in milliseconds.
        reconnect_delay_ms: u64,
    },
    /// Something went wrong. Never fatal.
    Error {
        /// Taxonomy class of the failure.
        class: ErrorClass,
        /// Human-readable description.
        message: String,
    },
}

/// Discriminant of [`Notification`], used to subscribe to one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// See [`Notification::Connected`].
    Connected,
    /// See [`Notification::Disconnected`].
    Disconnected,
    /// See [`Notification::RecordingStarted`].
    RecordingStarted,
    /// See [`Notification::RecordingStopped`].
    RecordingStopped,
    /// See [`Notification::SettingsChanged`].
    SettingsChanged,
    /// See [`Notification::EventRegistered`].
    EventRegistered,
    /// See [`Notification::ServerShutdown`].
    ServerShutdown,
    /// See [`Notification::Error`].
    Error,
}

impl Notification {
    /// Kind of this notification.
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Connected => NotificationKind::Connected,
            Notification::Disconnected => NotificationKind::Disconnected,
            Notification::RecordingStarted { .. } => NotificationKind::RecordingStarted,
            Notification::RecordingStopped { .. } => NotificationKind::RecordingStopped,
            Notification::SettingsChanged(_) => NotificationKind::SettingsChanged,
            Notification::EventRegistered => NotificationKind::EventRegistered,
            Notification::ServerShutdown { .. } => NotificationKind::ServerShutdown,
            Notification::Error { .. } => NotificationKind::Error,
        }
    }

    pub(crate) fn error(class: ErrorClass, message: impl Into<String>) -> Self {
        Notification::Error {
            class,
            message: message.into(),
        }
    }
}
