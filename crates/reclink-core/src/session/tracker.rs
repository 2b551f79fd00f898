//! Client-side view of the recorder's capture state.
//!
//! The protocol has no request identifiers, so confirmations are matched to
//! commands only by recording id and arrival order.

use crate::{
    ClientError, CoreResult,
    events::Notification,
    protocol::{Inbound, Outbound},
    session::SettingsSnapshot,
};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{debug, info};

/// The capture the client currently believes is active, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSession {
    /// Identifier from the last unmatched `recording_started`.
    pub current_recording_id: Option<String>,
}

/// Builds session commands and reconciles server confirmations.
///
/// Owned by the connection manager; only ever touched from its task.
#[derive(Debug, Default)]
pub(crate) struct SessionTracker {
    session: RecordingSession,
    settings: SettingsSnapshot,
}

impl SessionTracker {
    pub(crate) fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub(crate) fn settings(&self) -> &SettingsSnapshot {
        &self.settings
    }

    /// Validates a start request against connection state and cached settings.
    #[track_caller]
    pub(crate) fn start_command(&self, connected: bool, event_id: &str) -> CoreResult<Outbound> {
        if !connected {
            return Err(ClientError::not_connected());
        }

        if !self.settings.auto_record_enabled {
            return Err(ClientError::AutoRecordDisabled {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Outbound::StartRecording {
            event_id: event_id.to_string(),
        })
    }

    #[track_caller]
    pub(crate) fn stop_command(&self, connected: bool, recording_id: &str) -> CoreResult<Outbound> {
        if !connected {
            return Err(ClientError::not_connected());
        }

        if recording_id.is_empty() {
            return Err(ClientError::empty("recording_id"));
        }

        Ok(Outbound::StopRecording {
            recording_id: recording_id.to_string(),
        })
    }

    #[track_caller]
    pub(crate) fn register_command(
        &self,
        connected: bool,
        event_id: &str,
        event_name: &str,
    ) -> CoreResult<Outbound> {
        if !connected {
            return Err(ClientError::not_connected());
        }

        if event_id.is_empty() {
            return Err(ClientError::empty("event_id"));
        }

        if event_name.is_empty() {
            return Err(ClientError::empty("event_name"));
        }

        Ok(Outbound::RegisterEvent {
            event_id: event_id.to_string(),
            event_name: event_name.to_string(),
        })
    }

    /// Folds a session-related server message into local state.
    ///
    /// Returns the notification to forward, or `None` for messages this
    /// tracker does not own.
    pub(crate) fn apply(&mut self, message: Inbound) -> Option<Notification> {
        match message {
            Inbound::Settings(settings) => {
                info!(
                    auto_record_enabled = settings.auto_record_enabled,
                    max_duration_seconds = settings.max_duration_seconds,
                    quality = %settings.quality,
                    "Settings updated"
                );
                self.settings = settings.clone();
                Some(Notification::SettingsChanged(settings))
            }
            Inbound::RecordingStarted { recording_id } => {
                info!(recording_id = %recording_id, "Recording started");
                self.session.current_recording_id = Some(recording_id.clone());
                Some(Notification::RecordingStarted { recording_id })
            }
            Inbound::RecordingStopped {
                recording_id,
                file_path,
                duration,
                file_size,
            } => {
                if self.session.current_recording_id.as_deref() == Some(recording_id.as_str()) {
                    self.session.current_recording_id = None;
                    info!(recording_id = %recording_id, file_path = %file_path, "Recording stopped");
                } else {
                    debug!(
                        recording_id = %recording_id,
                        current = ?self.session.current_recording_id,
                        "Stop confirmation for a recording that is not current"
                    );
                }
                Some(Notification::RecordingStopped {
                    recording_id,
                    file_path,
                    duration,
                    file_size,
                })
            }
            Inbound::EventRegistered => Some(Notification::EventRegistered),
            Inbound::Pong | Inbound::ServerShutdown { .. } | Inbound::Error { .. } => None,
        }
    }

    /// Forgets the active recording. Called on every transition out of Connected.
    pub(crate) fn clear(&mut self) {
        if let Some(recording_id) = self.session.current_recording_id.take() {
            debug!(recording_id = %recording_id, "Cleared active recording");
        }
    }
}
