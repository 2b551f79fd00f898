//! JSON text codec for the recorder wire protocol.
//!
//! Every frame is a JSON object with a `type` discriminator. Outbound frames
//! also carry a `timestamp` (Unix seconds) used only for diagnostics.

use crate::{
    error::ProtocolError,
    protocol::{Inbound, Outbound},
    session::{
        SettingsSnapshot,
        settings::{DEFAULT_AUTO_RECORD_ENABLED, DEFAULT_MAX_DURATION_SECONDS, DEFAULT_QUALITY},
    },
};

use std::{
    panic::Location,
    time::{SystemTime, UNIX_EPOCH},
};

use error_location::ErrorLocation;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::{Number, Value};

const INBOUND_KINDS: &[&str] = &[
    "settings",
    "recording_started",
    "recording_stopped",
    "event_registered",
    "pong",
    "server_shutdown",
    "error",
];

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireOutbound<'a> {
    StartRecording {
        timestamp: f64,
        metadata: StartMetadata<'a>,
    },
    StopRecording {
        timestamp: f64,
        recording_id: &'a str,
    },
    RegisterEvent {
        timestamp: f64,
        event_id: &'a str,
        event_name: &'a str,
    },
    GetSettings {
        timestamp: f64,
    },
    Ping {
        timestamp: f64,
    },
}

#[derive(Serialize)]
struct StartMetadata<'a> {
    event_id: &'a str,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireInbound {
    Settings {
        #[serde(default = "default_auto_record_enabled")]
        auto_record_enabled: bool,
        #[serde(
            default = "default_max_recording_duration",
            deserialize_with = "whole_number"
        )]
        max_recording_duration: u64,
        #[serde(default = "default_video_quality")]
        video_quality: String,
    },
    RecordingStarted {
        recording_id: String,
    },
    RecordingStopped {
        recording_id: String,
        #[serde(default)]
        file_path: String,
        #[serde(default)]
        duration: f64,
        #[serde(default, deserialize_with = "whole_number")]
        file_size: u64,
    },
    EventRegistered,
    Pong,
    ServerShutdown {
        #[serde(deserialize_with = "whole_number")]
        reconnect_delay_ms: u64,
    },
    Error {
        message: String,
    },
}

/// Counts may arrive as `300` or `300.0`; anything non-negative and finite is
/// accepted, fractions truncated.
fn whole_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    if let Some(value) = number.as_u64() {
        return Ok(value);
    }

    match number.as_f64() {
        Some(value) if value.is_finite() && value >= 0.0 && value <= u64::MAX as f64 => {
            Ok(value as u64)
        }
        _ => Err(D::Error::custom(format!(
            "expected a non-negative number, got {number}"
        ))),
    }
}

fn default_auto_record_enabled() -> bool {
    DEFAULT_AUTO_RECORD_ENABLED
}

fn default_max_recording_duration() -> u64 {
    DEFAULT_MAX_DURATION_SECONDS
}

fn default_video_quality() -> String {
    DEFAULT_QUALITY.to_string()
}

impl From<WireInbound> for Inbound {
    fn from(wire: WireInbound) -> Self {
        match wire {
            WireInbound::Settings {
                auto_record_enabled,
                max_recording_duration,
                video_quality,
            } => Inbound::Settings(SettingsSnapshot {
                auto_record_enabled,
                max_duration_seconds: max_recording_duration,
                quality: video_quality,
            }),
            WireInbound::RecordingStarted { recording_id } => {
                Inbound::RecordingStarted { recording_id }
            }
            WireInbound::RecordingStopped {
                recording_id,
                file_path,
                duration,
                file_size,
            } => Inbound::RecordingStopped {
                recording_id,
                file_path,
                duration,
                file_size,
            },
            WireInbound::EventRegistered => Inbound::EventRegistered,
            WireInbound::Pong => Inbound::Pong,
            WireInbound::ServerShutdown { reconnect_delay_ms } => {
                Inbound::ServerShutdown { reconnect_delay_ms }
            }
            WireInbound::Error { message } => Inbound::Error { message },
        }
    }
}

/// Encodes an outbound message stamped with the current wall-clock time.
#[track_caller]
pub fn encode(message: &Outbound) -> Result<String, ProtocolError> {
    encode_at(message, unix_now())
}

/// Encodes an outbound message with an explicit send timestamp.
///
/// Output is deterministic for a given message and timestamp.
#[track_caller]
pub fn encode_at(message: &Outbound, timestamp: f64) -> Result<String, ProtocolError> {
    let wire = match message {
        Outbound::StartRecording { event_id } => WireOutbound::StartRecording {
            timestamp,
            metadata: StartMetadata { event_id },
        },
        Outbound::StopRecording { recording_id } => WireOutbound::StopRecording {
            timestamp,
            recording_id,
        },
        Outbound::RegisterEvent {
            event_id,
            event_name,
        } => WireOutbound::RegisterEvent {
            timestamp,
            event_id,
            event_name,
        },
        Outbound::GetSettings => WireOutbound::GetSettings { timestamp },
        Outbound::Ping => WireOutbound::Ping { timestamp },
    };

    serde_json::to_string(&wire).map_err(|e| ProtocolError::Encode {
        reason: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Decodes one inbound text frame.
///
/// Never panics on hostile input. Unrecognized discriminators yield
/// [`ProtocolError::UnknownKind`] so callers can skip them quietly.
#[track_caller]
pub fn decode(frame: &str) -> Result<Inbound, ProtocolError> {
    let value: Value = serde_json::from_str(frame).map_err(|e| ProtocolError::InvalidFrame {
        reason: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let Value::Object(ref object) = value else {
        return Err(ProtocolError::InvalidFrame {
            reason: "frame is not a JSON object".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    };

    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ProtocolError::MissingKind {
            location: ErrorLocation::from(Location::caller()),
        })?
        .to_string();

    if !INBOUND_KINDS.contains(&kind.as_str()) {
        return Err(ProtocolError::UnknownKind {
            kind,
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let wire: WireInbound = serde_json::from_value(value).map_err(|e| ProtocolError::Malformed {
        kind,
        reason: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    Ok(wire.into())
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
