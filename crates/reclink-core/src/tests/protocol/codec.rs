use crate::{
    ProtocolError, SettingsSnapshot,
    protocol::{Inbound, Outbound, codec},
};

/// WHAT: start_recording nests the event id under metadata
/// WHY: The recorder reads `metadata.event_id`, not a top-level field
#[test]
#[allow(clippy::unwrap_used)]
fn given_start_command_when_encoding_then_event_id_is_nested_in_metadata() {
    // Given: A start command and a fixed timestamp
    let message = Outbound::StartRecording {
        event_id: "boss_fight".to_string(),
    };

    // When: Encoding it
    let frame = codec::encode_at(&message, 1.5).unwrap();

    // Then: Output is the exact deterministic frame
    assert_eq!(
        frame,
        r#"{"type":"start_recording","timestamp":1.5,"metadata":{"event_id":"boss_fight"}}"#
    );
}

/// WHAT: Every outbound kind carries its discriminator and timestamp
/// WHY: The recorder dispatches on `type` and logs `timestamp`
#[test]
#[allow(clippy::unwrap_used)]
fn given_each_outbound_kind_when_encoding_then_type_and_timestamp_present() {
    // Given: One message of every outbound kind
    let messages = [
        Outbound::StopRecording {
            recording_id: "rec-1".to_string(),
        },
        Outbound::RegisterEvent {
            event_id: "e1".to_string(),
            event_name: "Boss Fight".to_string(),
        },
        Outbound::GetSettings,
        Outbound::Ping,
    ];

    for message in &messages {
        // When: Encoding
        let frame = codec::encode_at(message, 42.0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();

        // Then: Discriminator matches and timestamp is stamped
        assert_eq!(value["type"], message.kind());
        assert_eq!(value["timestamp"], 42.0);
    }

    let frame = codec::encode_at(&messages[1], 0.0).unwrap();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["event_id"], "e1");
    assert_eq!(value["event_name"], "Boss Fight");
}

/// WHAT: Settings frames map onto the settings snapshot
/// WHY: Wire names differ from the snapshot's field names
#[test]
#[allow(clippy::unwrap_used)]
fn given_settings_frame_when_decoding_then_snapshot_fields_mapped() {
    // Given: A full settings frame
    let frame = r#"{"type":"settings","auto_record_enabled":false,"max_recording_duration":120,"video_quality":"medium"}"#;

    // When: Decoding
    let message = codec::decode(frame).unwrap();

    // Then: All three fields land in the snapshot
    assert_eq!(
        message,
        Inbound::Settings(SettingsSnapshot {
            auto_record_enabled: false,
            max_duration_seconds: 120,
            quality: "medium".to_string(),
        })
    );
}

/// WHAT: Missing settings fields fall back to defaults
/// WHY: Each settings frame replaces the snapshot wholesale
#[test]
#[allow(clippy::unwrap_used)]
fn given_partial_settings_frame_when_decoding_then_missing_fields_defaulted() {
    // Given: A settings frame with only one field
    let frame = r#"{"type":"settings","video_quality":"low"}"#;

    // When: Decoding
    let message = codec::decode(frame).unwrap();

    // Then: Other fields take default values
    let Inbound::Settings(settings) = message else {
        unreachable!("expected settings, got {message:?}");
    };
    assert_eq!(settings.quality, "low");
    assert_eq!(
        settings.auto_record_enabled,
        SettingsSnapshot::default().auto_record_enabled
    );
    assert_eq!(
        settings.max_duration_seconds,
        SettingsSnapshot::default().max_duration_seconds
    );
}

/// WHAT: recording_stopped carries file details and ignores extra fields
/// WHY: Newer recorders may add fields old clients must tolerate
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_stopped_with_extra_fields_when_decoding_then_known_fields_kept() {
    // Given: A stop confirmation with an extra field
    let frame = r#"{"type":"recording_stopped","recording_id":"rec-9","file_path":"/tmp/a.mp4","duration":12.5,"file_size":2048,"codec":"h264"}"#;

    // When: Decoding
    let message = codec::decode(frame).unwrap();

    // Then: Known fields are decoded
    assert_eq!(
        message,
        Inbound::RecordingStopped {
            recording_id: "rec-9".to_string(),
            file_path: "/tmp/a.mp4".to_string(),
            duration: 12.5,
            file_size: 2048,
        }
    );
}

/// WHAT: Payload-free and simple inbound kinds decode
/// WHY: Acknowledgments and keep-alives carry no payload
#[test]
#[allow(clippy::unwrap_used)]
fn given_simple_frames_when_decoding_then_variants_returned() {
    assert_eq!(
        codec::decode(r#"{"type":"event_registered"}"#).unwrap(),
        Inbound::EventRegistered
    );
    assert_eq!(codec::decode(r#"{"type":"pong"}"#).unwrap(), Inbound::Pong);
    assert_eq!(
        codec::decode(r#"{"type":"server_shutdown","reconnect_delay_ms":5000}"#).unwrap(),
        Inbound::ServerShutdown {
            reconnect_delay_ms: 5000
        }
    );
    assert_eq!(
        codec::decode(r#"{"type":"error","message":"disk full"}"#).unwrap(),
        Inbound::Error {
            message: "disk full".to_string()
        }
    );
    assert_eq!(
        codec::decode(r#"{"type":"recording_started","recording_id":"rec-1"}"#).unwrap(),
        Inbound::RecordingStarted {
            recording_id: "rec-1".to_string()
        }
    );
}

/// WHAT: Unknown discriminators map to UnknownKind
/// WHY: Old clients must skip messages they do not understand
#[test]
fn given_unknown_type_when_decoding_then_unknown_kind_error() {
    // Given/When: A frame with an unrecognized type
    let result = codec::decode(r#"{"type":"thumbnail_ready","id":3}"#);

    // Then: UnknownKind names the type
    assert!(matches!(
        result,
        Err(ProtocolError::UnknownKind { ref kind, .. }) if kind == "thumbnail_ready"
    ));
}

/// WHAT: Frames without a string type are rejected
/// WHY: The discriminator is mandatory
#[test]
fn given_frame_without_type_when_decoding_then_missing_kind_error() {
    assert!(matches!(
        codec::decode(r#"{"recording_id":"rec-1"}"#),
        Err(ProtocolError::MissingKind { .. })
    ));
    assert!(matches!(
        codec::decode(r#"{"type":7}"#),
        Err(ProtocolError::MissingKind { .. })
    ));
}

/// WHAT: Non-JSON and non-object frames are rejected without panicking
/// WHY: A malformed frame must never take the client down
#[test]
fn given_garbage_frames_when_decoding_then_invalid_frame_error() {
    for frame in ["not json", "", "[1,2,3]", "\"settings\"", "{\"type\":"] {
        assert!(
            matches!(codec::decode(frame), Err(ProtocolError::InvalidFrame { .. })),
            "frame {frame:?} should be invalid"
        );
    }
}

/// WHAT: Known type with a bad payload maps to Malformed
/// WHY: Distinguishes broken peers from newer protocol versions
#[test]
fn given_known_type_with_bad_payload_when_decoding_then_malformed_error() {
    // Given: recording_started without its id, and settings with a wrong type
    let missing_id = codec::decode(r#"{"type":"recording_started"}"#);
    let wrong_type = codec::decode(r#"{"type":"settings","auto_record_enabled":"yes"}"#);

    // Then: Both are Malformed and name the kind
    assert!(matches!(
        missing_id,
        Err(ProtocolError::Malformed { ref kind, .. }) if kind == "recording_started"
    ));
    assert!(matches!(
        wrong_type,
        Err(ProtocolError::Malformed { ref kind, .. }) if kind == "settings"
    ));
}

/// WHAT: Whole numbers sent as floats decode into the integer fields
/// WHY: JSON peers often write counts as `300.0`; dropping those frames loses state
#[test]
#[allow(clippy::unwrap_used)]
fn given_float_valued_counts_when_decoding_then_integers_accepted() {
    // Given: settings, recording_stopped and server_shutdown with float counts
    let settings = r#"{"type":"settings","auto_record_enabled":false,"max_recording_duration":300.0,"video_quality":"high"}"#;
    let stopped = r#"{"type":"recording_stopped","recording_id":"r","file_path":"/a","duration":3.0,"file_size":1024.0}"#;
    let shutdown = r#"{"type":"server_shutdown","reconnect_delay_ms":5000.0}"#;

    // When/Then: Each decodes with the integer value
    assert_eq!(
        codec::decode(settings).unwrap(),
        Inbound::Settings(SettingsSnapshot {
            auto_record_enabled: false,
            max_duration_seconds: 300,
            quality: "high".to_string(),
        })
    );
    assert_eq!(
        codec::decode(stopped).unwrap(),
        Inbound::RecordingStopped {
            recording_id: "r".to_string(),
            file_path: "/a".to_string(),
            duration: 3.0,
            file_size: 1024,
        }
    );
    assert_eq!(
        codec::decode(shutdown).unwrap(),
        Inbound::ServerShutdown {
            reconnect_delay_ms: 5_000
        }
    );
}

/// WHAT: Negative counts are still malformed
/// WHY: A size or delay below zero has no meaning
#[test]
fn given_negative_counts_when_decoding_then_malformed() {
    assert!(matches!(
        codec::decode(r#"{"type":"server_shutdown","reconnect_delay_ms":-1}"#),
        Err(ProtocolError::Malformed { ref kind, .. }) if kind == "server_shutdown"
    ));
    assert!(matches!(
        codec::decode(r#"{"type":"recording_stopped","recording_id":"r","file_size":-2.5}"#),
        Err(ProtocolError::Malformed { ref kind, .. }) if kind == "recording_stopped"
    ));
}
