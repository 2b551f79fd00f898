use std::{fmt, panic::Location};

use error_location::ErrorLocation;
use thiserror::Error;

/// Broad error class reported alongside `Error` notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Transport failed to open, send or close.
    Connection,
    /// Inbound frame could not be decoded.
    Protocol,
    /// Caller invoked an operation whose precondition is unmet.
    State,
    /// The peer pushed an explicit error frame.
    Server,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::Connection => "connection",
            ErrorClass::Protocol => "protocol",
            ErrorClass::State => "state",
            ErrorClass::Server => "server",
        };
        f.write_str(name)
    }
}

/// Wire protocol errors with source location tracking.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame is not a JSON object.
    #[error("Invalid frame: {reason} {location}")]
    InvalidFrame {
        /// Parser diagnostic.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Frame has no string `type` discriminator.
    #[error("Frame has no message type {location}")]
    MissingKind {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Frame carries a discriminator this client does not understand.
    #[error("Unknown message type: {kind} {location}")]
    UnknownKind {
        /// The unrecognized discriminator.
        kind: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Known discriminator with a payload that does not match its shape.
    #[error("Malformed {kind} message: {reason} {location}")]
    Malformed {
        /// Discriminator of the offending frame.
        kind: String,
        /// Deserializer diagnostic.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Outbound message could not be serialized.
    #[error("Failed to encode message: {reason} {location}")]
    Encode {
        /// Serializer diagnostic.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Errors surfaced by the recorder client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failed to open, send or close.
    #[error("Connection error: {reason} {location}")]
    ConnectionFailed {
        /// Description of the transport failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Protocol codec error.
    #[error("Protocol error: {source} {location}")]
    Protocol {
        /// The underlying codec error.
        #[source]
        source: ProtocolError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Operation requires a live connection.
    #[error("Not connected to recorder {location}")]
    NotConnected {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The server settings have auto-record turned off.
    #[error("Auto-record is disabled by server settings {location}")]
    AutoRecordDisabled {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A required identifier argument was empty.
    #[error("Empty {field} {location}")]
    EmptyIdentifier {
        /// Name of the empty argument.
        field: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The peer reported an error.
    #[error("Server error: {message} {location}")]
    Server {
        /// Verbatim message from the peer.
        message: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The connection task has stopped and no longer accepts commands.
    #[error("Recorder client is shut down {location}")]
    ClientClosed {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl ClientError {
    /// Taxonomy class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            ClientError::ConnectionFailed { .. } | ClientError::ClientClosed { .. } => {
                ErrorClass::Connection
            }
            ClientError::Protocol { .. } => ErrorClass::Protocol,
            ClientError::NotConnected { .. }
            | ClientError::AutoRecordDisabled { .. }
            | ClientError::EmptyIdentifier { .. } => ErrorClass::State,
            ClientError::Server { .. } => ErrorClass::Server,
        }
    }

    #[track_caller]
    pub(crate) fn connection(reason: impl Into<String>) -> Self {
        ClientError::ConnectionFailed {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn not_connected() -> Self {
        ClientError::NotConnected {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn empty(field: &'static str) -> Self {
        ClientError::EmptyIdentifier {
            field,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn closed() -> Self {
        ClientError::ClientClosed {
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

// Manual From<ProtocolError> with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<ProtocolError> for ClientError {
    #[track_caller]
    fn from(source: ProtocolError) -> Self {
        ClientError::Protocol {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;
