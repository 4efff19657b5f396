/// Typed errors for the radar link protocol layer
use thiserror::Error;

/// Result type alias for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Inbound line could not be turned into device state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed line (expected prefix {expected:?}): {line:?}")]
    MalformedPrefix { expected: &'static str, line: String },

    #[error("Missing required field: {field}")]
    MissingRequiredField { field: &'static str },

    #[error("Invalid value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Intent rejected before any command was built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Ping count must be a positive integer (got {count})")]
    InvalidCount { count: u32 },

    #[error("{field} contains a character the line protocol cannot carry: {ch:?}")]
    UnsafeValue { field: &'static str, ch: char },
}

/// Command sequence could not be handed to the transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Serial link is not connected")]
    NotConnected,

    #[error("Failed to send {command:?}: {reason}")]
    SendFailed { command: String, reason: String },
}

/// Any failure surfaced by the protocol layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Transport link could not be opened
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Timed out connecting to {endpoint}")]
    Timeout { endpoint: String },

    #[error("Failed to open {endpoint}: {source}")]
    Open {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
}
