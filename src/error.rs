//! Error types for the meshtastic client.

use thiserror::Error;

use crate::proto::routing;

/// Routing outcome code reported by the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingReason {
    /// A code from the known set; `Known(routing::Error::None)` is an ack.
    Known(routing::Error),
    /// A code this client does not recognise, kept as sent.
    Unknown(i32),
}

impl RoutingReason {
    /// Interprets a raw routing error code.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        routing::Error::try_from(code).map_or(Self::Unknown(code), Self::Known)
    }

    /// Returns true for a successful acknowledgement.
    #[must_use]
    pub fn is_ack(self) -> bool {
        self == Self::Known(routing::Error::None)
    }
}

impl From<routing::Error> for RoutingReason {
    fn from(reason: routing::Error) -> Self {
        Self::Known(reason)
    }
}

/// The main error type for meshtastic client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Bluetooth stack error.
    #[cfg(feature = "ble")]
    #[error("bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame encoding/decoding error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The transport could not be established.
    #[error("failed to connect transport: {reason}")]
    TransportConnect { reason: String },

    /// The transport failed after it was established.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,

    /// The configuration handshake has not completed.
    #[error("connected node not ready")]
    NotReady,

    /// Operation timed out.
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// No acknowledgement arrived for a packet sent with `want_ack`.
    #[error("no acknowledgement for packet {packet_id} after {timeout_ms}ms")]
    AckTimeout { packet_id: u32, timeout_ms: u64 },

    /// A pending request was invalidated by a disconnect or fault.
    #[error("connection lost")]
    ConnectionLost,

    /// The mesh reported a routing error for a sent packet.
    #[error("routing error for packet {packet_id}: {reason:?}")]
    Routing {
        packet_id: u32,
        reason: RoutingReason,
    },

    /// The transport refused the write after all retries.
    #[error("failed to write to transport")]
    SendFailed,

    /// Application payload exceeds what fits in one mesh packet.
    #[error("payload too large: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// Feature is not available in this build or for this transport.
    #[error("unsupported: {reason}")]
    Unsupported { reason: String },
}

impl Error {
    pub(crate) fn timeout(timeout: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_ms: millis(timeout),
        }
    }
}

/// Frame-specific errors.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Stream header announced a payload larger than the protocol allows.
    #[error("frame too large: {size} bytes exceeds maximum {max}")]
    TooLarge { size: usize, max: usize },

    /// Frame payload is not a valid protobuf message.
    #[error("malformed frame: {0}")]
    Malformed(#[from] prost::DecodeError),
}

/// Result type alias for meshtastic client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Converts a duration to whole milliseconds for error reporting.
pub(crate) fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
