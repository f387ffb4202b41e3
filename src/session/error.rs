//! Session error types

use thiserror::Error;

use super::ConnectionState;
use crate::protocol::ProtocolError;
use crate::transport::TransportError;

/// Reasons a command was refused before anything was sent
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandRejected {
    /// Handshake not finished
    #[error("session not ready: {state}")]
    NotReady {
        /// Connection state at the time of the call
        state: ConnectionState,
    },

    /// Preset index outside the device's range
    #[error("invalid preset index {preset} (device has {count})")]
    InvalidPresetIndex {
        /// Requested preset
        preset: u8,
        /// Number of presets on the device
        count: u8,
    },
}

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Command refused locally
    #[error("command rejected: {0}")]
    Rejected(#[from] CommandRejected),

    /// Send failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Received frame was not a valid message
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Handshake did not reach the awaited state in time
    #[error("handshake timed out in state {reached} waiting for {target}")]
    HandshakeTimeout {
        /// State at timeout
        reached: ConnectionState,
        /// State being waited for
        target: ConnectionState,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SessionError>;
