//! Framing and message error types

use thiserror::Error;

/// Framing codec errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Too short, or not delimited by flag bytes
    #[error("invalid frame")]
    InvalidFrame,

    /// Escape byte with nothing after it
    #[error("invalid escape sequence")]
    InvalidEscapeSequence,

    /// Checksum mismatch
    #[error("CRC mismatch: expected {expected:#06x}, got {found:#06x}")]
    CrcMismatch {
        /// CRC computed over the received payload
        expected: u16,
        /// CRC carried by the frame
        found: u16,
    },
}

/// Reason a frame was not accepted as a message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidMessage {
    /// Framing layer rejected the bytes
    #[error("framing: {0}")]
    Frame(#[from] FrameError),

    /// Payload shorter than the smallest header
    #[error("payload too short: {len} bytes")]
    TooShort {
        /// Unwrapped payload length
        len: usize,
    },

    /// First two bytes are not the message class tag
    #[error("bad class tag: {found:02x?}")]
    BadClassTag {
        /// Bytes found instead of the class tag
        found: [u8; 2],
    },

    /// Header ran past the end of the payload
    #[error("header truncated")]
    Truncated,

    /// Declared size disagrees with the bytes present
    #[error("size mismatch: header declares {declared} bytes, {actual} present")]
    SizeMismatch {
        /// Size field from the header
        declared: u16,
        /// Bytes remaining after the header
        actual: usize,
    },

    /// State record too short for the configured field layout
    #[error("state record too short: {len} bytes, layout needs {needed}")]
    StateTooShort {
        /// Record length
        len: usize,
        /// Minimum length required by the layout
        needed: usize,
    },
}

/// Message parser errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Bytes do not form a valid message
    #[error("invalid message: {0}")]
    InvalidMessage(InvalidMessage),
}

impl From<InvalidMessage> for ProtocolError {
    fn from(reason: InvalidMessage) -> Self {
        Self::InvalidMessage(reason)
    }
}

impl From<FrameError> for ProtocolError {
    fn from(err: FrameError) -> Self {
        Self::InvalidMessage(InvalidMessage::Frame(err))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ProtocolError>;
