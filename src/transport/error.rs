//! Transport-level error types.

use std::time::Duration;

use thiserror::Error;

/// Failure reported by a [`super::Transport`] implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No device is attached.
    #[error("device not connected")]
    Disconnected,

    /// The device did not accept the data in time.
    #[error("transmit timed out after {0:?}")]
    Timeout(Duration),

    /// Underlying I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
