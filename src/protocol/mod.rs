//! Device protocol core
//!
//! This module provides the frame codec, the tagged value encoding, message
//! parsing and command payload construction.

pub mod command;
mod error;
pub mod hdlc;
mod header;
mod message;
mod state;
mod types;
pub mod value;

pub use error::{FrameError, InvalidMessage, ProtocolError, Result};
pub use hdlc::{crc16, unwrap_frame, wrap_frame};
pub use header::Header;
pub use message::Message;
pub use state::{DeviceState, StateField, StateLayout};
pub use types::{MessageType, Slot};
pub use value::read_value;

/// Frame boundary flag
pub const FRAME_FLAG: u8 = 0x7E;

/// Escape prefix inside a frame body
pub const FRAME_ESCAPE: u8 = 0x7D;

/// Smallest well-formed frame: two flags and two CRC bytes
pub const MIN_FRAME_SIZE: usize = 4;

/// Message class tag leading every payload
pub const CLASS_TAG: [u8; 2] = [0xB9, 0x03];

/// Smallest payload that can carry a header
pub const MIN_PAYLOAD_SIZE: usize = 5;
