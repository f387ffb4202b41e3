//! Message header
//!
//! Every message from the device starts with the class tag followed by three
//! tagged values.

use super::value::ValueReader;
use super::{CLASS_TAG, InvalidMessage, MIN_PAYLOAD_SIZE, MessageType};

/// Message header
///
/// # Wire Format
///
/// ```text
/// +------+------+-----------+-----------+-----------+---------------
/// | 0xB9 | 0x03 | type (v)  | size (v)  | unknown(v)|  body (size)
/// +------+------+-----------+-----------+-----------+---------------
/// ```
///
/// `(v)` fields use the tagged value encoding from [`super::value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    msg_type: MessageType,
    type_value: u16,
    size: u16,
    unknown: u16,
}

impl Header {
    /// Create a new header
    #[must_use]
    pub const fn new(type_value: u16, size: u16, unknown: u16) -> Self {
        Self {
            msg_type: MessageType::from_value(type_value),
            type_value,
            size,
            unknown,
        }
    }

    /// Get message type
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.msg_type
    }

    /// Get the raw type value
    #[must_use]
    pub const fn type_value(&self) -> u16 {
        self.type_value
    }

    /// Get declared body size
    #[must_use]
    pub const fn size(&self) -> u16 {
        self.size
    }

    /// Get the reserved field
    #[must_use]
    pub const fn unknown(&self) -> u16 {
        self.unknown
    }

    /// Parse a header from an unwrapped payload.
    ///
    /// Returns the header and the offset of the first body byte. The size
    /// field is checked against the bytes remaining after the header.
    pub fn parse(payload: &[u8]) -> Result<(Self, usize), InvalidMessage> {
        if payload.len() < MIN_PAYLOAD_SIZE {
            return Err(InvalidMessage::TooShort { len: payload.len() });
        }
        if payload[..2] != CLASS_TAG {
            return Err(InvalidMessage::BadClassTag {
                found: [payload[0], payload[1]],
            });
        }

        let mut reader = ValueReader::new(payload, CLASS_TAG.len());
        let type_value = reader.next_value().ok_or(InvalidMessage::Truncated)?;
        let size = reader.next_value().ok_or(InvalidMessage::Truncated)?;
        let unknown = reader.next_value().ok_or(InvalidMessage::Truncated)?;

        let actual = reader.remaining().len();
        if actual != usize::from(size) {
            return Err(InvalidMessage::SizeMismatch {
                declared: size,
                actual,
            });
        }

        Ok((Self::new(type_value, size, unknown), reader.position()))
    }
}
