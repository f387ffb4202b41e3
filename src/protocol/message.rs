//! Inbound message parsing

use bytes::Bytes;

use super::hdlc::unwrap_frame;
use super::{DeviceState, Header, MessageType, Result, StateLayout};

/// Message received from the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Handshake acknowledgement
    Hello(Header),
    /// Full state report
    StateUpdate {
        /// Message header
        header: Header,
        /// Decoded state
        state: DeviceState,
    },
    /// Valid message of a type the controller ignores
    Unknown(Header),
}

impl Message {
    /// Get header
    #[must_use]
    pub const fn header(&self) -> &Header {
        match self {
            Self::Hello(header) | Self::Unknown(header) | Self::StateUpdate { header, .. } => {
                header
            }
        }
    }

    /// Get message type
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.header().message_type()
    }

    /// Parse a complete frame, locating state fields with `layout`
    pub fn parse(frame: &[u8], layout: StateLayout) -> Result<Self> {
        let payload = unwrap_frame(frame)?;
        Self::from_payload(Bytes::from(payload), layout)
    }

    /// Parse an already unwrapped payload
    pub fn from_payload(payload: Bytes, layout: StateLayout) -> Result<Self> {
        let (header, body_start) = Header::parse(&payload)?;

        match header.message_type() {
            MessageType::Hello => Ok(Self::Hello(header)),
            MessageType::Unknown => Ok(Self::Unknown(header)),
            MessageType::StateUpdate => {
                let state = DeviceState::from_raw(payload.slice(body_start..), layout)?;
                Ok(Self::StateUpdate { header, state })
            }
        }
    }
}
