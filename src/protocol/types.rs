//! Message types and device slots

use std::fmt;

/// Message types distinguished by the header's type value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageType {
    /// Anything the controller does not interpret
    Unknown,
    /// Handshake acknowledgement
    Hello,
    /// Full device state report
    StateUpdate,
}

impl MessageType {
    /// Raw type value for [`MessageType::Hello`]
    pub const HELLO_VALUE: u16 = 0x02;
    /// Raw type value for [`MessageType::StateUpdate`]
    pub const STATE_UPDATE_VALUE: u16 = 0x0306;

    /// Classify a decoded type value
    #[must_use]
    pub const fn from_value(value: u16) -> Self {
        match value {
            Self::HELLO_VALUE => Self::Hello,
            Self::STATE_UPDATE_VALUE => Self::StateUpdate,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "Unknown",
            Self::Hello => "Hello",
            Self::StateUpdate => "StateUpdate",
        };
        write!(f, "{name}")
    }
}

/// Device preset slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Slot {
    /// Slot A
    #[default]
    A = 0,
    /// Slot B
    B = 1,
    /// Slot C
    C = 2,
}

impl Slot {
    /// All slots in wire order
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    /// Convert from wire byte
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            _ => None,
        }
    }

    /// Convert to wire byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// The background slot when `self` is active. Only A and B take part,
    /// so C resolves to A.
    #[must_use]
    pub const fn inactive_sibling(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B | Self::C => Self::A,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        };
        write!(f, "{name}")
    }
}
