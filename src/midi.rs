//! MIDI Program Change input.
//!
//! Scans raw bytes from a MIDI UART for Program Change messages and turns
//! them into slot switches.

use tracing::{debug, warn};

use crate::protocol::Slot;
use crate::session::Session;
use crate::transport::Transport;

const PROGRAM_CHANGE: u8 = 0xC0;
const STATUS_MASK: u8 = 0xF0;
const CHANNEL_MASK: u8 = 0x0F;
const STATUS_BIT: u8 = 0x80;
const REAL_TIME_START: u8 = 0xF8;

/// A decoded Program Change message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgramChange {
    /// Zero-based channel (0-15)
    pub channel: u8,
    /// Program number (0-127)
    pub program: u8,
}

/// Extract every Program Change from `buffer`.
///
/// Real-time bytes are skipped wherever they appear, including between a
/// Program Change status and its data byte. Other status bytes are skipped
/// together with their data bytes. A Program Change interrupted by another
/// status byte is dropped and scanning resumes at that status byte. One whose
/// data byte never arrives ends the scan.
#[must_use]
pub fn parse_program_changes(buffer: &[u8]) -> Vec<ProgramChange> {
    let mut changes = Vec::new();
    let mut i = 0;

    while i < buffer.len() {
        let byte = buffer[i];

        if byte >= REAL_TIME_START {
            i += 1;
            continue;
        }

        if byte & STATUS_MASK == PROGRAM_CHANGE {
            let mut data = i + 1;
            while buffer.get(data).is_some_and(|&b| b >= REAL_TIME_START) {
                data += 1;
            }
            let Some(&program) = buffer.get(data) else {
                warn!("incomplete program change at end of buffer");
                break;
            };
            if program & STATUS_BIT != 0 {
                warn!(status = program, "program change interrupted by status byte");
                i = data;
                continue;
            }
            let change = ProgramChange {
                channel: byte & CHANNEL_MASK,
                program,
            };
            debug!(channel = change.channel, program, "program change");
            changes.push(change);
            i = data + 1;
        } else if byte & STATUS_BIT != 0 {
            i += 1;
            while i < buffer.len() && buffer[i] & STATUS_BIT == 0 {
                i += 1;
            }
        } else {
            i += 1;
        }
    }

    changes
}

/// Maps Program Changes on one channel to A/B slot switches.
///
/// `target_program` selects slot B; any other program selects slot A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FootswitchMapping {
    /// Zero-based channel to listen on
    pub channel: u8,
    /// Program that selects slot B
    pub target_program: u8,
}

impl Default for FootswitchMapping {
    fn default() -> Self {
        Self {
            channel: 2,
            target_program: 1,
        }
    }
}

impl FootswitchMapping {
    /// Slot to activate for `change`, or `None` if it is on another channel.
    #[must_use]
    pub const fn slot_for(&self, change: ProgramChange) -> Option<Slot> {
        if change.channel != self.channel {
            return None;
        }
        if change.program == self.target_program {
            Some(Slot::B)
        } else {
            Some(Slot::A)
        }
    }

    /// Scan `buffer` and switch slots on `session` for each matching message.
    ///
    /// Commands the session refuses are logged and skipped. Returns the number
    /// of slot switches sent.
    pub fn dispatch<T: Transport>(&self, session: &Session<T>, buffer: &[u8]) -> usize {
        let mut sent = 0;
        for change in parse_program_changes(buffer) {
            let Some(slot) = self.slot_for(change) else {
                continue;
            };
            match session.set_slot(slot) {
                Ok(()) => sent += 1,
                Err(err) => warn!(%slot, error = %err, "slot switch not sent"),
            }
        }
        sent
    }
}
