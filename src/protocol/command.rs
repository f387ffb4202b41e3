//! Outbound command payloads
//!
//! Byte sequences here were captured from the vendor's own software. They are
//! reproduced as observed; their inner structure is only partly understood.

use bytes::Bytes;

use super::value::write_word;

/// Handshake greeting
pub const HELLO: [u8; 13] = [
    0xB9, 0x03, 0x00, 0x82, 0x04, 0x00, 0x80, 0x0B, 0x01, 0xB9, 0x02, 0x02, 0x0B,
];

/// Request for a full state report
pub const REQUEST_STATE: [u8; 15] = [
    0xB9, 0x03, 0x00, 0x82, 0x06, 0x00, 0x80, 0x0B, 0x03, 0xB9, 0x02, 0x81, 0x06, 0x03, 0x0B,
];

/// Class tag, then the 0x81-tagged "write state" type value
const WRITE_STATE_PREFIX: [u8; 5] = [0xB9, 0x03, 0x81, 0x06, 0x03];

/// Sub-header between the length word and the state blob
const WRITE_STATE_SUBHEADER: [u8; 3] = [0x80, 0x0B, 0x03];

/// Build the payload that writes `raw` back to the device.
///
/// ```text
/// B9 03 81 06 03 | 82 len_lo len_hi | 80 0B 03 | raw...
/// ```
///
/// Slot switches and preset changes both use this, differing only in which
/// bytes of `raw` were patched. Blobs longer than `u16::MAX` cannot be
/// described by the length word, which then carries the low 16 bits.
#[must_use]
pub fn write_state(raw: &Bytes) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        WRITE_STATE_PREFIX.len() + 3 + WRITE_STATE_SUBHEADER.len() + raw.len(),
    );
    out.extend_from_slice(&WRITE_STATE_PREFIX);
    #[allow(clippy::cast_possible_truncation)]
    write_word(&mut out, raw.len() as u16);
    out.extend_from_slice(&WRITE_STATE_SUBHEADER);
    out.extend_from_slice(raw);
    out
}
