//! Tagged small-integer encoding used in message headers.
//!
//! ```text
//! 0x80 vv       -> vv          (2 bytes)
//! 0x81 lo hi    -> hi << 8 | lo (3 bytes)
//! 0x82 lo hi    -> hi << 8 | lo (3 bytes)
//! vv            -> vv          (1 byte, anything else)
//! ```
//!
//! The device emits both 0x81 and 0x82 ahead of 16-bit words. No observed
//! traffic distinguishes them, so both decode the same way.

/// Tag announcing a single-byte value.
pub const TAG_BYTE: u8 = 0x80;
/// First tag observed ahead of a little-endian 16-bit value.
pub const TAG_WORD_A: u8 = 0x81;
/// Second tag observed ahead of a little-endian 16-bit value.
pub const TAG_WORD_B: u8 = 0x82;

/// Decode one value starting at `cursor`.
///
/// Returns the value and the number of bytes consumed, or `None` when the
/// buffer ends inside the encoding.
#[must_use]
pub fn read_value(buffer: &[u8], cursor: usize) -> Option<(u16, usize)> {
    let tag = *buffer.get(cursor)?;
    match tag {
        TAG_WORD_A | TAG_WORD_B => {
            let lo = *buffer.get(cursor + 1)?;
            let hi = *buffer.get(cursor + 2)?;
            Some((u16::from_le_bytes([lo, hi]), 3))
        }
        TAG_BYTE => {
            let value = *buffer.get(cursor + 1)?;
            Some((u16::from(value), 2))
        }
        _ => Some((u16::from(tag), 1)),
    }
}

/// Append `value` as a 0x82-tagged little-endian word.
pub fn write_word(out: &mut Vec<u8>, value: u16) {
    out.push(TAG_WORD_B);
    out.extend_from_slice(&value.to_le_bytes());
}

/// Sequential reader over tagged values.
#[derive(Debug, Clone)]
pub struct ValueReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> ValueReader<'a> {
    /// Start reading `buffer` at `cursor`.
    #[must_use]
    pub const fn new(buffer: &'a [u8], cursor: usize) -> Self {
        Self { buffer, cursor }
    }

    /// Decode the next value and advance past it.
    pub fn next_value(&mut self) -> Option<u16> {
        let (value, consumed) = read_value(self.buffer, self.cursor)?;
        self.cursor += consumed;
        Some(value)
    }

    /// Current position in the buffer.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Bytes left after the cursor.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        self.buffer.get(self.cursor..).unwrap_or_default()
    }
}
