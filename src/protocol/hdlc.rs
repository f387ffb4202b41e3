//! HDLC-style framing (encode/decode)
//!
//! Frames are flag-delimited, byte-stuffed and protected by a CRC-16/X-25
//! checksum computed over the unescaped payload.

use super::{FrameError, FRAME_ESCAPE, FRAME_FLAG, MIN_FRAME_SIZE};

/// XOR mask applied to an escaped byte.
const ESCAPE_MASK: u8 = 0x20;

/// Reversed CCITT polynomial (x^16 + x^12 + x^5 + 1).
const CRC_POLY: u16 = 0x8408;

/// CRC-16/X-25 over `data`: LSB-first, seeded at 0xFFFF, complemented.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ CRC_POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

#[inline]
fn push_stuffed(out: &mut Vec<u8>, byte: u8) {
    if byte == FRAME_FLAG || byte == FRAME_ESCAPE {
        out.push(FRAME_ESCAPE);
        out.push(byte ^ ESCAPE_MASK);
    } else {
        out.push(byte);
    }
}

/// Wrap a payload into a frame
///
/// # Format
///
/// ```text
/// [0x7E] [PAYLOAD (stuffed)] [CRC lo (stuffed)] [CRC hi (stuffed)] [0x7E]
/// ```
#[must_use]
pub fn wrap_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() * 2 + MIN_FRAME_SIZE);
    out.push(FRAME_FLAG);

    for &byte in payload {
        push_stuffed(&mut out, byte);
    }

    let [lo, hi] = crc16(payload).to_le_bytes();
    push_stuffed(&mut out, lo);
    push_stuffed(&mut out, hi);

    out.push(FRAME_FLAG);
    out
}

/// Unwrap a frame back into its payload
///
/// An unescaped flag before the closing flag ends the payload early, so
/// frames carrying stray extra flags still decode.
///
/// # Errors
///
/// Returns an error if:
/// - The frame is shorter than 4 bytes or not flag-delimited
/// - An escape byte is not followed by another body byte
/// - The de-escaped body is too short to carry a CRC
/// - The transmitted CRC does not match the payload
pub fn unwrap_frame(frame: &[u8]) -> Result<Vec<u8>, FrameError> {
    if frame.len() < MIN_FRAME_SIZE
        || frame.first() != Some(&FRAME_FLAG)
        || frame.last() != Some(&FRAME_FLAG)
    {
        return Err(FrameError::InvalidFrame);
    }

    let body = &frame[1..frame.len() - 1];
    let mut output = Vec::with_capacity(body.len());
    let mut bytes = body.iter().copied();

    while let Some(byte) = bytes.next() {
        match byte {
            FRAME_ESCAPE => {
                let escaped = bytes.next().ok_or(FrameError::InvalidEscapeSequence)?;
                output.push(escaped ^ ESCAPE_MASK);
            }
            FRAME_FLAG => break,
            _ => output.push(byte),
        }
    }

    if output.len() < 2 {
        return Err(FrameError::InvalidFrame);
    }

    let crc_start = output.len() - 2;
    let found = u16::from_le_bytes([output[crc_start], output[crc_start + 1]]);
    output.truncate(crc_start);

    let expected = crc16(&output);
    if found != expected {
        return Err(FrameError::CrcMismatch { expected, found });
    }

    Ok(output)
}
