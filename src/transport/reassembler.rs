//! Frame reassembly for the inbound byte stream.
//!
//! The serial driver delivers arbitrary chunks. Bytes accumulate until a
//! closing flag completes a frame that began with a flag. If the stream goes
//! quiet for longer than the timeout with bytes pending, the next chunk first
//! flushes what is pending as a frame of its own, so a truncated frame cannot
//! swallow the one after it.
//!
//! Bytes that arrive before any opening flag are line noise. They are dropped
//! as soon as a flag shows up, so noise at attach cannot hold back the frames
//! behind it.

use std::time::{Duration, Instant};

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::protocol::FRAME_FLAG;

/// Default inter-byte gap after which pending bytes are flushed.
pub const DEFAULT_REASSEMBLY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Most bytes held while waiting for a closing flag.
///
/// Matches the reach of the 16-bit length word. A buffer that grows past it
/// is dropped.
pub const MAX_PENDING: usize = 64 * 1024;

/// Counters kept by a [`Reassembler`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReassemblyStats {
    /// Frames closed by a flag byte.
    pub frames: u64,
    /// Partial buffers flushed after a timeout.
    pub timeouts: u64,
    /// Bytes dropped as noise before an opening flag or past [`MAX_PENDING`].
    pub discarded: u64,
    /// Buffers dropped for exceeding [`MAX_PENDING`].
    pub overflows: u64,
}

/// Accumulates stream bytes into candidate frames.
#[derive(Debug)]
pub struct Reassembler {
    buffer: BytesMut,
    last_byte_at: Option<Instant>,
    timeout: Duration,
    stats: ReassemblyStats,
}

impl Reassembler {
    /// Create a reassembler with the given inter-byte timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            buffer: BytesMut::with_capacity(512),
            last_byte_at: None,
            timeout,
            stats: ReassemblyStats::default(),
        }
    }

    /// Feed a chunk received now.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.push_at(chunk, Instant::now())
    }

    /// Feed a chunk received at `now`.
    ///
    /// Returns every buffer that should be handed to the parser, in arrival
    /// order. Returned buffers are not validated; a timeout flush in
    /// particular is usually a broken frame.
    pub fn push_at(&mut self, chunk: &[u8], now: Instant) -> Vec<Bytes> {
        let mut frames = Vec::new();

        if let Some(last) = self.last_byte_at {
            let gap = now.saturating_duration_since(last);
            if !self.buffer.is_empty() && gap > self.timeout {
                debug!(
                    pending = self.buffer.len(),
                    gap_ms = gap.as_millis(),
                    "reassembly timeout; flushing partial frame"
                );
                self.stats.timeouts += 1;
                frames.push(self.buffer.split().freeze());
            }
        }

        for &byte in chunk {
            if byte == FRAME_FLAG && self.buffer.first().is_some_and(|&b| b != FRAME_FLAG) {
                debug!(dropped = self.buffer.len(), "discarding bytes before opening flag");
                self.discard();
            }

            self.buffer.put_u8(byte);

            if byte == FRAME_FLAG && self.buffer.len() > 1 {
                trace!(len = self.buffer.len(), "frame complete");
                self.stats.frames += 1;
                frames.push(self.buffer.split().freeze());
            } else if self.buffer.len() > MAX_PENDING {
                warn!(pending = self.buffer.len(), "no closing flag; dropping oversized buffer");
                self.stats.overflows += 1;
                self.discard();
            }
        }

        if !chunk.is_empty() {
            self.last_byte_at = Some(now);
        }

        frames
    }

    fn discard(&mut self) {
        self.stats.discarded += self.buffer.len() as u64;
        self.buffer.clear();
    }

    /// Bytes waiting for a closing flag.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drop pending bytes, e.g. after the device detaches.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_byte_at = None;
    }

    /// Counters since creation.
    #[must_use]
    pub const fn stats(&self) -> ReassemblyStats {
        self.stats
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(DEFAULT_REASSEMBLY_TIMEOUT)
    }
}
