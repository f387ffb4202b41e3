//! Driver-facing adapter: bytes in, session events out.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tracing::{debug, instrument, warn};

use super::error::SessionError;
use super::machine::Session;
use crate::transport::{LinkEvents, ReassemblyStats, Reassembler, Transport};

/// Connects a [`Session`] to a serial driver.
///
/// Register the link as the driver's event sink. Received chunks are
/// reassembled into frames and handed to the session one at a time.
#[derive(Debug)]
pub struct Link<T: Transport> {
    session: Arc<Session<T>>,
    // Only the receive path touches this.
    reassembler: Mutex<Reassembler>,
}

impl<T: Transport> Link<T> {
    /// Wrap `session`, reassembling with its configured timeout.
    #[must_use]
    pub fn new(session: Arc<Session<T>>) -> Self {
        let reassembler = Reassembler::new(session.config().reassembly_timeout);
        Self {
            session,
            reassembler: Mutex::new(reassembler),
        }
    }

    /// Session driven by this link.
    #[must_use]
    pub const fn session(&self) -> &Arc<Session<T>> {
        &self.session
    }

    /// Reassembly counters.
    #[must_use]
    pub fn reassembly_stats(&self) -> ReassemblyStats {
        self.reassembler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats()
    }

    /// Feed a chunk that arrived at `now`.
    ///
    /// Returns how many frames the session accepted. Rejected frames are
    /// logged and dropped.
    #[instrument(level = "trace", skip(self, chunk), fields(len = chunk.len()))]
    pub fn receive_at(&self, chunk: &[u8], now: Instant) -> usize {
        let frames = self
            .reassembler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_at(chunk, now);

        let mut accepted = 0;
        for frame in frames {
            match self.session.handle_frame(&frame) {
                Ok(msg_type) => {
                    debug!(%msg_type, len = frame.len(), "frame accepted");
                    accepted += 1;
                }
                Err(SessionError::Protocol(err)) => {
                    warn!(error = %err, len = frame.len(), "discarding frame");
                }
                Err(err) => {
                    warn!(error = %err, "frame handling failed");
                    accepted += 1;
                }
            }
        }
        accepted
    }
}

impl<T: Transport> LinkEvents for Link<T> {
    fn on_connect(&self) {
        self.reassembler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
        if let Err(err) = self.session.on_connect() {
            warn!(error = %err, "hello failed");
        }
    }

    fn on_disconnect(&self) {
        self.reassembler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
        self.session.on_disconnect();
    }

    fn on_receive(&self, chunk: &[u8]) {
        self.receive_at(chunk, Instant::now());
    }
}
