//! In-process transport that records every frame sent.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::TransportError;
use super::transport::Transport;

/// Shared, cloneable recorder standing in for a USB link.
///
/// Useful for host-side simulation and tests: clones share the same log, so
/// one handle can be given to a session while another inspects the traffic.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    sent: Vec<Vec<u8>>,
    offline: bool,
}

impl MemoryTransport {
    /// Create an attached transport with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach or detach the simulated device. Sends fail while detached.
    pub fn set_connected(&self, connected: bool) {
        self.inner().offline = !connected;
    }

    /// Copy of every frame sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.inner().sent.clone()
    }

    /// Drain the log.
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.inner().sent)
    }

    /// Number of frames sent so far.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.inner().sent.len()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner();
        if inner.offline {
            return Err(TransportError::Disconnected);
        }
        inner.sent.push(frame.to_vec());
        Ok(())
    }
}
