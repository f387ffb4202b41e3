//! Session configuration.

use std::time::Duration;

use crate::protocol::StateLayout;
use crate::transport::DEFAULT_REASSEMBLY_TIMEOUT;

/// Number of preset positions on the device.
pub const DEFAULT_PRESET_COUNT: u8 = 20;

/// Default bound on the connect-to-ready handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Session configuration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Where the known fields sit inside the state blob.
    pub layout: StateLayout,
    /// Presets at or above this index are rejected.
    pub preset_count: u8,
    /// Inter-byte gap after which a partial frame is flushed.
    pub reassembly_timeout: Duration,
    /// How long [`super::Session::wait_ready`] waits for the handshake.
    pub handshake_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout: StateLayout::default(),
            preset_count: DEFAULT_PRESET_COUNT,
            reassembly_timeout: DEFAULT_REASSEMBLY_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Use `layout` for locating state fields.
    #[must_use]
    pub const fn with_layout(mut self, layout: StateLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Bound the handshake wait.
    #[must_use]
    pub const fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}
