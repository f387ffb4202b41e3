//! Connection state machine and command gateway.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, instrument, trace, warn};

use super::config::SessionConfig;
use super::error::{CommandRejected, Result, SessionError};
use super::metrics::{MetricsSnapshot, SessionMetrics};
use crate::protocol::{DeviceState, Message, MessageType, Slot, command, wrap_frame};
use crate::transport::Transport;

/// Handshake progress, in the order it is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// No device attached
    #[default]
    Disconnected,
    /// Device attached, hello sent
    Connected,
    /// Hello acknowledged, state requested
    Helloed,
    /// State known; commands accepted
    StateInitialized,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "Disconnected",
            Self::Connected => "Connected",
            Self::Helloed => "Helloed",
            Self::StateInitialized => "StateInitialized",
        };
        write!(f, "{name}")
    }
}

/// Everything guarded by the session lock.
#[derive(Debug, Default)]
struct Shared {
    connection: ConnectionState,
    // Some exactly when `connection` is `StateInitialized`.
    device: Option<DeviceState>,
}

/// One controller session with one device.
///
/// Share it between the driver callback, the MIDI task and the application by
/// wrapping it in an `Arc`. Every method takes `&self`.
#[derive(Debug)]
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    shared: Mutex<Shared>,
    transitions: Condvar,
    // Held from payload build to send completion so commands leave in order.
    outbound: Mutex<()>,
    metrics: SessionMetrics,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Transport> Session<T> {
    /// Create a disconnected session sending through `transport`.
    #[must_use]
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            shared: Mutex::new(Shared::default()),
            transitions: Condvar::new(),
            outbound: Mutex::new(()),
            metrics: SessionMetrics::default(),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Current handshake state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        lock(&self.shared).connection
    }

    /// Snapshot of the last known device state.
    #[must_use]
    pub fn state(&self) -> Option<DeviceState> {
        lock(&self.shared).device.clone()
    }

    /// Traffic counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn transition(&self, shared: &mut Shared, next: ConnectionState) {
        if shared.connection != next {
            info!(from = %shared.connection, to = %next, "connection state");
            shared.connection = next;
            self.transitions.notify_all();
        }
    }

    /// Device attached: enter `Connected` and greet it.
    ///
    /// A connect while a session is already up means the disconnect was
    /// missed. The session first drops to `Disconnected`, exactly as
    /// [`Session::on_disconnect`] would, and then starts a fresh handshake.
    /// States never move backwards except through `Disconnected`.
    #[instrument(level = "debug", skip(self))]
    pub fn on_connect(&self) -> Result<()> {
        {
            let mut shared = lock(&self.shared);
            if shared.connection != ConnectionState::Disconnected {
                warn!(state = %shared.connection, "connect without disconnect; restarting handshake");
                self.reset(&mut shared);
            }
            self.transition(&mut shared, ConnectionState::Connected);
        }
        self.hello()
    }

    /// Device detached: forget everything learned from it.
    #[instrument(level = "debug", skip(self))]
    pub fn on_disconnect(&self) {
        let mut shared = lock(&self.shared);
        self.reset(&mut shared);
    }

    fn reset(&self, shared: &mut Shared) {
        shared.device = None;
        self.transition(shared, ConnectionState::Disconnected);
    }

    /// Parse one reassembled frame and act on it.
    ///
    /// Invalid frames change nothing and come back as
    /// [`SessionError::Protocol`].
    pub fn handle_frame(&self, frame: &[u8]) -> Result<MessageType> {
        match Message::parse(frame, self.config.layout) {
            Ok(message) => {
                let msg_type = message.message_type();
                self.handle_message(message)?;
                Ok(msg_type)
            }
            Err(err) => {
                self.metrics.record_rejected_frame();
                Err(err.into())
            }
        }
    }

    /// Advance the handshake or absorb new state from a parsed message.
    pub fn handle_message(&self, message: Message) -> Result<()> {
        self.metrics.record_message(message.message_type());

        match message {
            Message::Hello(_) => {
                {
                    let mut shared = lock(&self.shared);
                    if shared.connection != ConnectionState::Connected {
                        debug!(state = %shared.connection, "ignoring hello outside handshake");
                        return Ok(());
                    }
                    self.transition(&mut shared, ConnectionState::Helloed);
                }
                self.request_state()
            }
            Message::StateUpdate { state, .. } => {
                debug!(
                    slot = %state.current_slot(),
                    a = state.slot_a_preset(),
                    b = state.slot_b_preset(),
                    c = state.slot_c_preset(),
                    len = state.raw().len(),
                    "state update"
                );
                let mut shared = lock(&self.shared);
                shared.device = Some(state);
                self.transition(&mut shared, ConnectionState::StateInitialized);
                Ok(())
            }
            Message::Unknown(header) => {
                trace!(type_value = header.type_value(), size = header.size(), "unhandled message");
                Ok(())
            }
        }
    }

    /// Block until the handshake reaches `target` or `timeout` elapses.
    pub fn wait_for(&self, target: ConnectionState, timeout: Duration) -> Result<()> {
        let shared = lock(&self.shared);
        let (shared, _) = self
            .transitions
            .wait_timeout_while(shared, timeout, |shared| shared.connection < target)
            .unwrap_or_else(PoisonError::into_inner);

        if shared.connection < target {
            warn!(reached = %shared.connection, %target, "handshake timed out");
            return Err(SessionError::HandshakeTimeout {
                reached: shared.connection,
                target,
            });
        }
        Ok(())
    }

    /// Block until commands are accepted, bounded by the configured timeout.
    pub fn wait_ready(&self) -> Result<()> {
        self.wait_for(
            ConnectionState::StateInitialized,
            self.config.handshake_timeout,
        )
    }

    /// Send the handshake greeting.
    pub fn hello(&self) -> Result<()> {
        let _outbound = lock(&self.outbound);
        self.send_payload("hello", &command::HELLO)
    }

    /// Ask the device for a full state report.
    pub fn request_state(&self) -> Result<()> {
        let _outbound = lock(&self.outbound);
        self.send_payload("request_state", &command::REQUEST_STATE)
    }

    /// Make `slot` the active slot.
    #[instrument(level = "debug", skip(self))]
    pub fn set_slot(&self, slot: Slot) -> Result<()> {
        self.write_state("set_slot", |state| state.set_current_slot(slot))
    }

    /// Load `preset` into `slot`.
    #[instrument(level = "debug", skip(self))]
    pub fn change_preset(&self, slot: Slot, preset: u8) -> Result<()> {
        let count = self.config.preset_count;
        if preset >= count {
            warn!(preset, count, "preset index out of range");
            self.metrics.record_command_rejected();
            return Err(CommandRejected::InvalidPresetIndex { preset, count }.into());
        }
        self.write_state("change_preset", |state| state.set_preset(slot, preset))
    }

    /// Load `preset` into the background A/B slot, then switch to it.
    ///
    /// The active slot keeps sounding while the new preset loads. Returns the
    /// slot that is active afterwards.
    #[instrument(level = "debug", skip(self))]
    pub fn switch_silently(&self, preset: u8) -> Result<Slot> {
        let current = {
            let shared = lock(&self.shared);
            match (&shared.device, shared.connection) {
                (Some(device), ConnectionState::StateInitialized) => device.current_slot(),
                (_, state) => return Err(self.not_ready("switch_silently", state)),
            }
        };

        let target = current.inactive_sibling();
        self.change_preset(target, preset)?;
        self.set_slot(target)?;
        Ok(target)
    }

    fn not_ready(&self, op: &'static str, state: ConnectionState) -> SessionError {
        warn!(op, %state, "session not ready; command dropped");
        self.metrics.record_command_rejected();
        CommandRejected::NotReady { state }.into()
    }

    fn write_state<F>(&self, op: &'static str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut DeviceState),
    {
        let _outbound = lock(&self.outbound);
        let payload = {
            let mut shared = lock(&self.shared);
            let connection = shared.connection;
            match shared.device.as_mut() {
                Some(device) if connection == ConnectionState::StateInitialized => {
                    mutate(device);
                    command::write_state(device.raw())
                }
                _ => return Err(self.not_ready(op, connection)),
            }
        };
        self.send_payload(op, &payload)
    }

    // Caller holds the outbound lock.
    fn send_payload(&self, op: &'static str, payload: &[u8]) -> Result<()> {
        let frame = wrap_frame(payload);
        trace!(op, len = frame.len(), "sending frame");
        if let Err(err) = self.transport.send(&frame) {
            warn!(op, error = %err, "send failed");
            self.metrics.record_send_failure();
            return Err(err.into());
        }
        self.metrics.record_command_sent();
        Ok(())
    }
}
