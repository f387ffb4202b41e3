//! tonelink - footswitch control surface for USB amp-modeling devices
//!
//! This library speaks the device's serial control protocol: HDLC-style
//! framing with a CRC-16 trailer, a tagged-value message header, and a state
//! record that is patched in place and written back to switch slots or load
//! presets. A [`Session`] runs the handshake and serializes commands; a
//! [`Link`] feeds it from the USB driver's byte stream.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tonelink::{Link, LinkEvents, MemoryTransport, Session, SessionConfig, Slot};
//!
//! let transport = MemoryTransport::new();
//! let session = Arc::new(Session::new(transport, SessionConfig::default()));
//! let link = Link::new(Arc::clone(&session));
//!
//! // Driver callbacks
//! link.on_connect();
//! // link.on_receive(&bytes_from_device);
//!
//! session.wait_ready()?;
//! session.set_slot(Slot::B)?;
//! # Ok::<(), tonelink::SessionError>(())
//! ```
//!
//! # Layers
//!
//! - [`protocol`] - frame codec, value codec, message parser and command builders
//! - [`transport`] - driver-facing traits and stream reassembly
//! - [`session`] - handshake state machine and command gateway
//! - [`midi`] - Program Change input mapped to slot switches

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod midi;
pub mod protocol;
pub mod session;
pub mod transport;

pub use midi::{FootswitchMapping, ProgramChange, parse_program_changes};
pub use protocol::{
    DeviceState, FrameError, Header, Message, MessageType, ProtocolError, Slot, StateLayout,
    unwrap_frame, wrap_frame,
};
pub use session::{
    CommandRejected, ConnectionState, Link, MetricsSnapshot, Session, SessionConfig, SessionError,
};
pub use transport::{LinkEvents, MemoryTransport, Reassembler, Transport, TransportError};
