//! Serial link plumbing: driver-facing traits and stream reassembly

mod error;
mod memory;
mod reassembler;
mod transport;

pub use error::TransportError;
pub use memory::MemoryTransport;
pub use reassembler::{DEFAULT_REASSEMBLY_TIMEOUT, MAX_PENDING, ReassemblyStats, Reassembler};
pub use transport::{LinkEvents, Transport};
