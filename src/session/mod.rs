//! Controller session: handshake, cached device state and commands

mod config;
mod error;
mod link;
mod machine;
mod metrics;

pub use config::{DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_PRESET_COUNT, SessionConfig};
pub use error::{CommandRejected, Result, SessionError};
pub use link::Link;
pub use machine::{ConnectionState, Session};
pub use metrics::MetricsSnapshot;
