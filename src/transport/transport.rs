//! Boundary between the protocol core and the USB serial driver.

use std::sync::Arc;

use super::error::TransportError;

/// Outbound half of a serial link to the device.
///
/// Implementations may block until the driver's transmit buffer accepts the
/// bytes. Calls are already serialized by the session.
pub trait Transport: Send + Sync {
    /// Transmit one complete frame.
    fn send(&self, frame: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).send(frame)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).send(frame)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).send(frame)
    }
}

/// Inbound half: what the driver reports to the protocol core.
///
/// The driver calls these from its own task. `on_receive` chunks carry no
/// framing guarantees; they may split or merge frames arbitrarily.
pub trait LinkEvents: Send + Sync {
    /// Device attached and ready for traffic.
    fn on_connect(&self);

    /// Device detached.
    fn on_disconnect(&self);

    /// Bytes arrived from the device.
    fn on_receive(&self, chunk: &[u8]);
}
