use std::sync::atomic::{AtomicU64, Ordering};

use crate::protocol::MessageType;

/// Per-session traffic counters.
#[derive(Debug, Default)]
pub(crate) struct SessionMetrics {
    frames_received: AtomicU64,
    frames_rejected: AtomicU64,
    commands_sent: AtomicU64,
    commands_rejected: AtomicU64,
    send_failures: AtomicU64,
    messages: MessageTypeCounters,
}

#[derive(Debug, Default)]
struct MessageTypeCounters {
    hello: AtomicU64,
    state_update: AtomicU64,
    unknown: AtomicU64,
}

impl MessageTypeCounters {
    fn increment(&self, msg_type: MessageType) {
        let counter = match msg_type {
            MessageType::Hello => &self.hello,
            MessageType::StateUpdate => &self.state_update,
            MessageType::Unknown => &self.unknown,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl SessionMetrics {
    #[inline]
    pub(crate) fn record_message(&self, msg_type: MessageType) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.messages.increment(msg_type);
    }

    #[inline]
    pub(crate) fn record_rejected_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_command_sent(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_command_rejected(&self) {
        self.commands_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            hello_messages: self.messages.hello.load(Ordering::Relaxed),
            state_updates: self.messages.state_update.load(Ordering::Relaxed),
            unknown_messages: self.messages.unknown.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Lightweight snapshot of session counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Frames handed to the parser.
    pub frames_received: u64,
    /// Frames the parser refused.
    pub frames_rejected: u64,
    /// Hello acknowledgements received.
    pub hello_messages: u64,
    /// State reports received.
    pub state_updates: u64,
    /// Valid messages of other types.
    pub unknown_messages: u64,
    /// Frames sent to the device.
    pub commands_sent: u64,
    /// Commands refused before sending.
    pub commands_rejected: u64,
    /// Sends the transport failed.
    pub send_failures: u64,
}

impl MetricsSnapshot {
    /// Share of received frames that parsed, if any arrived.
    #[must_use]
    pub fn acceptance_ratio(&self) -> Option<f64> {
        if self.frames_received == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = (self.frames_received - self.frames_rejected) as f64
            / self.frames_received as f64;
        Some(ratio)
    }
}
