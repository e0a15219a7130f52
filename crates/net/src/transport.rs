//! Outbound message seam.
//!
//! Everything that talks to the server goes through [`Transport::send`]. The
//! TCP connection drains a [`ChannelTransport`]; tests use a closure or the
//! recording variant.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::ClientMessage;

/// Fire-and-forget sender of client messages
pub trait Transport: Send + Sync {
    fn send(&self, message: ClientMessage);
}

impl<F> Transport for F
where
    F: Fn(ClientMessage) + Send + Sync,
{
    fn send(&self, message: ClientMessage) {
        self(message)
    }
}

/// Queues outbound messages for a writer task
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl ChannelTransport {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, message: ClientMessage) {
        if self.tx.send(message).is_err() {
            debug!("Dropping outbound message, connection closed");
        }
    }
}

/// Keeps every message in order
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<ClientMessage>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ClientMessage> {
        self.sent.lock().clone()
    }

    /// Return and forget everything sent so far
    pub fn take(&self) -> Vec<ClientMessage> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl Transport for RecordingTransport {
    fn send(&self, message: ClientMessage) {
        self.sent.lock().push(message);
    }
}
