use tokio::sync::mpsc;

use super::{Controller, OutboundMessage};

/// Controller backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelController {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelController {
    pub fn new(tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self { tx }
    }

    /// Create a controller together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Controller for ChannelController {
    fn send(&self, message: OutboundMessage) {
        if let Err(e) = self.tx.send(message) {
            // Receiver dropped; messages are best-effort
            tracing::debug!(message = ?e.0, "Controller message dropped");
        }
    }
}
