//! Controller protocol.
//!
//! The controller starts captures with [`InboundMessage::ProcessStart`] and
//! receives progress, completion and error notifications as
//! [`OutboundMessage`]s. Every inbound message is answered with an empty
//! [`Acknowledgement`] before any asynchronous work begins.

mod channel;

use serde::{Deserialize, Serialize};

use crate::capture::CaptureOptions;

pub use channel::ChannelController;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    /// Start request; the options are consumed by one capture
    ProcessStart {
        #[serde(default)]
        options: CaptureOptions,
    },
    /// Anything this side of the protocol does not handle
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    #[serde(rename_all = "camelCase")]
    ProcessProgress { index: u64, max_index: u64 },
    /// The engine reached the end of its page lifecycle
    ProcessEnd,
    ProcessError { error: String },
}

/// Empty response sent for every inbound message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {}

/// Fire-and-forget sender towards the controller. Implementations must not
/// block and do not retry.
pub trait Controller: Send + Sync {
    fn send(&self, message: OutboundMessage);
}
