//! # Message Transport
//!
//! The synchronous request/response side of the central message system.
//! A client sends one request and blocks until the matching response
//! arrives or the timeout elapses.

use shared_types::{Message, MessageError};
use std::time::Duration;
use thiserror::Error;

/// Errors from a request/response round trip.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No response arrived in time.
    #[error("No response within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// There is no server to talk to.
    #[error("Server not connected")]
    NotConnected,

    /// The request could not be built.
    #[error("Message encoding failed: {reason}")]
    Encode { reason: String },
}

impl From<MessageError> for TransportError {
    fn from(e: MessageError) -> Self {
        Self::Encode {
            reason: e.to_string(),
        }
    }
}

/// Client side of the central message system.
pub trait MessageTransport: Send + Sync {
    /// Address of the server process, if one is connected.
    fn server_address_id(&self) -> Option<u32>;

    /// A fresh, nonzero message sequence number.
    fn next_message_id(&self) -> u32;

    /// Send `request` and wait up to `timeout` for its response.
    fn send_message_response(
        &self,
        request: Message,
        timeout: Duration,
    ) -> Result<Message, TransportError>;
}

/// Server side of a round trip: produces the response to one request.
///
/// Returning `None` means the server never answers, which the transport
/// reports as a timeout.
pub trait RequestResponder: Send + Sync {
    fn respond(&self, request: &Message) -> Option<Message>;
}

impl<F> RequestResponder for F
where
    F: Fn(&Message) -> Option<Message> + Send + Sync,
{
    fn respond(&self, request: &Message) -> Option<Message> {
        self(request)
    }
}
