//! # Error Types
//!
//! Errors raised while building or reading message payloads.

use thiserror::Error;

/// Errors that can occur when encoding or decoding a message payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The payload value could not be serialized.
    #[error("Payload encoding failed: {reason}")]
    Encode { reason: String },

    /// The payload bytes do not form a valid value of the expected kind.
    #[error("Payload decoding failed: {reason}")]
    Decode { reason: String },

    /// The payload is shorter than the fixed layout of its kind.
    #[error("Payload truncated: need {expected} bytes, have {actual}")]
    Truncated { expected: usize, actual: usize },
}

/// Result type for message codec operations.
pub type MessageResult<T> = Result<T, MessageError>;
