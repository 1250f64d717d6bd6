//! Error types for the Glucose Profile Manager client

use crate::domain::ids::CallbackId;
use crate::domain::status::RemoteStatus;
use shared_bus::TransportError;
use thiserror::Error;

/// Glucose manager errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GlpmError {
    /// The module is not running
    #[error("Glucose manager not initialized")]
    NotInitialized,

    /// A caller-supplied argument was rejected
    #[error("Invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    /// No subscription exists for the callback ID
    #[error("Invalid callback: {callback_id}")]
    InvalidCallback { callback_id: CallbackId },

    /// A registry entry could not be stored
    #[error("Unable to add entry: {reason}")]
    AllocationFailure { reason: String },

    /// The server did not answer in time
    #[error("No response from server within {timeout_ms} ms")]
    TransportTimeout { timeout_ms: u64 },

    /// The server answered with something unusable
    #[error("Response message invalid: {reason}")]
    MalformedResponse { reason: String },

    /// The server answered with a nonzero status
    #[error("Server rejected request: {0}")]
    Remote(RemoteStatus),

    /// The guarded module state could not be created
    #[error("Unable to create lock: {reason}")]
    CannotCreateLock { reason: String },

    /// The message group is already claimed or invalid
    #[error("Unable to register handler for message group {group:#06x}")]
    CannotRegisterHandler { group: u32 },

    /// The server link could not be used
    #[error("Server link unavailable: {reason}")]
    Link { reason: String },
}

impl GlpmError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}

impl From<TransportError> for GlpmError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout { timeout_ms } => Self::TransportTimeout { timeout_ms },
            TransportError::NotConnected => Self::Link {
                reason: "server not connected".to_string(),
            },
            TransportError::Encode { reason } => Self::InvalidParameter { reason },
        }
    }
}

/// Result type for glucose manager operations
pub type GlpmResult<T> = Result<T, GlpmError>;
