//! # Message Group Handlers
//!
//! Every module claims one message group. Unsolicited messages for that
//! group, and platform-level messages, are handed to the module's group
//! handler one at a time.

use shared_types::Message;
use std::sync::Arc;
use thiserror::Error;

/// Errors from handler registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Another handler already owns the group.
    #[error("Message group {group:#06x} already has a handler")]
    HandlerAlreadyRegistered { group: u32 },

    /// The group lies outside the range modules may claim.
    #[error("Message group {group:#x} is outside the module range")]
    InvalidGroup { group: u32 },
}

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Receives the messages of one message group.
pub trait MessageGroupHandler: Send + Sync {
    fn handle_message(&self, message: &Message);
}

/// Registration side of the central dispatcher.
pub trait GroupHandlerRegistry: Send + Sync {
    /// Claim `group` for `handler`.
    fn register_group_handler(
        &self,
        group: u32,
        handler: Arc<dyn MessageGroupHandler>,
    ) -> BusResult<()>;

    /// Release `group`. Releasing an unclaimed group is a no-op.
    fn unregister_group_handler(&self, group: u32);
}
