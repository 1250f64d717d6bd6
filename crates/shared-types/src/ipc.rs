//! # Platform IPC Messages
//!
//! Message functions below [`MESSAGE_FUNCTION_MINIMUM`] belong to the
//! platform itself rather than to any one module. They are delivered to
//! every module's group handler.
//!
//! [`MESSAGE_FUNCTION_MINIMUM`]: crate::envelope::MESSAGE_FUNCTION_MINIMUM

use crate::envelope::fixed_payload_size;
use serde::{Deserialize, Serialize};

/// The server registered or dropped this client.
pub const MESSAGE_FUNCTION_CLIENT_REGISTRATION: u32 = 0x0000_0001;

/// The server could not route a client message.
pub const MESSAGE_FUNCTION_CLIENT_ERROR: u32 = 0x0000_0011;

/// Payload of [`MESSAGE_FUNCTION_CLIENT_REGISTRATION`].
///
/// `registered == false` means the server process went away: every
/// server-side handle the client holds is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientRegistration {
    pub address_id: u32,
    pub registered: bool,
}

impl ClientRegistration {
    /// Minimum payload size of a client registration message.
    pub fn payload_size() -> usize {
        fixed_payload_size::<Self>()
    }
}
