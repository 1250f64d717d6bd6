//! # Message Envelope
//!
//! The wrapper for ALL traffic between a profile module and the platform
//! server: a fixed header followed by a function-specific payload.
//!
//! ```text
//! ┌────────────┬────────────┬──────────────┬─────────────────┬────────────────┐
//! │ address_id │ message_id │ message_group│ message_function│ message_length │  header
//! ├────────────┴────────────┴──────────────┴─────────────────┴────────────────┤
//! │                   payload (message_length bytes)                          │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bit 31 of `message_id` marks a response. Payloads are fixed-width
//! little-endian records (bincode's default layout), so the minimum size of a
//! payload kind is simply the encoded size of its default value.

use crate::errors::{MessageError, MessageResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Mask selecting the sequence part of a message ID.
pub const MESSAGE_ID_MASK: u32 = 0x7FFF_FFFF;

/// Bit flagging a message as a response to an earlier request.
pub const MESSAGE_ID_RESPONSE_MASK: u32 = 0x8000_0000;

/// Lowest message group a module may claim.
pub const MESSAGE_GROUP_MINIMUM: u32 = 0x0000_0100;

/// Highest message group a module may claim.
pub const MESSAGE_GROUP_MAXIMUM: u32 = 0x0000_FFFF;

/// Lowest module-defined message function. Anything below is platform-level.
pub const MESSAGE_FUNCTION_MINIMUM: u32 = 0x0000_1000;

/// Highest module-defined message function.
pub const MESSAGE_FUNCTION_MAXIMUM: u32 = 0xFFFF_FFFF;

/// Fixed header carried by every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Address of the peer the message is for (or came from).
    pub address_id: u32,
    /// Sequence number, with the response bit.
    pub message_id: u32,
    /// Owning module group.
    pub message_group: u32,
    /// Function within the group.
    pub message_function: u32,
    /// Declared payload length in bytes.
    pub message_length: u32,
}

impl MessageHeader {
    /// True if the response bit is set.
    pub fn is_response(&self) -> bool {
        self.message_id & MESSAGE_ID_RESPONSE_MASK != 0
    }

    /// True if the function lies in the module-defined range.
    pub fn is_module_function(&self) -> bool {
        (MESSAGE_FUNCTION_MINIMUM..=MESSAGE_FUNCTION_MAXIMUM).contains(&self.message_function)
    }

    /// Sequence part of the message ID.
    pub fn sequence(&self) -> u32 {
        self.message_id & MESSAGE_ID_MASK
    }
}

/// A complete message: header plus raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub payload: Vec<u8>,
}

impl Message {
    /// Build a message around an already encoded payload.
    ///
    /// `message_length` is set from the payload.
    pub fn new(
        address_id: u32,
        message_id: u32,
        message_group: u32,
        message_function: u32,
        payload: Vec<u8>,
    ) -> Self {
        let message_length = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        Self {
            header: MessageHeader {
                address_id,
                message_id,
                message_group,
                message_function,
                message_length,
            },
            payload,
        }
    }

    /// Build a message whose payload is the encoding of `payload`.
    pub fn with_payload<T: Serialize>(
        address_id: u32,
        message_id: u32,
        message_group: u32,
        message_function: u32,
        payload: &T,
    ) -> MessageResult<Self> {
        Ok(Self::new(
            address_id,
            message_id,
            message_group,
            message_function,
            encode_payload(payload)?,
        ))
    }

    /// Build the response to this message: same address, group and
    /// function, same sequence with the response bit set.
    pub fn respond<T: Serialize>(&self, payload: &T) -> MessageResult<Message> {
        Self::with_payload(
            self.header.address_id,
            self.header.sequence() | MESSAGE_ID_RESPONSE_MASK,
            self.header.message_group,
            self.header.message_function,
            payload,
        )
    }

    /// Usable payload length: the declared length, capped by the bytes
    /// actually present.
    pub fn payload_len(&self) -> usize {
        (self.header.message_length as usize).min(self.payload.len())
    }

    /// True only if both the declared and the actual payload hold at least
    /// `size` bytes.
    pub fn has_payload_of_at_least(&self, size: usize) -> bool {
        self.payload_len() >= size
    }

    /// Decode the payload as `T`, ignoring bytes past the declared length.
    pub fn decode<T: DeserializeOwned>(&self) -> MessageResult<T> {
        decode_payload(&self.payload[..self.payload_len()])
    }
}

/// Encode a payload value in the fixed-width wire layout.
pub fn encode_payload<T: Serialize>(value: &T) -> MessageResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| MessageError::Encode {
        reason: e.to_string(),
    })
}

/// Decode a payload value. Trailing bytes are tolerated.
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> MessageResult<T> {
    bincode::deserialize(bytes).map_err(|e| MessageError::Decode {
        reason: e.to_string(),
    })
}

/// Encoded size of the fixed layout of `T`.
///
/// Only meaningful for payload kinds without variable-length fields.
/// Returns `usize::MAX` if the size cannot be computed, so that no message
/// ever passes a minimum-size check against it.
pub fn fixed_payload_size<T: Serialize + Default>() -> usize {
    bincode::serialized_size(&T::default())
        .ok()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(usize::MAX)
}
