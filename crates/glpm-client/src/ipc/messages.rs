//! # Glucose Message Catalogue
//!
//! Functions and payload layouts of the glucose manager message group.
//!
//! | Function | Direction |
//! |----------|-----------|
//! | RegisterCollectorEvents | request/response |
//! | UnRegisterCollectorEvents | request/response |
//! | StartProcedure | request/response |
//! | StopProcedure | request/response |
//! | Connected, Disconnected | notification (broadcast) |
//! | ProcedureStarted, ProcedureStopped, GlucoseMeasurement | notification (owner) |
//!
//! Notification payloads have a fixed layout; a notification shorter than
//! its layout is dropped.

use crate::domain::types::{
    ConnectionType, GlucoseMeasurement, GlucoseMeasurementContext, MeasurementErrorType,
    MeasurementMessageFlags, ProcedureData, ProcedureType, ResponseCode, SupportedFeatures,
};
use serde::{Deserialize, Serialize};
use shared_types::{fixed_payload_size, BdAddr, Message};

/// Message group owned by the glucose manager.
pub const MESSAGE_GROUP_GLUCOSE_MANAGER: u32 = 0x0000_110B;

pub const GLPM_MESSAGE_FUNCTION_REGISTER_COLLECTOR_EVENTS: u32 = 0x0000_1001;
pub const GLPM_MESSAGE_FUNCTION_UN_REGISTER_COLLECTOR_EVENTS: u32 = 0x0000_1002;
pub const GLPM_MESSAGE_FUNCTION_START_PROCEDURE: u32 = 0x0000_2001;
pub const GLPM_MESSAGE_FUNCTION_STOP_PROCEDURE: u32 = 0x0000_2002;

pub const GLPM_MESSAGE_FUNCTION_CONNECTED: u32 = 0x0001_0002;
pub const GLPM_MESSAGE_FUNCTION_DISCONNECTED: u32 = 0x0001_0003;
pub const GLPM_MESSAGE_FUNCTION_PROCEDURE_STARTED: u32 = 0x0001_1001;
pub const GLPM_MESSAGE_FUNCTION_PROCEDURE_STOPPED: u32 = 0x0001_1002;
pub const GLPM_MESSAGE_FUNCTION_GLUCOSE_MEASUREMENT: u32 = 0x0002_0001;

// Requests and responses

/// Response to a collector events registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterCollectorEventsResponse {
    pub status: i32,
    pub handler_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnRegisterCollectorEventsRequest {
    pub handler_id: u32,
}

/// Response carrying only a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartProcedureRequest {
    pub handler_id: u32,
    pub address: BdAddr,
    pub procedure: ProcedureData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartProcedureResponse {
    pub status: i32,
    pub procedure_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StopProcedureRequest {
    pub handler_id: u32,
    pub address: BdAddr,
    pub procedure_id: u32,
}

// Notifications

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectedMessage {
    pub address: BdAddr,
    pub connection_type: ConnectionType,
    pub supported_features: SupportedFeatures,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisconnectedMessage {
    pub address: BdAddr,
    pub connection_type: ConnectionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcedureStartedMessage {
    pub address: BdAddr,
    pub procedure_id: u32,
    pub success: bool,
    pub att_error_code: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcedureStoppedMessage {
    pub address: BdAddr,
    pub procedure_id: u32,
    pub procedure_type: ProcedureType,
    pub response_code: ResponseCode,
    pub number_stored_records: u32,
}

/// A measurement and/or context record. `message_flags` says which of
/// the two records is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlucoseMeasurementMessage {
    pub address: BdAddr,
    pub procedure_id: u32,
    pub error_type: MeasurementErrorType,
    pub message_flags: MeasurementMessageFlags,
    pub measurement: GlucoseMeasurement,
    pub context: GlucoseMeasurementContext,
}

/// A decoded glucose notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Connected(ConnectedMessage),
    Disconnected(DisconnectedMessage),
    ProcedureStarted(ProcedureStartedMessage),
    ProcedureStopped(ProcedureStoppedMessage),
    GlucoseMeasurement(GlucoseMeasurementMessage),
}

/// Why a glucose group message produced no notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Responses are consumed by the round trip that awaited them.
    ResponseFlagged,
    /// Not a notification function of this group.
    UnknownFunction(u32),
    Truncated {
        function: u32,
        expected: usize,
        actual: usize,
    },
    Malformed {
        function: u32,
        reason: String,
    },
}

/// Minimum payload size of a notification function.
pub fn notification_payload_size(function: u32) -> Option<usize> {
    match function {
        GLPM_MESSAGE_FUNCTION_CONNECTED => Some(fixed_payload_size::<ConnectedMessage>()),
        GLPM_MESSAGE_FUNCTION_DISCONNECTED => Some(fixed_payload_size::<DisconnectedMessage>()),
        GLPM_MESSAGE_FUNCTION_PROCEDURE_STARTED => {
            Some(fixed_payload_size::<ProcedureStartedMessage>())
        }
        GLPM_MESSAGE_FUNCTION_PROCEDURE_STOPPED => {
            Some(fixed_payload_size::<ProcedureStoppedMessage>())
        }
        GLPM_MESSAGE_FUNCTION_GLUCOSE_MEASUREMENT => {
            Some(fixed_payload_size::<GlucoseMeasurementMessage>())
        }
        _ => None,
    }
}

impl Notification {
    /// Decode a glucose group message into a notification.
    pub fn parse(message: &Message) -> Result<Self, DropReason> {
        let function = message.header.message_function;
        if message.header.is_response() {
            return Err(DropReason::ResponseFlagged);
        }

        let expected =
            notification_payload_size(function).ok_or(DropReason::UnknownFunction(function))?;
        if !message.has_payload_of_at_least(expected) {
            return Err(DropReason::Truncated {
                function,
                expected,
                actual: message.payload_len(),
            });
        }

        let malformed = |e: shared_types::MessageError| DropReason::Malformed {
            function,
            reason: e.to_string(),
        };
        let notification = match function {
            GLPM_MESSAGE_FUNCTION_CONNECTED => Self::Connected(message.decode().map_err(malformed)?),
            GLPM_MESSAGE_FUNCTION_DISCONNECTED => {
                Self::Disconnected(message.decode().map_err(malformed)?)
            }
            GLPM_MESSAGE_FUNCTION_PROCEDURE_STARTED => {
                Self::ProcedureStarted(message.decode().map_err(malformed)?)
            }
            GLPM_MESSAGE_FUNCTION_PROCEDURE_STOPPED => {
                Self::ProcedureStopped(message.decode().map_err(malformed)?)
            }
            _ => Self::GlucoseMeasurement(message.decode().map_err(malformed)?),
        };
        Ok(notification)
    }

    pub fn function(&self) -> u32 {
        match self {
            Self::Connected(_) => GLPM_MESSAGE_FUNCTION_CONNECTED,
            Self::Disconnected(_) => GLPM_MESSAGE_FUNCTION_DISCONNECTED,
            Self::ProcedureStarted(_) => GLPM_MESSAGE_FUNCTION_PROCEDURE_STARTED,
            Self::ProcedureStopped(_) => GLPM_MESSAGE_FUNCTION_PROCEDURE_STOPPED,
            Self::GlucoseMeasurement(_) => GLPM_MESSAGE_FUNCTION_GLUCOSE_MEASUREMENT,
        }
    }

    /// Wrap this notification in a message from `address_id`.
    pub fn to_message(&self, address_id: u32, message_id: u32) -> shared_types::MessageResult<Message> {
        let function = self.function();
        let group = MESSAGE_GROUP_GLUCOSE_MANAGER;
        match self {
            Self::Connected(m) => Message::with_payload(address_id, message_id, group, function, m),
            Self::Disconnected(m) => Message::with_payload(address_id, message_id, group, function, m),
            Self::ProcedureStarted(m) => {
                Message::with_payload(address_id, message_id, group, function, m)
            }
            Self::ProcedureStopped(m) => {
                Message::with_payload(address_id, message_id, group, function, m)
            }
            Self::GlucoseMeasurement(m) => {
                Message::with_payload(address_id, message_id, group, function, m)
            }
        }
    }
}
