//! # Shared Types Crate
//!
//! This crate contains the platform-wide types every profile module of the
//! Bluetooth platform manager shares: the message envelope exchanged with
//! the platform server, platform-level IPC payloads, device addresses, the
//! device manager port and the module lifecycle contract.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Wire header layout and the reserved
//!   function ranges are defined here and nowhere else.
//! - **Fixed Layouts**: Payloads are fixed-width records, so a payload
//!   kind's minimum length is known before any field is read.
//! - **Explicit Lifecycle**: Modules are objects with `initialize()` and
//!   `shutdown()`, never process-wide statics.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod device;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;
pub mod module;
pub mod module_registry;

pub use device::{DeviceManager, DevicePowerEvent, SharedPowerState};
pub use entities::*;
pub use envelope::{
    decode_payload, encode_payload, fixed_payload_size, Message, MessageHeader,
    MESSAGE_FUNCTION_MAXIMUM, MESSAGE_FUNCTION_MINIMUM, MESSAGE_GROUP_MAXIMUM,
    MESSAGE_GROUP_MINIMUM, MESSAGE_ID_MASK, MESSAGE_ID_RESPONSE_MASK,
};
pub use errors::*;
pub use ipc::*;
pub use module::{DynModule, ModuleError, ModuleErrorKind, ModuleResult, PlatformModule};
pub use module_registry::ModuleRegistry;
