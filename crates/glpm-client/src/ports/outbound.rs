//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The module depends on three platform services:
//!
//! - [`MessageTransport`]: request/response round trips to the server
//! - [`GroupHandlerRegistry`]: claiming the glucose message group
//! - [`DeviceManager`]: the local controller's power state

use std::sync::Arc;

pub use shared_bus::{GroupHandlerRegistry, MessageGroupHandler, MessageTransport};
pub use shared_types::DeviceManager;

pub type SharedTransport = Arc<dyn MessageTransport>;
pub type SharedHandlerRegistry = Arc<dyn GroupHandlerRegistry>;
pub type SharedDeviceManager = Arc<dyn DeviceManager>;
