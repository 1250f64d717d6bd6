//! Ports module for the glucose manager

pub mod inbound;
pub mod outbound;

pub use inbound::GlucoseManagerApi;
pub use outbound::{
    DeviceManager, GroupHandlerRegistry, MessageTransport, SharedDeviceManager,
    SharedHandlerRegistry, SharedTransport,
};
