//! # glpm-client
//!
//! Glucose Profile Manager client: the correlation and dispatch engine
//! between applications and the glucose profile server.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Subscriptions**: Application callbacks, each mirrored by a server-side
//!   handler registration
//! - **Procedures**: Record access procedures tracked from start request to
//!   the server's stop notification
//! - **Dispatch**: Server notifications routed to every callback (connection
//!   events) or to the callback owning the procedure (procedure events)
//!
//! ## Architecture
//!
//! ```text
//! Application ──GlucoseManagerApi──→ GlucoseManager ──round trip──→ Server
//!      ▲                                   │
//!      │                             GlpmContext (one lock)
//!      │                                   ▲
//!      └──── EventCallback ──── Dispatcher ┘◄── GlpmGroupHandler ◄── notifications
//! ```
//!
//! IDs handed to applications are local. The server's handler and
//! procedure IDs never leave the crate.
//!
//! ## Example
//!
//! ```rust,ignore
//! use glpm_client::{GlpmConfig, GlucoseManager, GlucoseManagerApi, ProcedureData};
//!
//! let manager = GlucoseManager::new(GlpmConfig::from_env(), transport, handlers, device);
//! manager.initialize()?;
//!
//! let callback_id = manager.register_event_callback(Arc::new(|event: &GlpmEvent| {
//!     println!("{event:?}");
//! }))?;
//! let procedure_id = manager.start_procedure(callback_id, sensor, &ProcedureData::report_all())?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod domain;
pub mod error;
pub mod ipc;
pub mod metrics;
pub mod ports;
pub mod service;

mod context;

pub use config::GlpmConfig;
pub use domain::{
    CallbackId, DateTime, EventCallback, FilterParameters, GlpmEvent, GlpmEventKind, OperatorType,
    ProcedureData, ProcedureId, ProcedureType, RemoteStatus, ResponseCode, Transaction,
};
pub use error::{GlpmError, GlpmResult};
pub use ipc::{GlpmGroupHandler, Notification, MESSAGE_GROUP_GLUCOSE_MANAGER};
pub use metrics::{GlpmStats, GlpmStatsSnapshot};
pub use ports::inbound::GlucoseManagerApi;
pub use service::{GlucoseManager, MODULE_NAME};
