//! # Shared Bus - Central Message System Seams
//!
//! The ports a profile module uses to reach the platform server, plus an
//! in-memory implementation for tests and local wiring.
//!
//! ## Message Flow
//!
//! ```text
//! ┌──────────────┐  send_message_response()   ┌──────────────┐
//! │   Module     │ ─────────────────────────→ │   Server     │
//! │  (client)    │ ←───────── response ────── │              │
//! │              │                            │              │
//! │              │ ←── handle_message() ───┐  │              │
//! └──────────────┘                         │  └──────────────┘
//!                                   ┌──────────────┐   │
//!                                   │  Dispatcher  │ ←─┘ notifications
//!                                   │ (one worker) │
//!                                   └──────────────┘
//! ```
//!
//! ## Rules
//!
//! - Each message group has at most one handler.
//! - Notifications reach a handler one at a time, from a single consumer.
//! - Round trips are bounded by the caller's timeout.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod handler;
pub mod memory;
pub mod transport;

// Re-export main types
pub use handler::{BusError, BusResult, GroupHandlerRegistry, MessageGroupHandler};
pub use memory::{BusStats, InMemoryMessageBus};
pub use transport::{MessageTransport, RequestResponder, TransportError};

/// Address the in-memory server answers on unless told otherwise.
pub const DEFAULT_SERVER_ADDRESS_ID: u32 = 0x0000_0001;
