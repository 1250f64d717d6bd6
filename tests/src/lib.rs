//! # GLPM Test Suite
//!
//! Workspace test crate for the glucose profile manager client.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support/          # Fixtures, simulated server, log setup
//! │   ├── logging.rs
//! │   └── server.rs
//! │
//! └── integration/      # Cross-crate scenarios
//!     ├── lifecycle.rs
//!     ├── procedures.rs
//!     ├── link_loss.rs
//!     └── worker.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p glpm-tests
//!
//! # With engine logs
//! RUST_LOG=glpm_client=trace cargo test -p glpm-tests -- --nocapture
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod integration;
pub mod support;
