//! # GLPM Integration Scenarios
//!
//! End-to-end runs of the glucose manager against the in-memory bus and a
//! simulated glucose server:
//!
//! - lifecycle: module registry, shutdown with live state, restart
//! - procedures: procedure correlation, ownership, failed aborts
//! - link_loss: server restarts and unresponsive servers
//! - worker: notifications through the single-consumer worker

pub mod lifecycle;
pub mod link_loss;
pub mod procedures;
