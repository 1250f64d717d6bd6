//! # Glucose Manager Metrics
//!
//! Lock-free counters for the notification path and the server link.
//!
//! ## Counters
//!
//! - `notifications_received` - Glucose group messages seen by the handler
//! - `notifications_dropped` - Messages discarded (response-flagged, short, undecodable, unmatched)
//! - `events_delivered` - Callback invocations that returned normally
//! - `callback_panics` - Callback invocations that panicked
//! - `round_trips_sent` - Requests sent to the server
//! - `round_trip_failures` - Requests that timed out or came back unusable
//! - `link_loss_resets` - Registry resets after the server dropped this client
//! - `broadcast_spills` - Broadcasts whose snapshot outgrew the inline buffer

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the manager, its handler and its server link.
#[derive(Debug, Default)]
pub struct GlpmStats {
    pub notifications_received: AtomicU64,
    pub notifications_dropped: AtomicU64,
    pub events_delivered: AtomicU64,
    pub callback_panics: AtomicU64,
    pub round_trips_sent: AtomicU64,
    pub round_trip_failures: AtomicU64,
    pub link_loss_resets: AtomicU64,
    pub broadcast_spills: AtomicU64,
}

impl GlpmStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.notifications_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.notifications_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one callback invocation.
    pub fn record_delivery(&self, panicked: bool) {
        if panicked {
            self.callback_panics.fetch_add(1, Ordering::Relaxed);
        } else {
            self.events_delivered.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_round_trip(&self) {
        self.round_trips_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_round_trip_failure(&self) {
        self.round_trip_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_link_loss(&self) {
        self.link_loss_resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_spill(&self) {
        self.broadcast_spills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GlpmStatsSnapshot {
        GlpmStatsSnapshot {
            notifications_received: self.notifications_received.load(Ordering::Relaxed),
            notifications_dropped: self.notifications_dropped.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            callback_panics: self.callback_panics.load(Ordering::Relaxed),
            round_trips_sent: self.round_trips_sent.load(Ordering::Relaxed),
            round_trip_failures: self.round_trip_failures.load(Ordering::Relaxed),
            link_loss_resets: self.link_loss_resets.load(Ordering::Relaxed),
            broadcast_spills: self.broadcast_spills.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`GlpmStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlpmStatsSnapshot {
    pub notifications_received: u64,
    pub notifications_dropped: u64,
    pub events_delivered: u64,
    pub callback_panics: u64,
    pub round_trips_sent: u64,
    pub round_trip_failures: u64,
    pub link_loss_resets: u64,
    pub broadcast_spills: u64,
}
