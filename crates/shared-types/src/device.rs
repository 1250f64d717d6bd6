//! # Device Manager Port
//!
//! Local controller power notifications, fanned out to every module.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Device manager events a module may care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevicePowerEvent {
    /// The local controller finished powering up.
    PoweredOn,
    /// The local controller is about to power down.
    PoweringOff,
    /// The local controller is powered down.
    PoweredOff,
    /// Any other device manager event (property changes, discovery, ...).
    Other,
}

/// Query side of the device manager.
pub trait DeviceManager: Send + Sync {
    /// True if the local controller is currently powered.
    fn query_power_state(&self) -> bool;
}

/// A device manager whose power state is set explicitly.
#[derive(Debug, Default)]
pub struct SharedPowerState {
    powered: AtomicBool,
}

impl SharedPowerState {
    pub fn new(powered: bool) -> Self {
        Self {
            powered: AtomicBool::new(powered),
        }
    }

    pub fn set_powered(&self, powered: bool) {
        self.powered.store(powered, Ordering::SeqCst);
    }
}

impl DeviceManager for SharedPowerState {
    fn query_power_state(&self) -> bool {
        self.powered.load(Ordering::SeqCst)
    }
}
