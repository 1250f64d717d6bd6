//! # Core Entities
//!
//! Small value types shared by every profile module of the platform
//! manager.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 48-bit Bluetooth device address, stored least significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BdAddr(pub [u8; 6]);

impl BdAddr {
    /// The all-zero address, never a valid remote device.
    pub const NULL: BdAddr = BdAddr([0u8; 6]);

    /// Build an address from its six bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// True for the all-zero address.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 6]
    }

    /// Raw bytes, least significant first.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl From<[u8; 6]> for BdAddr {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}
