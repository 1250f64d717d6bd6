//! Identifier types and the wrapping ID allocator.
//!
//! Local IDs handed to the application are positive 31-bit values. Zero
//! is never valid and means "none". Remote IDs are whatever the server
//! assigned; they only need to be nonzero.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest bit of a 32-bit ID; never set on a local ID.
const ID_HIGH_BIT: u32 = 0x8000_0000;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw ID value.
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> u32 {
                self.0
            }

            /// Zero is the "none" value.
            pub const fn is_valid(&self) -> bool {
                self.0 != 0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Local handle for one event subscription.
    CallbackId
);
define_id!(
    /// Local handle for one outstanding procedure.
    ProcedureId
);
define_id!(
    /// Server-side handle for a subscription.
    RemoteHandlerId
);
define_id!(
    /// Server-side handle for a procedure.
    RemoteProcedureId
);

/// Hands out local IDs in sequence, wrapping back to 1.
///
/// `next()` returns the current value and advances. The counter skips 0
/// and never sets the high bit, so every issued ID is in `1..=0x7FFF_FFFF`.
#[derive(Debug)]
pub struct IdAllocator<T> {
    next: u32,
    _marker: std::marker::PhantomData<T>,
}

impl<T: From<u32>> IdAllocator<T> {
    pub fn new() -> Self {
        Self {
            next: 1,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn next(&mut self) -> T {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        if self.next == 0 || self.next & ID_HIGH_BIT != 0 {
            self.next = 1;
        }
        T::from(id)
    }

    /// Value the next call to `next()` will return.
    pub fn peek(&self) -> u32 {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }

    #[cfg(test)]
    pub(crate) fn set_next(&mut self, next: u32) {
        self.next = next;
    }
}

impl<T: From<u32>> Default for IdAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}
