//! # Platform Module Trait
//!
//! Defines the contract every profile module implements to take part in
//! the platform manager lifecycle.
//!
//! ## Lifecycle
//!
//! ```text
//! [UNINITIALIZED] ──initialize()──→ [RUNNING] ──shutdown()──→ [UNINITIALIZED]
//!        ↑                                                          │
//!        └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed `initialize()` leaves the module exactly as it was before the
//! call. Device power events are fanned out to running modules only.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use shared_types::{DevicePowerEvent, ModuleResult, PlatformModule};
//!
//! pub struct MyModule { /* ... */ }
//!
//! impl PlatformModule for MyModule {
//!     fn name(&self) -> &'static str { "My Module" }
//!     fn initialize(&self) -> ModuleResult<()> { Ok(()) }
//!     fn shutdown(&self) {}
//!     fn is_initialized(&self) -> bool { true }
//! }
//! ```

use crate::device::DevicePowerEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Error type for module lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleError {
    /// The module that encountered the error.
    pub module: String,
    /// Error kind.
    pub kind: ModuleErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl ModuleError {
    pub fn new(module: impl Into<String>, kind: ModuleErrorKind, message: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.module, self.kind, self.message)
    }
}

impl std::error::Error for ModuleError {}

/// Categories of module errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleErrorKind {
    /// The module's guarded state could not be created.
    ResourceUnavailable,
    /// The module could not claim its message group.
    HandlerRegistrationFailed,
    /// The module's link to the server could not be brought up.
    LinkFailed,
    /// The module rejected its configuration.
    ConfigurationError,
}

impl fmt::Display for ModuleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceUnavailable => write!(f, "ResourceUnavailable"),
            Self::HandlerRegistrationFailed => write!(f, "HandlerRegistrationFailed"),
            Self::LinkFailed => write!(f, "LinkFailed"),
            Self::ConfigurationError => write!(f, "ConfigurationError"),
        }
    }
}

/// Result type for module lifecycle operations.
pub type ModuleResult<T> = Result<T, ModuleError>;

/// The trait every profile module implements.
pub trait PlatformModule: Send + Sync {
    /// Human-readable module name.
    fn name(&self) -> &'static str;

    /// Bring the module up. A no-op success if it is already running.
    fn initialize(&self) -> ModuleResult<()>;

    /// Tear the module down. A no-op if it is not running.
    fn shutdown(&self);

    /// True while the module is running.
    fn is_initialized(&self) -> bool;

    /// Handle a device manager event. Default implementation ignores it.
    fn on_device_event(&self, _event: DevicePowerEvent) {}
}

/// A shared, type-erased module handle.
pub type DynModule = Arc<dyn PlatformModule>;
