//! # Module Registry - Platform Lifecycle Driver
//!
//! Holds the profile modules of a platform manager instance and drives
//! their lifecycle.
//!
//! ## Features
//!
//! - **Ordered startup**: modules initialize in registration order
//! - **All-or-nothing**: a failed startup shuts down the modules already started
//! - **Reverse shutdown**: modules shut down in reverse registration order
//! - **Power fan-out**: device events reach every running module
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = ModuleRegistry::new();
//! registry.register(Arc::new(GlucoseManager::new(...)));
//!
//! registry.initialize_all()?;
//! registry.dispatch_device_event(DevicePowerEvent::PoweredOn);
//! registry.shutdown_all();
//! ```

use crate::device::DevicePowerEvent;
use crate::module::{DynModule, ModuleResult};
use parking_lot::RwLock;
use tracing::{error, info, warn};

/// Registry of platform modules.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: RwLock<Vec<DynModule>>,
}

impl ModuleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. It is initialized by the next `initialize_all()`.
    pub fn register(&self, module: DynModule) {
        info!("[Registry] Registering module {}", module.name());

        let mut modules = self.modules.write();
        if modules.iter().any(|m| m.name() == module.name()) {
            warn!("[Registry] Module {} registered twice", module.name());
        }
        modules.push(module);
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }

    /// Names of the modules currently running.
    pub fn initialized_modules(&self) -> Vec<&'static str> {
        self.modules
            .read()
            .iter()
            .filter(|m| m.is_initialized())
            .map(|m| m.name())
            .collect()
    }

    /// Initialize every module in registration order.
    ///
    /// On the first failure, modules started by this call are shut down in
    /// reverse order and the error is returned.
    pub fn initialize_all(&self) -> ModuleResult<()> {
        let modules = self.modules.read().clone();
        info!("[Registry] Initializing {} modules", modules.len());

        let mut started: Vec<DynModule> = Vec::with_capacity(modules.len());
        for module in modules {
            let was_running = module.is_initialized();
            if let Err(e) = module.initialize() {
                error!("[Registry] ✗ {} failed to initialize: {}", module.name(), e);
                for done in started.iter().rev() {
                    done.shutdown();
                }
                return Err(e);
            }
            if !was_running {
                started.push(module.clone());
            }
            info!("[Registry] ✓ {} initialized", module.name());
        }

        Ok(())
    }

    /// Shut every module down in reverse registration order.
    pub fn shutdown_all(&self) {
        let modules = self.modules.read().clone();
        info!("[Registry] Shutting down all modules");

        for module in modules.iter().rev() {
            if module.is_initialized() {
                module.shutdown();
                info!("[Registry] ✓ {} shut down", module.name());
            }
        }
    }

    /// Deliver a device event to every running module.
    pub fn dispatch_device_event(&self, event: DevicePowerEvent) {
        let modules = self.modules.read().clone();
        for module in modules.iter().filter(|m| m.is_initialized()) {
            module.on_device_event(event);
        }
    }
}
