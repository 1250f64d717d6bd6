//! Glucose Manager - lifecycle controller and public API
//!
//! ```text
//! [UNINITIALIZED] ──initialize()──→ [RUNNING] ──shutdown()──→ [UNINITIALIZED]
//! ```
//!
//! `initialize()` is all-or-nothing: on failure the message group is
//! released again and no context survives. A context lives for exactly one
//! running period; API calls clone it out of the slot and work on it
//! without holding the slot lock.

use crate::config::GlpmConfig;
use crate::context::GlpmContext;
use crate::domain::events::EventCallback;
use crate::domain::ids::{CallbackId, ProcedureId};
use crate::domain::registry::Transaction;
use crate::domain::types::ProcedureData;
use crate::error::{GlpmError, GlpmResult};
use crate::ipc::handler::GlpmGroupHandler;
use crate::ipc::messages::MESSAGE_GROUP_GLUCOSE_MANAGER;
use crate::ipc::requests::ServerLink;
use crate::metrics::{GlpmStats, GlpmStatsSnapshot};
use crate::ports::inbound::GlucoseManagerApi;
use crate::ports::outbound::{SharedDeviceManager, SharedHandlerRegistry, SharedTransport};
use parking_lot::RwLock;
use shared_types::{
    BdAddr, DevicePowerEvent, ModuleError, ModuleErrorKind, ModuleResult, PlatformModule,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name the module reports to the module registry.
pub const MODULE_NAME: &str = "GLPM";

/// The Glucose Profile Manager client module.
pub struct GlucoseManager {
    config: GlpmConfig,
    transport: SharedTransport,
    handlers: SharedHandlerRegistry,
    device_manager: SharedDeviceManager,
    /// `Some` while running.
    context: RwLock<Option<Arc<GlpmContext>>>,
    stats: Arc<GlpmStats>,
}

impl GlucoseManager {
    pub fn new(
        config: GlpmConfig,
        transport: SharedTransport,
        handlers: SharedHandlerRegistry,
        device_manager: SharedDeviceManager,
    ) -> Self {
        Self {
            config,
            transport,
            handlers,
            device_manager,
            context: RwLock::new(None),
            stats: Arc::new(GlpmStats::new()),
        }
    }

    pub fn config(&self) -> &GlpmConfig {
        &self.config
    }

    /// Bring the module up. A no-op if it is already running.
    ///
    /// Steps, each undone if a later one fails:
    /// 1. allocate the guarded state
    /// 2. claim the glucose message group
    /// 3. bring up the server link
    /// 4. seed the power state and go live
    pub fn initialize(&self) -> GlpmResult<()> {
        let mut slot = self.context.write();
        if slot.is_some() {
            debug!("[GLPM] Already initialized");
            return Ok(());
        }
        self.config.validate()?;

        let link = ServerLink::new(
            self.transport.clone(),
            self.config.response_timeout(),
            self.stats.clone(),
        );
        let context = Arc::new(GlpmContext::new(&self.config, link, self.stats.clone())?);

        let handler = Arc::new(GlpmGroupHandler::new(context.clone()));
        self.handlers
            .register_group_handler(MESSAGE_GROUP_GLUCOSE_MANAGER, handler)
            .map_err(|e| {
                warn!(error = %e, "[GLPM] Unable to claim message group");
                GlpmError::CannotRegisterHandler {
                    group: MESSAGE_GROUP_GLUCOSE_MANAGER,
                }
            })?;

        if let Err(e) = context.link().initialize() {
            self.handlers
                .unregister_group_handler(MESSAGE_GROUP_GLUCOSE_MANAGER);
            return Err(e);
        }

        let powered = self.device_manager.query_power_state();
        context.start(powered);
        *slot = Some(context);

        info!(powered, "[GLPM] Initialized");
        Ok(())
    }

    /// Tear the module down. A no-op if it is not running.
    ///
    /// Every subscription is un-registered with the server (best effort)
    /// before local state is dropped.
    pub fn shutdown(&self) {
        let mut slot = self.context.write();
        let Some(context) = slot.take() else {
            return;
        };

        self.handlers
            .unregister_group_handler(MESSAGE_GROUP_GLUCOSE_MANAGER);
        context.stop();
        info!("[GLPM] Shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.context.read().is_some()
    }

    /// Track the local controller's power state.
    pub fn handle_device_event(&self, event: DevicePowerEvent) {
        let Some(context) = self.context.read().clone() else {
            return;
        };
        match event {
            DevicePowerEvent::PoweredOn => context.set_powered(true),
            DevicePowerEvent::PoweringOff | DevicePowerEvent::PoweredOff => {
                context.set_powered(false)
            }
            DevicePowerEvent::Other => {}
        }
    }

    /// Last known power state of the local controller. False when not
    /// running.
    pub fn is_powered(&self) -> bool {
        match self.running_context() {
            Ok(context) => context.lock().powered,
            Err(_) => false,
        }
    }

    pub fn stats(&self) -> GlpmStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn subscription_count(&self) -> usize {
        self.running_context()
            .map(|context| context.lock().subscriptions.len())
            .unwrap_or(0)
    }

    pub fn outstanding_procedures(&self) -> usize {
        self.running_context()
            .map(|context| context.lock().transactions.len())
            .unwrap_or(0)
    }

    /// Look up an outstanding procedure by its local ID.
    pub fn procedure(&self, procedure_id: ProcedureId) -> Option<Transaction> {
        let context = self.running_context().ok()?;
        let state = context.lock();
        state.transactions.find_by_local(procedure_id).copied()
    }

    fn running_context(&self) -> GlpmResult<Arc<GlpmContext>> {
        self.context
            .read()
            .as_ref()
            .filter(|context| context.is_running())
            .cloned()
            .ok_or(GlpmError::NotInitialized)
    }
}

impl GlucoseManagerApi for GlucoseManager {
    fn register_event_callback(&self, callback: Arc<dyn EventCallback>) -> GlpmResult<CallbackId> {
        let context = self.running_context()?;
        let mut state = context.lock_running()?;

        let callback_id = state.subscriptions.insert(callback)?;
        match context.link().register_collector_events() {
            Ok(handler_id) => {
                state.subscriptions.bind_remote(callback_id, handler_id);
                info!(
                    callback_id = %callback_id,
                    handler_id = %handler_id,
                    "[GLPM] Event callback registered"
                );
                Ok(callback_id)
            }
            Err(e) => {
                state.subscriptions.remove(callback_id);
                Err(e)
            }
        }
    }

    fn unregister_event_callback(&self, callback_id: CallbackId) {
        if !callback_id.is_valid() {
            return;
        }
        let Ok(context) = self.running_context() else {
            return;
        };
        let removed = match context.lock_running() {
            Ok(mut state) => state.subscriptions.remove(callback_id),
            Err(_) => return,
        };
        let Some(subscription) = removed else {
            debug!(callback_id = %callback_id, "[GLPM] Unregister of unknown callback");
            return;
        };

        if let Some(handler_id) = subscription.remote_handler_id {
            if let Err(e) = context.link().unregister_collector_events(handler_id) {
                warn!(
                    callback_id = %callback_id,
                    error = %e,
                    "[GLPM] Server un-registration failed"
                );
            }
        }
        info!(callback_id = %callback_id, "[GLPM] Event callback unregistered");
    }

    fn start_procedure(
        &self,
        callback_id: CallbackId,
        address: BdAddr,
        procedure: &ProcedureData,
    ) -> GlpmResult<ProcedureId> {
        let context = self.running_context()?;
        if !callback_id.is_valid() {
            return Err(GlpmError::invalid("callback ID is zero"));
        }
        procedure.validate()?;

        let mut state = context.lock_running()?;
        let handler_id = state
            .subscriptions
            .find(callback_id)
            .and_then(|s| s.remote_handler_id)
            .ok_or(GlpmError::InvalidCallback { callback_id })?;

        let local_id = state.transactions.begin(callback_id)?;
        let started = context
            .link()
            .start_procedure(handler_id, address, procedure)
            .and_then(|remote_id| {
                state
                    .transactions
                    .bind_remote(local_id, remote_id)
                    .map(|()| remote_id)
            });

        match started {
            Ok(remote_id) => {
                debug!(
                    procedure_id = %local_id,
                    remote_procedure_id = %remote_id,
                    procedure_type = ?procedure.procedure_type,
                    "[GLPM] Procedure started"
                );
                Ok(local_id)
            }
            Err(e) => {
                state.transactions.end(local_id);
                Err(e)
            }
        }
    }

    fn stop_procedure(
        &self,
        callback_id: CallbackId,
        address: BdAddr,
        procedure_id: ProcedureId,
    ) -> GlpmResult<()> {
        let context = self.running_context()?;
        if !callback_id.is_valid() || !procedure_id.is_valid() {
            return Err(GlpmError::invalid("callback or procedure ID is zero"));
        }

        let state = context.lock_running()?;
        let handler_id = state
            .subscriptions
            .find(callback_id)
            .and_then(|s| s.remote_handler_id)
            .ok_or(GlpmError::InvalidCallback { callback_id })?;
        let remote_id = state
            .transactions
            .find_by_local(procedure_id)
            .filter(|t| t.owner == callback_id)
            .and_then(|t| t.remote_id)
            .ok_or_else(|| {
                GlpmError::invalid(format!(
                    "procedure {procedure_id} is not outstanding for callback {callback_id}"
                ))
            })?;

        context.link().stop_procedure(handler_id, address, remote_id)?;
        drop(state);

        debug!(procedure_id = %procedure_id, "[GLPM] Stop requested");
        Ok(())
    }
}

impl PlatformModule for GlucoseManager {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn initialize(&self) -> ModuleResult<()> {
        GlucoseManager::initialize(self).map_err(|e| {
            let kind = match e {
                GlpmError::CannotCreateLock { .. } => ModuleErrorKind::ResourceUnavailable,
                GlpmError::CannotRegisterHandler { .. } => ModuleErrorKind::HandlerRegistrationFailed,
                GlpmError::InvalidParameter { .. } => ModuleErrorKind::ConfigurationError,
                _ => ModuleErrorKind::LinkFailed,
            };
            ModuleError::new(MODULE_NAME, kind, e.to_string())
        })
    }

    fn shutdown(&self) {
        GlucoseManager::shutdown(self);
    }

    fn is_initialized(&self) -> bool {
        GlucoseManager::is_initialized(self)
    }

    fn on_device_event(&self, event: DevicePowerEvent) {
        self.handle_device_event(event);
    }
}
