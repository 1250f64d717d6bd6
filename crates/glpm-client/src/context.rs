//! Guarded module state shared by the API, the group handler and the
//! dispatcher.
//!
//! One mutex covers both registries, their allocators and the cached
//! power state. The running flag is only written while that mutex is held,
//! so a caller holding the lock sees a stable value.

use crate::config::GlpmConfig;
use crate::domain::registry::{SubscriptionRegistry, TransactionRegistry};
use crate::error::{GlpmError, GlpmResult};
use crate::ipc::requests::ServerLink;
use crate::metrics::GlpmStats;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the module lock protects.
#[derive(Debug)]
pub(crate) struct ManagerState {
    pub subscriptions: SubscriptionRegistry,
    pub transactions: TransactionRegistry,
    pub powered: bool,
}

impl ManagerState {
    fn clear_registries(&mut self) {
        self.subscriptions.clear();
        self.transactions.clear();
    }
}

/// State of one initialized lifetime of the module.
pub(crate) struct GlpmContext {
    state: Mutex<ManagerState>,
    running: AtomicBool,
    link: ServerLink,
    stats: Arc<GlpmStats>,
}

impl GlpmContext {
    /// Allocate the guarded state. Fails with `CannotCreateLock` if the
    /// registries cannot reserve their initial capacity.
    pub fn new(config: &GlpmConfig, link: ServerLink, stats: Arc<GlpmStats>) -> GlpmResult<Self> {
        let capacity = config.initial_registry_capacity;
        Ok(Self {
            state: Mutex::new(ManagerState {
                subscriptions: SubscriptionRegistry::new(),
                transactions: TransactionRegistry::with_capacity(capacity)?,
                powered: false,
            }),
            running: AtomicBool::new(false),
            link,
            stats,
        })
    }

    pub fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock()
    }

    /// Take the module lock, failing if the module stopped running.
    pub fn lock_running(&self) -> GlpmResult<MutexGuard<'_, ManagerState>> {
        let state = self.state.lock();
        if !self.is_running() {
            return Err(GlpmError::NotInitialized);
        }
        Ok(state)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn link(&self) -> &ServerLink {
        &self.link
    }

    pub fn stats(&self) -> &GlpmStats {
        &self.stats
    }

    /// Seed the power state, restart both allocators and go live.
    pub fn start(&self, powered: bool) {
        let mut state = self.state.lock();
        state.subscriptions.reset_ids();
        state.transactions.reset_ids();
        state.powered = powered;
        self.running.store(true, Ordering::SeqCst);
    }

    /// Release every server-side registration, then drop all local state.
    ///
    /// Un-registration is best effort; failures are logged and ignored.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        for subscription in state.subscriptions.iter() {
            let Some(handler_id) = subscription.remote_handler_id else {
                continue;
            };
            if let Err(e) = self.link.unregister_collector_events(handler_id) {
                warn!(
                    callback_id = %subscription.callback_id,
                    handler_id = %handler_id,
                    error = %e,
                    "[GLPM] Un-registration failed during shutdown"
                );
            }
        }
        self.link.cleanup();
        state.clear_registries();
        state.powered = false;
        self.running.store(false, Ordering::SeqCst);
    }

    /// The server dropped this client: every remote handle is gone.
    ///
    /// Clears both registries without contacting the server.
    pub fn reset_after_link_loss(&self) {
        let mut state = self.state.lock();
        if !self.is_running() {
            return;
        }
        info!(
            subscriptions = state.subscriptions.len(),
            transactions = state.transactions.len(),
            "[GLPM] Server link lost, clearing registries"
        );
        state.clear_registries();
        self.stats.record_link_loss();
    }

    pub fn set_powered(&self, powered: bool) {
        let mut state = self.state.lock();
        if self.is_running() {
            state.powered = powered;
        }
    }
}
