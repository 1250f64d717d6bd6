//! Subscription and transaction registries.
//!
//! Both registries live inside the module lock; nothing here is
//! synchronized on its own. Each owns the allocator for its local IDs.
//!
//! ```text
//! Subscription ── callback_id ──┐
//!   remote_handler_id           │ owner
//!                               ▼
//! Transaction { local_id, remote_id, owner }
//!        ▲                 ▲
//!   find_by_local     find_by_remote  (server notifications)
//! ```

use super::events::EventCallback;
use super::ids::{CallbackId, IdAllocator, ProcedureId, RemoteHandlerId, RemoteProcedureId};
use crate::error::{GlpmError, GlpmResult};
use std::collections::btree_map::{self, Entry};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One registered event callback.
#[derive(Clone)]
pub struct Subscription {
    pub callback_id: CallbackId,
    /// Set once the server has accepted the registration.
    pub remote_handler_id: Option<RemoteHandlerId>,
    pub callback: Arc<dyn EventCallback>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("callback_id", &self.callback_id)
            .field("remote_handler_id", &self.remote_handler_id)
            .finish_non_exhaustive()
    }
}

/// Live subscriptions keyed by callback ID.
#[derive(Debug)]
pub struct SubscriptionRegistry {
    entries: BTreeMap<CallbackId, Subscription>,
    ids: IdAllocator<CallbackId>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            ids: IdAllocator::new(),
        }
    }

    /// Add a subscription under a freshly allocated callback ID.
    pub fn insert(&mut self, callback: Arc<dyn EventCallback>) -> GlpmResult<CallbackId> {
        let callback_id = self.ids.next();
        match self.entries.entry(callback_id) {
            Entry::Occupied(_) => Err(GlpmError::AllocationFailure {
                reason: format!("callback ID {callback_id} still in use"),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Subscription {
                    callback_id,
                    remote_handler_id: None,
                    callback,
                });
                Ok(callback_id)
            }
        }
    }

    /// Record the server's handle for a subscription.
    pub fn bind_remote(&mut self, callback_id: CallbackId, handler_id: RemoteHandlerId) -> bool {
        match self.entries.get_mut(&callback_id) {
            Some(entry) => {
                entry.remote_handler_id = Some(handler_id);
                true
            }
            None => false,
        }
    }

    pub fn find(&self, callback_id: CallbackId) -> Option<&Subscription> {
        self.entries.get(&callback_id)
    }

    pub fn remove(&mut self, callback_id: CallbackId) -> Option<Subscription> {
        self.entries.remove(&callback_id)
    }

    /// Subscriptions in ascending callback ID order.
    pub fn iter(&self) -> btree_map::Values<'_, CallbackId, Subscription> {
        self.entries.values()
    }

    /// Drop every subscription. Allocator state is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn reset_ids(&mut self) {
        self.ids.reset();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn ids_mut(&mut self) -> &mut IdAllocator<CallbackId> {
        &mut self.ids
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// One outstanding procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub local_id: ProcedureId,
    /// Set once the server has accepted the start request.
    pub remote_id: Option<RemoteProcedureId>,
    /// Subscription that started the procedure.
    pub owner: CallbackId,
}

/// Outstanding procedures, indexed by local and by remote ID.
#[derive(Debug)]
pub struct TransactionRegistry {
    entries: HashMap<ProcedureId, Transaction>,
    by_remote: HashMap<RemoteProcedureId, ProcedureId>,
    ids: IdAllocator<ProcedureId>,
}

impl TransactionRegistry {
    pub fn with_capacity(capacity: usize) -> GlpmResult<Self> {
        let mut entries = HashMap::new();
        let mut by_remote = HashMap::new();
        let reserve = |e: std::collections::TryReserveError| GlpmError::CannotCreateLock {
            reason: e.to_string(),
        };
        entries.try_reserve(capacity).map_err(reserve)?;
        by_remote.try_reserve(capacity).map_err(reserve)?;
        Ok(Self {
            entries,
            by_remote,
            ids: IdAllocator::new(),
        })
    }

    /// Open a transaction for `owner` under a fresh local ID.
    pub fn begin(&mut self, owner: CallbackId) -> GlpmResult<ProcedureId> {
        let local_id = self.ids.next();
        if self.entries.contains_key(&local_id) {
            return Err(GlpmError::AllocationFailure {
                reason: format!("procedure ID {local_id} still in use"),
            });
        }
        self.entries.try_reserve(1).map_err(|e| GlpmError::AllocationFailure {
            reason: e.to_string(),
        })?;

        self.entries.insert(
            local_id,
            Transaction {
                local_id,
                remote_id: None,
                owner,
            },
        );
        Ok(local_id)
    }

    /// Attach the server's procedure ID to an open transaction.
    ///
    /// A remote ID may belong to one live transaction only.
    pub fn bind_remote(
        &mut self,
        local_id: ProcedureId,
        remote_id: RemoteProcedureId,
    ) -> GlpmResult<()> {
        if let Some(existing) = self.by_remote.get(&remote_id) {
            if *existing != local_id {
                return Err(GlpmError::AllocationFailure {
                    reason: format!("remote procedure ID {remote_id} already bound to {existing}"),
                });
            }
        }
        let entry = self
            .entries
            .get_mut(&local_id)
            .ok_or_else(|| GlpmError::invalid(format!("no transaction {local_id}")))?;

        if let Some(previous) = entry.remote_id.replace(remote_id) {
            self.by_remote.remove(&previous);
        }
        self.by_remote.insert(remote_id, local_id);
        Ok(())
    }

    pub fn find_by_local(&self, local_id: ProcedureId) -> Option<&Transaction> {
        self.entries.get(&local_id)
    }

    pub fn find_by_remote(&self, remote_id: RemoteProcedureId) -> Option<&Transaction> {
        self.by_remote
            .get(&remote_id)
            .and_then(|local_id| self.entries.get(local_id))
    }

    /// Close a transaction, returning it if it was open.
    pub fn end(&mut self, local_id: ProcedureId) -> Option<Transaction> {
        let transaction = self.entries.remove(&local_id)?;
        if let Some(remote_id) = transaction.remote_id {
            self.by_remote.remove(&remote_id);
        }
        Some(transaction)
    }

    /// Drop every transaction. Allocator state is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_remote.clear();
    }

    pub fn reset_ids(&mut self) {
        self.ids.reset();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn ids_mut(&mut self) -> &mut IdAllocator<ProcedureId> {
        &mut self.ids
    }
}
