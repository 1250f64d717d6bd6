//! # Notification Dispatcher
//!
//! Turns glucose notifications into callback invocations.
//!
//! ```text
//! Connected / Disconnected ──→ snapshot all callbacks ──→ invoke each
//!                                 (under lock)            (lock released)
//!
//! ProcedureStarted / ProcedureStopped / GlucoseMeasurement
//!        │
//!        └─→ find_by_remote ─→ owner subscription ─→ maybe end ─→ invoke
//!                     (all under lock)                          (lock released)
//! ```
//!
//! A callback may call back into the manager, including `shutdown()`.
//! Broadcast delivery stops as soon as the module is no longer running.

use super::messages::{DropReason, Notification};
use crate::context::GlpmContext;
use crate::domain::events::{EventCallback, GlpmEvent};
use crate::domain::ids::{ProcedureId, RemoteProcedureId};
use crate::domain::registry::Subscription;
use crate::domain::types::{MeasurementMessageFlags, ProcedureType, ResponseCode};
use shared_types::Message;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Callbacks a broadcast snapshot holds without a heap allocation.
pub const BROADCAST_INLINE_CAPACITY: usize = 16;

type SharedCallback = Arc<dyn EventCallback>;

/// Callbacks copied out of the registry for delivery after the lock is
/// released.
enum CallbackSnapshot {
    Inline {
        slots: [Option<SharedCallback>; BROADCAST_INLINE_CAPACITY],
        len: usize,
    },
    Spilled(Vec<SharedCallback>),
}

impl CallbackSnapshot {
    fn capture<'a>(subscriptions: impl ExactSizeIterator<Item = &'a Subscription>) -> Self {
        if subscriptions.len() > BROADCAST_INLINE_CAPACITY {
            return Self::Spilled(subscriptions.map(|s| s.callback.clone()).collect());
        }
        let mut slots: [Option<SharedCallback>; BROADCAST_INLINE_CAPACITY] =
            std::array::from_fn(|_| None);
        let mut len = 0;
        for (slot, subscription) in slots.iter_mut().zip(subscriptions) {
            *slot = Some(subscription.callback.clone());
            len += 1;
        }
        Self::Inline { slots, len }
    }

    fn is_spilled(&self) -> bool {
        matches!(self, Self::Spilled(_))
    }

    fn len(&self) -> usize {
        match self {
            Self::Inline { len, .. } => *len,
            Self::Spilled(callbacks) => callbacks.len(),
        }
    }

    /// Visit callbacks in order until `f` returns false.
    fn for_each_while(&self, mut f: impl FnMut(&SharedCallback) -> bool) {
        match self {
            Self::Inline { slots, len } => {
                for callback in slots[..*len].iter().flatten() {
                    if !f(callback) {
                        return;
                    }
                }
            }
            Self::Spilled(callbacks) => {
                for callback in callbacks {
                    if !f(callback) {
                        return;
                    }
                }
            }
        }
    }
}

/// How a notification affects the transaction it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Keep,
    End,
}

/// Routes decoded notifications to subscriptions.
pub(crate) struct Dispatcher {
    context: Arc<GlpmContext>,
}

impl Dispatcher {
    pub fn new(context: Arc<GlpmContext>) -> Self {
        Self { context }
    }

    /// Handle one module-function message of the glucose group.
    pub fn process(&self, message: &Message) {
        self.context.stats().record_received();

        let notification = match Notification::parse(message) {
            Ok(notification) => notification,
            Err(reason) => {
                self.discard(&reason);
                return;
            }
        };

        match notification {
            Notification::Connected(m) => self.broadcast(GlpmEvent::Connected {
                address: m.address,
                connection_type: m.connection_type,
                supported_features: m.supported_features,
            }),
            Notification::Disconnected(m) => self.broadcast(GlpmEvent::Disconnected {
                address: m.address,
                connection_type: m.connection_type,
            }),
            Notification::ProcedureStarted(m) => {
                let completion = if m.success {
                    Completion::Keep
                } else {
                    Completion::End
                };
                self.deliver_to_owner(m.procedure_id, completion, |procedure_id| {
                    GlpmEvent::ProcedureStarted {
                        address: m.address,
                        procedure_id,
                        success: m.success,
                        att_error_code: m.att_error_code,
                    }
                });
            }
            Notification::ProcedureStopped(m) => {
                // A failed abort leaves the aborted procedure running.
                let failed_abort = m.procedure_type == ProcedureType::AbortProcedure
                    && m.response_code != ResponseCode::Success;
                let completion = if failed_abort {
                    Completion::Keep
                } else {
                    Completion::End
                };
                self.deliver_to_owner(m.procedure_id, completion, |procedure_id| {
                    GlpmEvent::ProcedureStopped {
                        address: m.address,
                        procedure_id,
                        procedure_type: m.procedure_type,
                        response_code: m.response_code,
                        number_stored_records: m.number_stored_records,
                    }
                });
            }
            Notification::GlucoseMeasurement(m) => {
                self.deliver_to_owner(m.procedure_id, Completion::Keep, |procedure_id| {
                    GlpmEvent::GlucoseMeasurement {
                        address: m.address,
                        procedure_id,
                        error_type: m.error_type,
                        measurement: m
                            .message_flags
                            .contains(MeasurementMessageFlags::MEASUREMENT_DATA_PRESENT)
                            .then_some(m.measurement),
                        context: m
                            .message_flags
                            .contains(MeasurementMessageFlags::CONTEXT_DATA_PRESENT)
                            .then_some(m.context),
                    }
                });
            }
        }
    }

    fn discard(&self, reason: &DropReason) {
        self.context.stats().record_dropped();
        match reason {
            DropReason::ResponseFlagged => trace!("[GLPM] Ignoring response-flagged message"),
            DropReason::UnknownFunction(function) => {
                debug!(function = *function, "[GLPM] Unknown function")
            }
            DropReason::Truncated {
                function,
                expected,
                actual,
            } => debug!(
                function = *function,
                expected = *expected,
                actual = *actual,
                "[GLPM] Notification too short"
            ),
            DropReason::Malformed { function, reason } => debug!(
                function = *function,
                reason = %reason,
                "[GLPM] Notification undecodable"
            ),
        }
    }

    /// Deliver `event` to every subscription.
    fn broadcast(&self, event: GlpmEvent) {
        let snapshot = {
            let Ok(state) = self.context.lock_running() else {
                return;
            };
            CallbackSnapshot::capture(state.subscriptions.iter())
        };
        if snapshot.is_spilled() {
            self.context.stats().record_spill();
        }

        trace!(kind = ?event.kind(), subscribers = snapshot.len(), "[GLPM] Broadcasting");
        snapshot.for_each_while(|callback| {
            if !self.context.is_running() {
                return false;
            }
            self.invoke(callback, &event);
            true
        });
    }

    /// Deliver an event to the subscription that owns the procedure the
    /// server knows as `remote_id`.
    fn deliver_to_owner(
        &self,
        remote_id: u32,
        completion: Completion,
        build: impl FnOnce(ProcedureId) -> GlpmEvent,
    ) {
        let remote_id = RemoteProcedureId::from_raw(remote_id);
        let target = {
            let Ok(mut state) = self.context.lock_running() else {
                return;
            };
            let Some(transaction) = state.transactions.find_by_remote(remote_id).copied() else {
                debug!(remote_procedure_id = %remote_id, "[GLPM] No transaction for notification");
                self.context.stats().record_dropped();
                return;
            };
            let callback = state
                .subscriptions
                .find(transaction.owner)
                .map(|s| s.callback.clone());
            // Unlike an unknown remote ID, an ending notification still
            // closes the transaction when its owner is gone. Only the event
            // is dropped.
            if completion == Completion::End {
                state.transactions.end(transaction.local_id);
            }
            callback.map(|callback| (callback, transaction.local_id))
        };

        match target {
            Some((callback, local_id)) => self.invoke(&callback, &build(local_id)),
            None => {
                debug!(remote_procedure_id = %remote_id, "[GLPM] Transaction owner is gone");
                self.context.stats().record_dropped();
            }
        }
    }

    fn invoke(&self, callback: &SharedCallback, event: &GlpmEvent) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback.on_event(event)));
        if outcome.is_err() {
            error!(kind = ?event.kind(), "[GLPM] Event callback panicked");
        }
        self.context.stats().record_delivery(outcome.is_err());
    }
}
