//! Driving Ports (API - Inbound)

use crate::domain::events::EventCallback;
use crate::domain::ids::{CallbackId, ProcedureId};
use crate::domain::types::ProcedureData;
use crate::error::GlpmResult;
use shared_types::BdAddr;
use std::sync::Arc;

/// Primary Glucose Manager API
///
/// Every operation fails with `NotInitialized` unless the module is
/// running. Operations that talk to the server block the caller for at
/// most one round trip.
pub trait GlucoseManagerApi: Send + Sync {
    /// Subscribe `callback` to collector events.
    ///
    /// The server registration happens before this returns. On failure no
    /// subscription is left behind.
    fn register_event_callback(&self, callback: Arc<dyn EventCallback>) -> GlpmResult<CallbackId>;

    /// Remove a subscription. Unknown or zero IDs are ignored, as is a
    /// failed server un-registration.
    fn unregister_event_callback(&self, callback_id: CallbackId);

    /// Start a record access procedure on the sensor at `address`.
    ///
    /// Returns the local procedure ID that later events will carry.
    fn start_procedure(
        &self,
        callback_id: CallbackId,
        address: BdAddr,
        procedure: &ProcedureData,
    ) -> GlpmResult<ProcedureId>;

    /// Ask the server to stop a procedure this subscription started.
    ///
    /// The procedure stays outstanding until the server reports it stopped.
    fn stop_procedure(
        &self,
        callback_id: CallbackId,
        address: BdAddr,
        procedure_id: ProcedureId,
    ) -> GlpmResult<()>;
}
