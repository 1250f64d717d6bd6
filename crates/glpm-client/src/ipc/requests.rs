//! Request/response round trips to the glucose server.
//!
//! Every request goes to the server's address with a fresh message ID and
//! waits at most the configured timeout. A response is usable only if its
//! payload covers the fixed response layout and carries a zero status.

use super::messages::{
    RegisterCollectorEventsResponse, StartProcedureRequest, StartProcedureResponse,
    StatusResponse, StopProcedureRequest, UnRegisterCollectorEventsRequest,
    GLPM_MESSAGE_FUNCTION_REGISTER_COLLECTOR_EVENTS, GLPM_MESSAGE_FUNCTION_START_PROCEDURE,
    GLPM_MESSAGE_FUNCTION_STOP_PROCEDURE, GLPM_MESSAGE_FUNCTION_UN_REGISTER_COLLECTOR_EVENTS,
    MESSAGE_GROUP_GLUCOSE_MANAGER,
};
use crate::domain::ids::{RemoteHandlerId, RemoteProcedureId};
use crate::domain::status::RemoteStatus;
use crate::domain::types::ProcedureData;
use crate::error::{GlpmError, GlpmResult};
use crate::metrics::GlpmStats;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_bus::MessageTransport;
use shared_types::{fixed_payload_size, BdAddr, Message};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// The module's connection to the glucose server.
pub struct ServerLink {
    transport: Arc<dyn MessageTransport>,
    timeout: Duration,
    initialized: AtomicBool,
    stats: Arc<GlpmStats>,
}

impl ServerLink {
    pub fn new(transport: Arc<dyn MessageTransport>, timeout: Duration, stats: Arc<GlpmStats>) -> Self {
        Self {
            transport,
            timeout,
            initialized: AtomicBool::new(false),
            stats,
        }
    }

    /// Bring the link up. Fails if no server is reachable.
    pub fn initialize(&self) -> GlpmResult<()> {
        let server = self.transport.server_address_id().ok_or_else(|| GlpmError::Link {
            reason: "no server address".to_string(),
        })?;
        self.initialized.store(true, Ordering::SeqCst);
        debug!(server_address_id = server, "[GLPM] Server link up");
        Ok(())
    }

    pub fn cleanup(&self) {
        self.initialized.store(false, Ordering::SeqCst);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Register for collector events, returning the server's handler ID.
    pub fn register_collector_events(&self) -> GlpmResult<RemoteHandlerId> {
        let response: RegisterCollectorEventsResponse =
            self.round_trip(GLPM_MESSAGE_FUNCTION_REGISTER_COLLECTOR_EVENTS, &())?;
        self.check_status(response.status)?;

        let handler_id = RemoteHandlerId::from_raw(response.handler_id);
        if !handler_id.is_valid() {
            return Err(self.fail(GlpmError::malformed("server returned handler ID 0")));
        }
        Ok(handler_id)
    }

    pub fn unregister_collector_events(&self, handler_id: RemoteHandlerId) -> GlpmResult<()> {
        if !handler_id.is_valid() {
            return Err(GlpmError::invalid("handler ID is zero"));
        }
        let request = UnRegisterCollectorEventsRequest {
            handler_id: handler_id.get(),
        };
        let response: StatusResponse =
            self.round_trip(GLPM_MESSAGE_FUNCTION_UN_REGISTER_COLLECTOR_EVENTS, &request)?;
        self.check_status(response.status)
    }

    /// Ask the server to run `procedure` on the sensor at `address`.
    pub fn start_procedure(
        &self,
        handler_id: RemoteHandlerId,
        address: BdAddr,
        procedure: &ProcedureData,
    ) -> GlpmResult<RemoteProcedureId> {
        if !handler_id.is_valid() {
            return Err(GlpmError::invalid("handler ID is zero"));
        }
        if address.is_null() {
            return Err(GlpmError::invalid("remote address is null"));
        }
        procedure.validate()?;

        let request = StartProcedureRequest {
            handler_id: handler_id.get(),
            address,
            procedure: *procedure,
        };
        let response: StartProcedureResponse =
            self.round_trip(GLPM_MESSAGE_FUNCTION_START_PROCEDURE, &request)?;
        self.check_status(response.status)?;

        let procedure_id = RemoteProcedureId::from_raw(response.procedure_id);
        if !procedure_id.is_valid() {
            return Err(self.fail(GlpmError::malformed("server returned procedure ID 0")));
        }
        Ok(procedure_id)
    }

    pub fn stop_procedure(
        &self,
        handler_id: RemoteHandlerId,
        address: BdAddr,
        procedure_id: RemoteProcedureId,
    ) -> GlpmResult<()> {
        if !handler_id.is_valid() || !procedure_id.is_valid() {
            return Err(GlpmError::invalid("handler or procedure ID is zero"));
        }
        if address.is_null() {
            return Err(GlpmError::invalid("remote address is null"));
        }

        let request = StopProcedureRequest {
            handler_id: handler_id.get(),
            address,
            procedure_id: procedure_id.get(),
        };
        let response: StatusResponse =
            self.round_trip(GLPM_MESSAGE_FUNCTION_STOP_PROCEDURE, &request)?;
        self.check_status(response.status)
    }

    fn round_trip<Req, Resp>(&self, function: u32, request: &Req) -> GlpmResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned + Serialize + Default,
    {
        if !self.is_initialized() {
            return Err(GlpmError::NotInitialized);
        }
        let server = self.transport.server_address_id().ok_or_else(|| GlpmError::Link {
            reason: "no server address".to_string(),
        })?;

        let message = Message::with_payload(
            server,
            self.transport.next_message_id(),
            MESSAGE_GROUP_GLUCOSE_MANAGER,
            function,
            request,
        )
        .map_err(|e| GlpmError::invalid(e.to_string()))?;

        self.stats.record_round_trip();
        let response = self
            .transport
            .send_message_response(message, self.timeout)
            .map_err(|e| self.fail(e.into()))?;

        let expected = fixed_payload_size::<Resp>();
        if !response.has_payload_of_at_least(expected) {
            return Err(self.fail(GlpmError::malformed(format!(
                "function {function:#x}: need {expected} bytes, have {}",
                response.payload_len()
            ))));
        }
        response
            .decode()
            .map_err(|e| self.fail(GlpmError::malformed(e.to_string())))
    }

    fn check_status(&self, status: i32) -> GlpmResult<()> {
        RemoteStatus::check(status).map_err(|status| {
            debug!(status = %status, "[GLPM] Server rejected request");
            GlpmError::Remote(status)
        })
    }

    fn fail(&self, error: GlpmError) -> GlpmError {
        self.stats.record_round_trip_failure();
        warn!(error = %error, "[GLPM] Round trip failed");
        error
    }
}
