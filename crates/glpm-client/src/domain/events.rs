//! Events delivered to application callbacks.

use super::ids::ProcedureId;
use super::types::{
    ConnectionType, GlucoseMeasurement, GlucoseMeasurementContext, MeasurementErrorType,
    ProcedureType, ResponseCode, SupportedFeatures,
};
use shared_types::BdAddr;

/// An event from the glucose server, translated for the application.
///
/// Procedure IDs are always the local IDs returned by `start_procedure`.
#[derive(Debug, Clone, PartialEq)]
pub enum GlpmEvent {
    Connected {
        address: BdAddr,
        connection_type: ConnectionType,
        supported_features: SupportedFeatures,
    },
    Disconnected {
        address: BdAddr,
        connection_type: ConnectionType,
    },
    ProcedureStarted {
        address: BdAddr,
        procedure_id: ProcedureId,
        success: bool,
        att_error_code: u8,
    },
    ProcedureStopped {
        address: BdAddr,
        procedure_id: ProcedureId,
        procedure_type: ProcedureType,
        response_code: ResponseCode,
        number_stored_records: u32,
    },
    GlucoseMeasurement {
        address: BdAddr,
        procedure_id: ProcedureId,
        error_type: MeasurementErrorType,
        measurement: Option<GlucoseMeasurement>,
        context: Option<GlucoseMeasurementContext>,
    },
}

/// Fieldless tag of a [`GlpmEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlpmEventKind {
    Connected,
    Disconnected,
    ProcedureStarted,
    ProcedureStopped,
    GlucoseMeasurement,
}

impl GlpmEvent {
    pub fn kind(&self) -> GlpmEventKind {
        match self {
            Self::Connected { .. } => GlpmEventKind::Connected,
            Self::Disconnected { .. } => GlpmEventKind::Disconnected,
            Self::ProcedureStarted { .. } => GlpmEventKind::ProcedureStarted,
            Self::ProcedureStopped { .. } => GlpmEventKind::ProcedureStopped,
            Self::GlucoseMeasurement { .. } => GlpmEventKind::GlucoseMeasurement,
        }
    }

    pub fn address(&self) -> BdAddr {
        match self {
            Self::Connected { address, .. }
            | Self::Disconnected { address, .. }
            | Self::ProcedureStarted { address, .. }
            | Self::ProcedureStopped { address, .. }
            | Self::GlucoseMeasurement { address, .. } => *address,
        }
    }

    /// Local procedure the event belongs to, if any.
    pub fn procedure_id(&self) -> Option<ProcedureId> {
        match self {
            Self::ProcedureStarted { procedure_id, .. }
            | Self::ProcedureStopped { procedure_id, .. }
            | Self::GlucoseMeasurement { procedure_id, .. } => Some(*procedure_id),
            Self::Connected { .. } | Self::Disconnected { .. } => None,
        }
    }
}

/// Receives events for one subscription.
///
/// Invoked on the notification thread with no module lock held, so an
/// implementation may call back into the manager. A panic is caught and
/// logged; it does not stop delivery to other subscribers.
pub trait EventCallback: Send + Sync {
    fn on_event(&self, event: &GlpmEvent);
}

impl<F> EventCallback for F
where
    F: Fn(&GlpmEvent) + Send + Sync,
{
    fn on_event(&self, event: &GlpmEvent) {
        self(event)
    }
}
