//! # Procedure Correlation Scenarios
//!
//! Start requests, server notifications carrying remote procedure IDs, and
//! the local IDs applications see in return.

#[cfg(test)]
mod tests {
    use crate::support::server::{
        connected, disconnected, measurement, procedure_started, procedure_stopped,
    };
    use crate::support::{EventJournal, GlpmFixture, SENSOR_A, SENSOR_B};
    use glpm_client::ipc::messages::*;
    use glpm_client::{
        CallbackId, EventCallback, FilterParameters, GlpmError, GlpmEvent, GlucoseManagerApi,
        OperatorType, ProcedureData, ProcedureId, ProcedureType, RemoteStatus, ResponseCode,
    };
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn only_remote(fixture: &GlpmFixture) -> u32 {
        let started = fixture.server.started_procedures();
        assert_eq!(started.len(), 1);
        started[0].procedure_id
    }

    #[test]
    fn test_report_stored_records_round_trip() {
        let fixture = GlpmFixture::started();
        let journal = EventJournal::new();

        let callback_id = fixture
            .manager
            .register_event_callback(journal.clone())
            .unwrap();
        assert_eq!(callback_id.get(), 1);

        let local = fixture
            .manager
            .start_procedure(callback_id, SENSOR_A, &ProcedureData::report_all())
            .unwrap();
        assert_eq!(local.get(), 1);

        let remote = only_remote(&fixture);
        let transaction = fixture.manager.procedure(local).unwrap();
        assert_eq!(transaction.owner, callback_id);
        assert_eq!(transaction.remote_id.unwrap().get(), remote);

        fixture.deliver(procedure_started(SENSOR_A, remote, true));
        fixture.deliver(procedure_stopped(
            SENSOR_A,
            remote,
            ProcedureType::ReportStoredRecords,
            ResponseCode::Success,
            3,
        ));

        let events = journal.events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            GlpmEvent::ProcedureStarted {
                address: SENSOR_A,
                procedure_id: local,
                success: true,
                att_error_code: 0,
            }
        );
        match &events[1] {
            GlpmEvent::ProcedureStopped {
                procedure_id,
                number_stored_records,
                response_code,
                ..
            } => {
                assert_eq!(*procedure_id, local);
                assert_eq!(*number_stored_records, 3);
                assert_eq!(*response_code, ResponseCode::Success);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(fixture.manager.procedure(local).is_none());
    }

    #[test]
    fn test_rejected_start_leaks_nothing() {
        let fixture = GlpmFixture::started();
        let callback_id = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();
        fixture.server.set_status(
            GLPM_MESSAGE_FUNCTION_START_PROCEDURE,
            RemoteStatus::NotSupported.code(),
        );

        let result =
            fixture
                .manager
                .start_procedure(callback_id, SENSOR_A, &ProcedureData::report_all());

        assert_eq!(result, Err(GlpmError::Remote(RemoteStatus::NotSupported)));
        assert!(fixture.manager.procedure(ProcedureId::from_raw(1)).is_none());
        assert_eq!(fixture.manager.outstanding_procedures(), 0);
    }

    #[test]
    fn test_measurements_reach_owner_only() {
        let fixture = GlpmFixture::started();
        let owner = EventJournal::new();
        let bystander = EventJournal::new();
        let owner_id = fixture
            .manager
            .register_event_callback(owner.clone())
            .unwrap();
        fixture
            .manager
            .register_event_callback(bystander.clone())
            .unwrap();

        let local = fixture
            .manager
            .start_procedure(
                owner_id,
                SENSOR_A,
                &ProcedureData::report_sequence_range(10, 12),
            )
            .unwrap();
        let remote = only_remote(&fixture);

        for sequence_number in 10..=12 {
            fixture.deliver(measurement(SENSOR_A, remote, sequence_number));
        }

        assert!(bystander.is_empty());
        let sequence_numbers: Vec<u32> = owner
            .events()
            .iter()
            .map(|event| match event {
                GlpmEvent::GlucoseMeasurement {
                    procedure_id,
                    measurement: Some(m),
                    context: None,
                    ..
                } => {
                    assert_eq!(*procedure_id, local);
                    m.sequence_number
                }
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(sequence_numbers, vec![10, 11, 12]);

        // measurements never end the procedure
        assert!(fixture.manager.procedure(local).is_some());
    }

    #[test]
    fn test_connection_events_reach_everyone() {
        let fixture = GlpmFixture::started();
        let journals: Vec<Arc<EventJournal>> = (0..4).map(|_| EventJournal::new()).collect();
        for journal in &journals {
            fixture
                .manager
                .register_event_callback(journal.clone())
                .unwrap();
        }

        fixture.deliver(connected(SENSOR_A));
        fixture.deliver(disconnected(SENSOR_A));

        for journal in &journals {
            let events = journal.events();
            assert_eq!(events.len(), 2);
            assert!(matches!(events[0], GlpmEvent::Connected { address, .. } if address == SENSOR_A));
            assert!(matches!(events[1], GlpmEvent::Disconnected { .. }));
        }
    }

    #[test]
    fn test_local_ids_unique_across_callbacks() {
        let fixture = GlpmFixture::started();
        let a = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();
        let b = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();
        assert_ne!(a, b);

        let mut seen = HashSet::new();
        for (callback, address) in [(a, SENSOR_A), (b, SENSOR_B), (a, SENSOR_B), (b, SENSOR_A)] {
            let local = fixture
                .manager
                .start_procedure(callback, address, &ProcedureData::report_all())
                .unwrap();
            assert!(local.is_valid());
            assert!(seen.insert(local));
        }
        assert_eq!(fixture.manager.outstanding_procedures(), 4);
    }

    #[test]
    fn test_stop_by_non_owner_leaves_procedure() {
        let fixture = GlpmFixture::started();
        let owner = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();
        let other = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();
        let local = fixture
            .manager
            .start_procedure(owner, SENSOR_A, &ProcedureData::report_all())
            .unwrap();
        let before = fixture.manager.procedure(local);

        let result = fixture.manager.stop_procedure(other, SENSOR_A, local);

        assert!(matches!(result, Err(GlpmError::InvalidParameter { .. })));
        assert_eq!(fixture.manager.procedure(local), before);
        assert_eq!(
            fixture
                .server
                .request_count(GLPM_MESSAGE_FUNCTION_STOP_PROCEDURE),
            0
        );
    }

    #[test]
    fn test_failed_abort_keeps_procedure_findable() {
        let fixture = GlpmFixture::started();
        let journal = EventJournal::new();
        let callback_id = fixture
            .manager
            .register_event_callback(journal.clone())
            .unwrap();
        let local = fixture
            .manager
            .start_procedure(callback_id, SENSOR_A, &ProcedureData::report_all())
            .unwrap();
        let remote = only_remote(&fixture);

        fixture
            .manager
            .stop_procedure(callback_id, SENSOR_A, local)
            .unwrap();
        fixture.deliver(procedure_stopped(
            SENSOR_A,
            remote,
            ProcedureType::AbortProcedure,
            ResponseCode::AbortUnsuccessful,
            0,
        ));
        assert!(fixture.manager.procedure(local).is_some());

        // The original procedure then completes normally.
        fixture.deliver(procedure_stopped(
            SENSOR_A,
            remote,
            ProcedureType::ReportStoredRecords,
            ResponseCode::Success,
            0,
        ));
        assert!(fixture.manager.procedure(local).is_none());
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn test_unregistered_callback_is_never_invoked() {
        let fixture = GlpmFixture::started();
        let journal = EventJournal::new();
        let callback_id = fixture
            .manager
            .register_event_callback(journal.clone())
            .unwrap();
        fixture
            .manager
            .start_procedure(callback_id, SENSOR_A, &ProcedureData::report_all())
            .unwrap();
        let remote = only_remote(&fixture);

        fixture.manager.unregister_event_callback(callback_id);
        assert!(fixture.server.registered_handlers().is_empty());

        fixture.deliver(connected(SENSOR_A));
        fixture.deliver(procedure_started(SENSOR_A, remote, true));
        fixture.deliver(measurement(SENSOR_A, remote, 1));

        assert!(journal.is_empty());
        assert_eq!(fixture.manager.stats().events_delivered, 0);
    }

    #[test]
    fn test_invalid_procedure_data_never_sent() {
        let fixture = GlpmFixture::started();
        let callback_id = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();

        let invalid = [
            ProcedureData::new(
                ProcedureType::ReportStoredRecords,
                OperatorType::LessThanOrEqualTo,
                None,
            ),
            ProcedureData::report_sequence_range(20, 10),
            ProcedureData::new(
                ProcedureType::DeleteStoredRecords,
                OperatorType::GreaterThanOrEqualTo,
                Some(FilterParameters::SequenceNumber(70_000)),
            ),
        ];
        for procedure in &invalid {
            assert!(matches!(
                fixture
                    .manager
                    .start_procedure(callback_id, SENSOR_A, procedure),
                Err(GlpmError::InvalidParameter { .. })
            ));
        }
        assert_eq!(
            fixture
                .server
                .request_count(GLPM_MESSAGE_FUNCTION_START_PROCEDURE),
            0
        );
    }

    #[test]
    fn test_unknown_callback_cannot_start() {
        let fixture = GlpmFixture::started();
        let unknown = CallbackId::from_raw(42);

        assert_eq!(
            fixture
                .manager
                .start_procedure(unknown, SENSOR_A, &ProcedureData::report_all()),
            Err(GlpmError::InvalidCallback {
                callback_id: unknown
            })
        );
    }

    #[test]
    fn test_callback_starts_procedure_from_event() {
        let fixture = GlpmFixture::started();
        let manager = fixture.manager.clone();
        let journal = EventJournal::new();
        let slot: Arc<Mutex<Option<CallbackId>>> = Arc::new(Mutex::new(None));

        let own_id = slot.clone();
        let sink = journal.clone();
        let callback_id = fixture
            .manager
            .register_event_callback(Arc::new(move |event: &GlpmEvent| {
                sink.on_event(event);
                if let GlpmEvent::Connected { address, .. } = event {
                    if let Some(id) = *own_id.lock() {
                        let started =
                            manager.start_procedure(id, *address, &ProcedureData::report_all());
                        assert!(started.is_ok());
                    }
                }
            }))
            .unwrap();
        *slot.lock() = Some(callback_id);

        fixture.deliver(connected(SENSOR_B));

        assert_eq!(journal.len(), 1);
        assert_eq!(fixture.manager.outstanding_procedures(), 1);
        assert_eq!(fixture.server.started_procedures()[0].address, SENSOR_B);
    }
}
