//! # Server Link Scenarios
//!
//! The server dropping this client, restarting, or not answering.

#[cfg(test)]
mod tests {
    use crate::support::server::{connected, procedure_started};
    use crate::support::{EventJournal, GlpmFixture, SENSOR_A};
    use glpm_client::ipc::messages::*;
    use glpm_client::{GlpmError, GlucoseManagerApi, ProcedureData};
    use shared_bus::DEFAULT_SERVER_ADDRESS_ID;
    use shared_types::{ClientRegistration, Message, MESSAGE_FUNCTION_CLIENT_REGISTRATION};

    fn client_registration(registered: bool) -> Message {
        Message::with_payload(
            DEFAULT_SERVER_ADDRESS_ID,
            0x42,
            MESSAGE_GROUP_GLUCOSE_MANAGER,
            MESSAGE_FUNCTION_CLIENT_REGISTRATION,
            &ClientRegistration {
                address_id: 7,
                registered,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_server_restart_then_reregister() {
        let fixture = GlpmFixture::started();
        let stale = EventJournal::new();
        let callback_id = fixture
            .manager
            .register_event_callback(stale.clone())
            .unwrap();
        fixture
            .manager
            .start_procedure(callback_id, SENSOR_A, &ProcedureData::report_all())
            .unwrap();
        let remote = fixture.server.started_procedures()[0].procedure_id;

        fixture.server.drop_all_clients();
        fixture.bus.dispatch(&client_registration(false));

        assert_eq!(fixture.manager.subscription_count(), 0);
        assert_eq!(fixture.manager.outstanding_procedures(), 0);
        assert_eq!(fixture.manager.stats().link_loss_resets, 1);

        // Leftovers from before the restart find nobody.
        fixture.deliver(procedure_started(SENSOR_A, remote, true));
        fixture.deliver(connected(SENSOR_A));
        assert!(stale.is_empty());

        // The module stays up and accepts new registrations.
        let fresh = EventJournal::new();
        fixture
            .manager
            .register_event_callback(fresh.clone())
            .unwrap();
        fixture.deliver(connected(SENSOR_A));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fixture.server.registered_handlers().len(), 1);
    }

    #[test]
    fn test_registered_client_registration_is_ignored() {
        let fixture = GlpmFixture::started();
        fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();

        fixture.bus.dispatch(&client_registration(true));

        assert_eq!(fixture.manager.subscription_count(), 1);
        assert_eq!(fixture.manager.stats().link_loss_resets, 0);
    }

    #[test]
    fn test_short_client_registration_is_ignored() {
        let fixture = GlpmFixture::started();
        fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();

        let mut message = client_registration(false);
        message.payload.truncate(2);
        fixture.bus.dispatch(&message);

        assert_eq!(fixture.manager.subscription_count(), 1);
    }

    #[test]
    fn test_unresponsive_server_times_out() {
        let fixture = GlpmFixture::started();
        let callback_id = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();
        fixture.server.set_silent(true);

        let result =
            fixture
                .manager
                .start_procedure(callback_id, SENSOR_A, &ProcedureData::report_all());
        assert_eq!(
            result,
            Err(GlpmError::TransportTimeout {
                timeout_ms: GlpmFixture::test_config().response_timeout_ms
            })
        );
        assert_eq!(fixture.manager.outstanding_procedures(), 0);

        assert!(matches!(
            fixture.manager.register_event_callback(EventJournal::new()),
            Err(GlpmError::TransportTimeout { .. })
        ));
        assert_eq!(fixture.manager.subscription_count(), 1);

        let stats = fixture.manager.stats();
        assert_eq!(stats.round_trip_failures, 2);
    }

    #[test]
    fn test_unregister_without_server_still_forgets() {
        let fixture = GlpmFixture::started();
        let journal = EventJournal::new();
        let callback_id = fixture
            .manager
            .register_event_callback(journal.clone())
            .unwrap();

        fixture.server.set_silent(true);
        fixture.manager.unregister_event_callback(callback_id);

        assert_eq!(fixture.manager.subscription_count(), 0);
        fixture.deliver(connected(SENSOR_A));
        assert!(journal.is_empty());
    }

    #[test]
    fn test_server_reusing_procedure_id() {
        let fixture = GlpmFixture::started();
        let callback_id = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();

        fixture.server.set_next_procedure_id(0x77);
        fixture
            .manager
            .start_procedure(callback_id, SENSOR_A, &ProcedureData::report_all())
            .unwrap();
        fixture.server.set_next_procedure_id(0x77);

        assert!(matches!(
            fixture
                .manager
                .start_procedure(callback_id, SENSOR_A, &ProcedureData::report_all()),
            Err(GlpmError::AllocationFailure { .. })
        ));
        assert_eq!(fixture.manager.outstanding_procedures(), 1);
    }
}
