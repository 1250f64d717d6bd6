//! # Lifecycle Scenarios
//!
//! The manager driven as a platform module: ordered startup with rollback,
//! power fan-out, and shutdown with live subscriptions and procedures.

#[cfg(test)]
mod tests {
    use crate::support::{EventJournal, GlpmFixture, SENSOR_A, SENSOR_B};
    use glpm_client::ipc::messages::*;
    use glpm_client::{GlpmError, GlucoseManagerApi, ProcedureData, MODULE_NAME};
    use parking_lot::Mutex;
    use shared_types::{
        DevicePowerEvent, ModuleError, ModuleErrorKind, ModuleRegistry, ModuleResult,
        PlatformModule,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// A sibling profile module that can be told to fail.
    struct SiblingModule {
        fail: bool,
        running: AtomicBool,
        events: Mutex<Vec<DevicePowerEvent>>,
    }

    impl SiblingModule {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                running: AtomicBool::new(false),
                events: Mutex::new(Vec::new()),
            })
        }
    }

    impl PlatformModule for SiblingModule {
        fn name(&self) -> &'static str {
            "HRPM"
        }

        fn initialize(&self) -> ModuleResult<()> {
            if self.fail {
                return Err(ModuleError::new(
                    self.name(),
                    ModuleErrorKind::LinkFailed,
                    "server unreachable",
                ));
            }
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn shutdown(&self) {
            self.running.store(false, Ordering::SeqCst);
        }

        fn is_initialized(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        fn on_device_event(&self, event: DevicePowerEvent) {
            self.events.lock().push(event);
        }
    }

    #[test]
    fn test_registry_drives_manager() {
        let fixture = GlpmFixture::with_config(GlpmFixture::test_config());
        let sibling = SiblingModule::new(false);

        let registry = ModuleRegistry::new();
        registry.register(fixture.manager.clone());
        registry.register(sibling.clone());

        registry.initialize_all().unwrap();
        assert_eq!(registry.initialized_modules(), vec![MODULE_NAME, "HRPM"]);
        assert!(fixture.bus.has_handler(MESSAGE_GROUP_GLUCOSE_MANAGER));

        registry.dispatch_device_event(DevicePowerEvent::PoweredOff);
        assert!(!fixture.manager.is_powered());
        assert_eq!(*sibling.events.lock(), vec![DevicePowerEvent::PoweredOff]);

        registry.shutdown_all();
        assert!(registry.initialized_modules().is_empty());
        assert!(!fixture.bus.has_handler(MESSAGE_GROUP_GLUCOSE_MANAGER));
    }

    #[test]
    fn test_failed_sibling_rolls_manager_back() {
        let fixture = GlpmFixture::with_config(GlpmFixture::test_config());
        let registry = ModuleRegistry::new();
        registry.register(fixture.manager.clone());
        registry.register(SiblingModule::new(true));

        let err = registry.initialize_all().unwrap_err();
        assert_eq!(err.module, "HRPM");

        assert!(!fixture.manager.is_initialized());
        assert!(!fixture.bus.has_handler(MESSAGE_GROUP_GLUCOSE_MANAGER));
    }

    #[test]
    fn test_manager_failure_reported_as_module_error() {
        let fixture = GlpmFixture::with_config(GlpmFixture::test_config());
        fixture.bus.detach_responder();
        let registry = ModuleRegistry::new();
        registry.register(fixture.manager.clone());

        let err = registry.initialize_all().unwrap_err();
        assert_eq!(err.module, MODULE_NAME);
        assert_eq!(err.kind, ModuleErrorKind::LinkFailed);
        assert!(!fixture.bus.has_handler(MESSAGE_GROUP_GLUCOSE_MANAGER));
    }

    #[test]
    fn test_shutdown_with_live_state() {
        let fixture = GlpmFixture::started();
        let manager = &fixture.manager;

        let mut callbacks = Vec::new();
        for _ in 0..3 {
            callbacks.push(manager.register_event_callback(EventJournal::new()).unwrap());
        }
        manager
            .start_procedure(callbacks[0], SENSOR_A, &ProcedureData::report_all())
            .unwrap();
        manager
            .start_procedure(callbacks[1], SENSOR_B, &ProcedureData::report_number_of_records())
            .unwrap();
        assert_eq!(manager.subscription_count(), 3);
        assert_eq!(manager.outstanding_procedures(), 2);
        assert_eq!(fixture.server.registered_handlers().len(), 3);

        manager.shutdown();

        assert!(!manager.is_initialized());
        assert_eq!(manager.subscription_count(), 0);
        assert_eq!(manager.outstanding_procedures(), 0);
        assert!(fixture.server.registered_handlers().is_empty());
        assert_eq!(
            fixture
                .server
                .request_count(GLPM_MESSAGE_FUNCTION_UN_REGISTER_COLLECTOR_EVENTS),
            3
        );
    }

    #[test]
    fn test_shutdown_tolerates_rejected_unregister() {
        let fixture = GlpmFixture::started();
        fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();
        fixture
            .server
            .set_status(GLPM_MESSAGE_FUNCTION_UN_REGISTER_COLLECTOR_EVENTS, -2);

        fixture.manager.shutdown();

        assert!(!fixture.manager.is_initialized());
        assert_eq!(fixture.server.registered_handlers().len(), 1);
    }

    #[test]
    fn test_api_after_shutdown() {
        let fixture = GlpmFixture::started();
        let id = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();
        fixture.manager.shutdown();

        assert_eq!(
            fixture
                .manager
                .start_procedure(id, SENSOR_A, &ProcedureData::report_all()),
            Err(GlpmError::NotInitialized)
        );
        fixture.manager.unregister_event_callback(id);
    }

    #[test]
    fn test_restart_hands_out_fresh_ids() {
        let fixture = GlpmFixture::started();
        let first = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();
        fixture.manager.shutdown();
        fixture.manager.initialize().unwrap();

        let second = fixture
            .manager
            .register_event_callback(EventJournal::new())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_power_seeded_from_device_manager() {
        let fixture = GlpmFixture::with_config(GlpmFixture::test_config());
        fixture.power.set_powered(false);
        fixture.manager.initialize().unwrap();
        assert!(!fixture.manager.is_powered());

        fixture
            .manager
            .handle_device_event(DevicePowerEvent::PoweredOn);
        assert!(fixture.manager.is_powered());

        // Power state gates nothing.
        fixture
            .manager
            .handle_device_event(DevicePowerEvent::PoweredOff);
        assert!(fixture
            .manager
            .register_event_callback(EventJournal::new())
            .is_ok());
    }
}
