//! Shared fixtures for the integration suite.


use glpm_client::{EventCallback, GlpmConfig, GlpmEvent, GlucoseManager, Notification};
use parking_lot::Mutex;
use server::SimulatedGlucoseServer;
use shared_bus::{InMemoryMessageBus, DEFAULT_SERVER_ADDRESS_ID};
use shared_types::{BdAddr, Message, SharedPowerState};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use logging::init_test_logging;

pub const SENSOR_A: BdAddr = BdAddr::new([0x00, 0x1B, 0xDC, 0x0A, 0x0B, 0x01]);
pub const SENSOR_B: BdAddr = BdAddr::new([0x00, 0x1B, 0xDC, 0x0A, 0x0B, 0x02]);

/// Bus, simulated server and manager wired together.
pub struct GlpmFixture {
    pub bus: Arc<InMemoryMessageBus>,
    pub server: Arc<SimulatedGlucoseServer>,
    pub power: Arc<SharedPowerState>,
    pub manager: Arc<GlucoseManager>,
    next_message_id: AtomicU32,
}

impl GlpmFixture {
    /// An initialized manager talking to a fresh server.
    pub fn started() -> Self {
        let fixture = Self::with_config(Self::test_config());
        if let Err(e) = fixture.manager.initialize() {
            panic!("manager failed to initialize: {e}");
        }
        fixture
    }

    pub fn with_config(config: GlpmConfig) -> Self {
        init_test_logging();

        let bus = Arc::new(InMemoryMessageBus::new());
        let server = SimulatedGlucoseServer::new();
        bus.attach_responder(server.clone());
        let power = Arc::new(SharedPowerState::new(true));
        let manager = Arc::new(GlucoseManager::new(
            config,
            bus.clone(),
            bus.clone(),
            power.clone(),
        ));

        Self {
            bus,
            server,
            power,
            manager,
            next_message_id: AtomicU32::new(0x100),
        }
    }

    pub fn test_config() -> GlpmConfig {
        GlpmConfig::default().with_response_timeout(Duration::from_millis(100))
    }

    /// Deliver a notification on the calling thread.
    pub fn deliver(&self, notification: Notification) -> bool {
        match self.encode(notification) {
            Some(message) => self.bus.dispatch(&message),
            None => false,
        }
    }

    /// Queue a notification for the bus worker.
    pub fn post(&self, notification: Notification) -> bool {
        match self.encode(notification) {
            Some(message) => self.bus.post(message),
            None => false,
        }
    }

    fn encode(&self, notification: Notification) -> Option<Message> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        notification
            .to_message(DEFAULT_SERVER_ADDRESS_ID, message_id)
            .ok()
    }
}

/// Callback that records every event it sees.
#[derive(Default)]
pub struct EventJournal {
    events: Mutex<Vec<GlpmEvent>>,
}

impl EventJournal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<GlpmEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Wait until at least `count` events arrived. False on timeout.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            while self.len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .is_ok()
    }
}

impl EventCallback for EventJournal {
    fn on_event(&self, event: &GlpmEvent) {
        self.events.lock().push(event.clone());
    }
}
