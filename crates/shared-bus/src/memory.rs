//! # In-Memory Message Bus
//!
//! A single-process stand-in for the central message system. It plays both
//! roles a profile module talks to:
//!
//! - the **dispatcher**, routing unsolicited messages to the group handler
//!   that claimed their group, either inline (`dispatch`) or through a
//!   single-consumer worker task (`post` + `spawn_worker`);
//! - the **transport**, carrying synchronous round trips to an attached
//!   [`RequestResponder`] that plays the server.

use crate::handler::{BusError, BusResult, GroupHandlerRegistry, MessageGroupHandler};
use crate::transport::{MessageTransport, RequestResponder, TransportError};
use crate::DEFAULT_SERVER_ADDRESS_ID;
use parking_lot::{Mutex, RwLock};
use shared_types::{
    Message, MESSAGE_GROUP_MAXIMUM, MESSAGE_GROUP_MINIMUM, MESSAGE_ID_MASK,
    MESSAGE_ID_RESPONSE_MASK,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Counters kept by the bus.
#[derive(Debug, Default)]
pub struct BusStats {
    /// Messages handed to a group handler.
    pub delivered: AtomicU64,
    /// Messages for a group nobody claimed.
    pub unroutable: AtomicU64,
    /// Round trips attempted.
    pub requests_sent: AtomicU64,
    /// Round trips that got no response.
    pub timeouts: AtomicU64,
}

/// In-memory implementation of the central message system.
pub struct InMemoryMessageBus {
    /// Group handlers by message group.
    handlers: RwLock<HashMap<u32, Arc<dyn MessageGroupHandler>>>,

    /// The simulated server, if connected.
    responder: RwLock<Option<Arc<dyn RequestResponder>>>,

    /// Address the server answers on.
    server_address_id: u32,

    /// Next message sequence number.
    next_message_id: AtomicU32,

    /// Producer side of the worker queue; `None` once closed.
    queue: Mutex<Option<mpsc::UnboundedSender<Message>>>,

    /// Consumer side, taken by `spawn_worker`.
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Message>>>,

    stats: BusStats,
}

impl InMemoryMessageBus {
    /// Create a bus with no server attached.
    #[must_use]
    pub fn new() -> Self {
        Self::with_server_address(DEFAULT_SERVER_ADDRESS_ID)
    }

    /// Create a bus whose server answers on `server_address_id`.
    #[must_use]
    pub fn with_server_address(server_address_id: u32) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            handlers: RwLock::new(HashMap::new()),
            responder: RwLock::new(None),
            server_address_id,
            next_message_id: AtomicU32::new(1),
            queue: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            stats: BusStats::default(),
        }
    }

    /// Connect a server.
    pub fn attach_responder(&self, responder: Arc<dyn RequestResponder>) {
        *self.responder.write() = Some(responder);
        debug!(server = self.server_address_id, "Server attached");
    }

    /// Disconnect the server. Later round trips fail `NotConnected`.
    pub fn detach_responder(&self) {
        *self.responder.write() = None;
        debug!(server = self.server_address_id, "Server detached");
    }

    /// True if a handler owns `group`.
    #[must_use]
    pub fn has_handler(&self, group: u32) -> bool {
        self.handlers.read().contains_key(&group)
    }

    /// Deliver `message` to its group handler on the calling thread.
    ///
    /// Returns false if no handler owns the group.
    pub fn dispatch(&self, message: &Message) -> bool {
        let group = message.header.message_group;
        let handler = self.handlers.read().get(&group).cloned();

        match handler {
            Some(handler) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(
                    group = format_args!("{:#06x}", group),
                    function = format_args!("{:#010x}", message.header.message_function),
                    "Message dispatched"
                );
                handler.handle_message(message);
                true
            }
            None => {
                self.stats.unroutable.fetch_add(1, Ordering::Relaxed);
                warn!(
                    group = format_args!("{:#06x}", group),
                    "Message dropped (no handler)"
                );
                false
            }
        }
    }

    /// Queue `message` for the worker task.
    ///
    /// Returns false once the queue is closed.
    pub fn post(&self, message: Message) -> bool {
        match self.queue.lock().as_ref() {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Start the single consumer that dispatches queued messages one at a
    /// time. Returns `None` if a worker was already started.
    pub fn spawn_worker(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut receiver = self.receiver.lock().take()?;
        let bus = Arc::clone(self);

        Some(tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                bus.dispatch(&message);
            }
            debug!("Dispatch worker stopped");
        }))
    }

    /// Close the worker queue. The worker drains what is queued and exits.
    pub fn close(&self) {
        self.queue.lock().take();
    }

    /// Bus counters.
    #[must_use]
    pub fn stats(&self) -> &BusStats {
        &self.stats
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupHandlerRegistry for InMemoryMessageBus {
    fn register_group_handler(
        &self,
        group: u32,
        handler: Arc<dyn MessageGroupHandler>,
    ) -> BusResult<()> {
        if !(MESSAGE_GROUP_MINIMUM..=MESSAGE_GROUP_MAXIMUM).contains(&group) {
            return Err(BusError::InvalidGroup { group });
        }

        let mut handlers = self.handlers.write();
        if handlers.contains_key(&group) {
            return Err(BusError::HandlerAlreadyRegistered { group });
        }
        handlers.insert(group, handler);

        debug!(group = format_args!("{:#06x}", group), "Group handler registered");
        Ok(())
    }

    fn unregister_group_handler(&self, group: u32) {
        if self.handlers.write().remove(&group).is_some() {
            debug!(group = format_args!("{:#06x}", group), "Group handler unregistered");
        }
    }
}

impl MessageTransport for InMemoryMessageBus {
    fn server_address_id(&self) -> Option<u32> {
        self.responder
            .read()
            .as_ref()
            .map(|_| self.server_address_id)
    }

    fn next_message_id(&self) -> u32 {
        loop {
            let id = self.next_message_id.fetch_add(1, Ordering::Relaxed) & MESSAGE_ID_MASK;
            if id != 0 {
                return id;
            }
        }
    }

    fn send_message_response(
        &self,
        request: Message,
        timeout: Duration,
    ) -> Result<Message, TransportError> {
        let responder = self
            .responder
            .read()
            .clone()
            .ok_or(TransportError::NotConnected)?;

        self.stats.requests_sent.fetch_add(1, Ordering::Relaxed);

        match responder.respond(&request) {
            Some(mut response) => {
                response.header.message_id = request.header.sequence() | MESSAGE_ID_RESPONSE_MASK;
                response.header.message_group = request.header.message_group;
                response.header.message_function = request.header.message_function;
                Ok(response)
            }
            None => {
                self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(
                    function = format_args!("{:#010x}", request.header.message_function),
                    timeout_ms,
                    "Request timed out"
                );
                Err(TransportError::Timeout { timeout_ms })
            }
        }
    }
}
