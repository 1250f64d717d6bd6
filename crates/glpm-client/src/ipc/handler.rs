//! Group handler for the glucose manager message group.
//!
//! Only messages tagged with the glucose manager group are looked at;
//! anything addressed to another group is dropped first. Within the group:
//!
//! - Module functions go to the [`Dispatcher`].
//! - A client registration message saying this client is no longer
//!   registered means the server went away; both registries are cleared.
//! - Anything else is ignored.

use super::dispatcher::Dispatcher;
use super::messages::MESSAGE_GROUP_GLUCOSE_MANAGER;
use crate::context::GlpmContext;
use shared_bus::MessageGroupHandler;
use shared_types::{ClientRegistration, Message, MESSAGE_FUNCTION_CLIENT_REGISTRATION};
use std::sync::Arc;
use tracing::{debug, trace};

/// Message group handler installed by `GlucoseManager::initialize`.
pub struct GlpmGroupHandler {
    context: Arc<GlpmContext>,
    dispatcher: Dispatcher,
}

impl GlpmGroupHandler {
    pub(crate) fn new(context: Arc<GlpmContext>) -> Self {
        Self {
            dispatcher: Dispatcher::new(context.clone()),
            context,
        }
    }

    fn handle_client_registration(&self, message: &Message) {
        if !message.has_payload_of_at_least(ClientRegistration::payload_size()) {
            trace!("[GLPM] Short client registration message");
            return;
        }
        match message.decode::<ClientRegistration>() {
            Ok(registration) if !registration.registered => {
                self.context.reset_after_link_loss();
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "[GLPM] Undecodable client registration message"),
        }
    }
}

impl MessageGroupHandler for GlpmGroupHandler {
    fn handle_message(&self, message: &Message) {
        if message.header.message_group != MESSAGE_GROUP_GLUCOSE_MANAGER {
            trace!(
                group = message.header.message_group,
                "[GLPM] Ignoring message for another group"
            );
            return;
        }
        if !self.context.is_running() {
            return;
        }

        if message.header.is_module_function() {
            self.dispatcher.process(message);
        } else if message.header.message_function == MESSAGE_FUNCTION_CLIENT_REGISTRATION {
            self.handle_client_registration(message);
        } else {
            trace!(
                function = message.header.message_function,
                "[GLPM] Ignoring platform message"
            );
        }
    }
}
