//! IPC module for the glucose manager
//!
//! - messages: Function IDs and payload layouts of the glucose group
//! - requests: Round trips to the server
//! - dispatcher: Notification routing to callbacks
//! - handler: Group handler installed on the central dispatcher

pub mod dispatcher;
pub mod handler;
pub mod messages;
pub mod requests;

pub use dispatcher::BROADCAST_INLINE_CAPACITY;
pub use handler::GlpmGroupHandler;
pub use messages::{Notification, MESSAGE_GROUP_GLUCOSE_MANAGER};
pub use requests::ServerLink;
