//! Domain module for the Glucose Profile Manager client
//!
//! ## Core Modules
//! - ids: Local and remote identifiers, wrapping allocator
//! - registry: Subscriptions and outstanding procedures
//! - events: What application callbacks receive
//! - types: Glucose profile records and procedure descriptions
//! - status: Server response status codes

pub mod events;
pub mod ids;
pub mod registry;
pub mod status;
pub mod types;

pub use events::{EventCallback, GlpmEvent, GlpmEventKind};
pub use ids::{CallbackId, IdAllocator, ProcedureId, RemoteHandlerId, RemoteProcedureId};
pub use registry::{Subscription, SubscriptionRegistry, Transaction, TransactionRegistry};
pub use status::RemoteStatus;
pub use types::*;
