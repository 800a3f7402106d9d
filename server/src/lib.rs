//! # Parlor Server
//! The authoritative half of the parlor distributed-object middleware:
//! owns canonical object state, fans committed events out to
//! subscribers, and dispatches client invocations to registered
//! services, all on a single processing sequence.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod access;
mod background;
mod error;
mod invocation;
mod object;
mod server;
mod session;
mod store;
mod subscriber;
mod transaction;
mod work_queue;

pub use access::{AccessController, AccessOp, AllowAll};
pub use background::{BackgroundRunner, Outcome, WorkUnit};
pub use error::{
    AllocationError, ObjectAccessError, PostError, ProtocolError, ServiceError, TransactionError,
};
pub use invocation::{InvocationProvider, Responder};
pub use server::{ConnectionId, Server, ServerConfig};
pub use session::{AcceptAll, Authenticator};
pub use store::ObjectStore;
pub use subscriber::{ChannelSubscriber, Subscriber, SubscriberKey};
pub use work_queue::{EventContext, ServerHandle};
