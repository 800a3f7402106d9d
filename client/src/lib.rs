//! # Parlor Client
//! The subscribing half of the parlor distributed-object middleware:
//! maintains local mirrors of subscribed objects, applies the server's
//! committed event batches to them, and routes invocation responses
//! back to their pending calls.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod client;
mod error;
mod events;
mod invocation;

pub use client::{Client, ClientConfig};
pub use error::ClientError;
pub use events::{
    BatchEvent, ClientEvents, ConnectEvent, DestroyEvent, Event, PongEvent, RejectEvent,
    SubscribeEvent, SubscribeFailEvent, UnsubscribeEvent,
};
pub use invocation::{InvocationResult, ResponseHandle};
