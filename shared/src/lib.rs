//! # Parlor Shared
//! Common functionality shared between parlor-server & parlor-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod codec;
mod constants;
mod event;
mod message_id;
mod messages;
mod schema;
mod transport;
mod types;
mod value;

pub use codec::{ByteReader, ByteWriter, CodecError, Wire};
pub use constants::{
    DEFAULT_CHANNEL, PING_INTERVAL, REQUEST_FAILED_ID, REQUEST_PROCESSED_ID,
};
pub use event::{ApplyError, ObjectEvent};
pub use message_id::MessageIdAllocator;
pub use messages::{
    AuthResult, BootstrapData, Credentials, Downstream, DownstreamBody, ServiceHandle, Upstream,
    UpstreamBody,
};
pub use schema::{Attr, Attributes, FieldDescriptor, FieldKind, ObjectSchema, ObjectSnapshot};
pub use transport::Transport;
pub use types::{MethodId, MessageId, Oid, RequestId, ServiceId, NO_MESSAGE_ID};
pub use value::{Arg, Key, ListenerKind, ListenerSlot, Value};
