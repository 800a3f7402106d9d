use thiserror::Error;

use parlor_shared::{CodecError, MethodId, Oid, ServiceId};

/// A connection did something the protocol forbids. Always
/// connection-fatal: the session is torn down and the reason is logged
/// server-side only, never sent to the peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The packet could not be decoded
    #[error("Undecodable packet: {0}")]
    Codec(#[from] CodecError),

    /// A message arrived that the session state does not permit
    #[error("Message not permitted in session state {state}")]
    OutOfSequence { state: &'static str },

    /// An invocation named a service this server never registered
    #[error("No service registered under id {service_id}")]
    UnknownService { service_id: ServiceId },

    /// A service rejected the requested method id
    #[error("Service {service_id} has no method {method_id}")]
    UnknownMethod {
        service_id: ServiceId,
        method_id: MethodId,
    },

    /// A forwarded event kind that clients are not allowed to originate
    #[error("Clients may not forward this event kind")]
    ForbiddenEvent,
}

/// Why an object could not be reached on behalf of a requester.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectAccessError {
    /// The oid names no live object (never created, or destroyed)
    #[error("No such object: {oid}")]
    NoSuchObject { oid: Oid },

    /// The access controller refused the operation
    #[error("Access denied to object {oid}")]
    AccessDenied { oid: Oid },
}

/// Object id allocation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Every id in the oid space has been handed out
    #[error("Object id space exhausted")]
    OidSpaceExhausted,
}

/// A transaction operation was issued against the wrong state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// begin() on an object that is already buffering
    #[error("Object {oid} already has an open transaction")]
    AlreadyBuffering { oid: Oid },

    /// commit() or rollback() on an object with no open transaction
    #[error("Object {oid} has no open transaction")]
    NotBuffering { oid: Oid },

    /// begin() on an oid that names no live object
    #[error("No such object: {oid}")]
    NoSuchObject { oid: Oid },
}

/// What an invocation provider reports back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The method id is not part of this service's contract. Treated
    /// as a version mismatch and therefore connection-fatal.
    #[error("No method {method_id} on this service")]
    UnknownMethod { method_id: MethodId },

    /// The call was understood but refused; the reason travels back to
    /// the caller's listener verbatim.
    #[error("{0}")]
    Refused(String),
}

/// Work could not be handed to the processing sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The server processing queue is gone")]
pub struct PostError;
