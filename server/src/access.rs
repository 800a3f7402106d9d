use parlor_shared::Oid;

/// The operations the access controller is consulted about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOp {
    Subscribe,
    Mutate,
}

/// Decides whether an identity may touch an object. Consulted
/// synchronously on the processing sequence, so implementations must
/// answer from in-memory state.
///
/// `identity` is the authenticated username for client-originated
/// operations and `None` for server-internal ones.
pub trait AccessController: Send {
    fn allows(&self, identity: Option<&str>, oid: Oid, op: AccessOp) -> bool;
}

/// The default policy: everything is permitted.
pub struct AllowAll;

impl AccessController for AllowAll {
    fn allows(&self, _identity: Option<&str>, _oid: Oid, _op: AccessOp) -> bool {
        true
    }
}
