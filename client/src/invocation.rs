use std::sync::mpsc::{Receiver, TryRecvError};

use parlor_shared::Value;

/// How a pending invocation concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    /// Processed, nothing to report
    Confirmed,
    /// Processed, with a result value
    Value(Value),
    /// Refused, with the service's reason
    Failed(String),
}

/// The caller's end of one pending invocation. Yields at most one
/// result; the client removes its routing entry on delivery, so a
/// duplicate response from the wire can never reach the handle.
pub struct ResponseHandle {
    receiver: Receiver<InvocationResult>,
}

impl ResponseHandle {
    pub(crate) fn new(receiver: Receiver<InvocationResult>) -> Self {
        Self { receiver }
    }

    /// The result, if it has arrived. `None` both while pending and
    /// after the single result was already taken.
    pub fn try_recv(&self) -> Option<InvocationResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
