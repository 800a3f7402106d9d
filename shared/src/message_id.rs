use crate::types::{MessageId, NO_MESSAGE_ID};

/// Hands out correlation ids for a single connection's sending side.
///
/// Ids wrap over the full signed 16-bit range and skip the
/// [`NO_MESSAGE_ID`] sentinel, so a long-lived connection eventually
/// reuses ids; the window is wide enough that any response still in
/// flight for a reused id would long since have been discarded.
pub struct MessageIdAllocator {
    last: MessageId,
}

impl MessageIdAllocator {
    pub fn new() -> Self {
        Self { last: NO_MESSAGE_ID }
    }

    /// Returns the next message id, never the sentinel.
    pub fn next(&mut self) -> MessageId {
        self.last = self.last.wrapping_add(1);
        if self.last == NO_MESSAGE_ID {
            self.last = self.last.wrapping_add(1);
        }
        self.last
    }
}

impl Default for MessageIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
