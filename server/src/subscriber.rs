use std::sync::mpsc::Sender;

use parlor_shared::{Downstream, DownstreamBody, ObjectEvent};

/// A process-unique key identifying one subscriber across every object
/// it watches. Sessions get one at connection open; server-side
/// subscribers allocate theirs from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberKey(u64);

impl SubscriberKey {
    pub(crate) fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

/// Receives the committed event batches of objects a key is subscribed
/// to. A batch of more than one event is a committed transaction and
/// arrives in a single call.
pub trait Subscriber: Send + Sync {
    fn deliver(&self, events: &[ObjectEvent]);
}

/// Forwards event batches to a connection as EventNotification frames.
/// A closed outbox just drops the delivery; the session teardown path
/// cleans the subscription up separately.
pub(crate) struct ConnectionSink {
    outbox: Sender<Box<[u8]>>,
}

impl ConnectionSink {
    pub(crate) fn new(outbox: Sender<Box<[u8]>>) -> Self {
        Self { outbox }
    }
}

impl Subscriber for ConnectionSink {
    fn deliver(&self, events: &[ObjectEvent]) {
        let frame = Downstream::notification(DownstreamBody::EventNotification(events.to_vec()));
        let _ = self.outbox.send(frame.encode());
    }
}

/// A subscriber that buffers batches on a channel, for server-side
/// listeners that want to poll deliveries from their own loop.
pub struct ChannelSubscriber {
    sender: Sender<Vec<ObjectEvent>>,
}

impl ChannelSubscriber {
    pub fn new(sender: Sender<Vec<ObjectEvent>>) -> Self {
        Self { sender }
    }
}

impl Subscriber for ChannelSubscriber {
    fn deliver(&self, events: &[ObjectEvent]) {
        let _ = self.sender.send(events.to_vec());
    }
}
