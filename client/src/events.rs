use std::time::Duration;
use std::vec::IntoIter;

use parlor_shared::{BootstrapData, ObjectEvent, ObjectSnapshot, Oid};

/// Everything that happened to the connection since the last drain,
/// read by event type.
pub struct ClientEvents {
    connects: Vec<BootstrapData>,
    rejects: Vec<String>,
    subscribes: Vec<ObjectSnapshot>,
    subscribe_failures: Vec<(Oid, String)>,
    batches: Vec<Vec<ObjectEvent>>,
    unsubscribes: Vec<Oid>,
    destroys: Vec<Oid>,
    pongs: Vec<Duration>,
    empty: bool,
}

impl Default for ClientEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientEvents {
    pub(crate) fn new() -> Self {
        Self {
            connects: Vec::new(),
            rejects: Vec::new(),
            subscribes: Vec::new(),
            subscribe_failures: Vec::new(),
            batches: Vec::new(),
            unsubscribes: Vec::new(),
            destroys: Vec::new(),
            pongs: Vec::new(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        return V::iter(self);
    }

    pub fn has<V: Event>(&self) -> bool {
        return V::has(self);
    }

    pub(crate) fn push_connect(&mut self, bootstrap: BootstrapData) {
        self.connects.push(bootstrap);
        self.empty = false;
    }

    pub(crate) fn push_reject(&mut self, reason: String) {
        self.rejects.push(reason);
        self.empty = false;
    }

    pub(crate) fn push_subscribe(&mut self, snapshot: ObjectSnapshot) {
        self.subscribes.push(snapshot);
        self.empty = false;
    }

    pub(crate) fn push_subscribe_failure(&mut self, oid: Oid, reason: String) {
        self.subscribe_failures.push((oid, reason));
        self.empty = false;
    }

    pub(crate) fn push_batch(&mut self, batch: Vec<ObjectEvent>) {
        self.batches.push(batch);
        self.empty = false;
    }

    pub(crate) fn push_unsubscribe(&mut self, oid: Oid) {
        self.unsubscribes.push(oid);
        self.empty = false;
    }

    pub(crate) fn push_destroy(&mut self, oid: Oid) {
        self.destroys.push(oid);
        self.empty = false;
    }

    pub(crate) fn push_pong(&mut self, latency: Duration) {
        self.pongs.push(latency);
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut ClientEvents) -> Self::Iter;

    fn has(events: &ClientEvents) -> bool;
}

// Connect Event
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<BootstrapData>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.connects);
        return IntoIterator::into_iter(list);
    }

    fn has(events: &ClientEvents) -> bool {
        !events.connects.is_empty()
    }
}

// Reject Event
pub struct RejectEvent;
impl Event for RejectEvent {
    type Iter = IntoIter<String>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.rejects);
        return IntoIterator::into_iter(list);
    }

    fn has(events: &ClientEvents) -> bool {
        !events.rejects.is_empty()
    }
}

// Subscribe Event
pub struct SubscribeEvent;
impl Event for SubscribeEvent {
    type Iter = IntoIter<ObjectSnapshot>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.subscribes);
        return IntoIterator::into_iter(list);
    }

    fn has(events: &ClientEvents) -> bool {
        !events.subscribes.is_empty()
    }
}

// Subscribe Failure Event
pub struct SubscribeFailEvent;
impl Event for SubscribeFailEvent {
    type Iter = IntoIter<(Oid, String)>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.subscribe_failures);
        return IntoIterator::into_iter(list);
    }

    fn has(events: &ClientEvents) -> bool {
        !events.subscribe_failures.is_empty()
    }
}

// Batch Event: one committed event batch, applied to mirrors as a unit
pub struct BatchEvent;
impl Event for BatchEvent {
    type Iter = IntoIter<Vec<ObjectEvent>>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.batches);
        return IntoIterator::into_iter(list);
    }

    fn has(events: &ClientEvents) -> bool {
        !events.batches.is_empty()
    }
}

// Unsubscribe Acknowledgement Event
pub struct UnsubscribeEvent;
impl Event for UnsubscribeEvent {
    type Iter = IntoIter<Oid>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.unsubscribes);
        return IntoIterator::into_iter(list);
    }

    fn has(events: &ClientEvents) -> bool {
        !events.unsubscribes.is_empty()
    }
}

// Destroy Event
pub struct DestroyEvent;
impl Event for DestroyEvent {
    type Iter = IntoIter<Oid>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.destroys);
        return IntoIterator::into_iter(list);
    }

    fn has(events: &ClientEvents) -> bool {
        !events.destroys.is_empty()
    }
}

// Pong Event: one measured round-trip latency sample
pub struct PongEvent;
impl Event for PongEvent {
    type Iter = IntoIter<Duration>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.pongs);
        return IntoIterator::into_iter(list);
    }

    fn has(events: &ClientEvents) -> bool {
        !events.pongs.is_empty()
    }
}
