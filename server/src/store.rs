use std::collections::HashMap;
use std::sync::Arc;

use log::{trace, warn};

use parlor_shared::{ObjectEvent, ObjectSchema, ObjectSnapshot, Oid};

use crate::access::{AccessController, AccessOp};
use crate::error::{AllocationError, ObjectAccessError};
use crate::object::ObjectRecord;
use crate::subscriber::{Subscriber, SubscriberKey};

/// The canonical home of every distributed object, and the fan-out
/// point that turns applied events into subscriber deliveries.
///
/// The store is only ever touched from the processing sequence, so
/// none of its operations lock; per-oid delivery order is simply
/// call order.
pub struct ObjectStore {
    next_oid: Oid,
    next_subscriber: u64,
    objects: HashMap<Oid, ObjectRecord>,
    access: Box<dyn AccessController>,
}

impl ObjectStore {
    pub(crate) fn new(access: Box<dyn AccessController>) -> Self {
        Self {
            next_oid: 1,
            next_subscriber: 0,
            objects: HashMap::new(),
            access,
        }
    }

    /// Hands out a fresh process-unique subscriber key.
    pub fn allocate_subscriber_key(&mut self) -> SubscriberKey {
        let key = SubscriberKey::from_u64(self.next_subscriber);
        self.next_subscriber += 1;
        key
    }

    /// Creates an object from its schema. Oids are monotonic and never
    /// reused within the process, so a destroyed object's id stays
    /// dead forever.
    pub fn create_object(&mut self, schema: &ObjectSchema) -> Result<Oid, AllocationError> {
        if self.next_oid == Oid::MAX {
            return Err(AllocationError::OidSpaceExhausted);
        }
        let oid = self.next_oid;
        self.next_oid += 1;
        self.objects.insert(oid, ObjectRecord::new(schema));
        trace!("Created object {}", oid);
        Ok(oid)
    }

    pub fn contains(&self, oid: Oid) -> bool {
        self.objects.contains_key(&oid)
    }

    pub fn snapshot(&self, oid: Oid) -> Option<ObjectSnapshot> {
        self.objects.get(&oid).map(|record| record.snapshot(oid))
    }

    pub(crate) fn attributes(&self, oid: Oid) -> Option<&parlor_shared::Attributes> {
        self.objects.get(&oid).map(|record| &record.attrs)
    }

    pub(crate) fn allows(&self, identity: Option<&str>, oid: Oid, op: AccessOp) -> bool {
        self.access.allows(identity, oid, op)
    }

    /// Subscribes a key to an object, returning the private snapshot
    /// of its current state. Subscribing an already-subscribed key is
    /// idempotent: the caller gets a fresh snapshot but no second
    /// delivery stream.
    pub fn subscribe(
        &mut self,
        oid: Oid,
        key: SubscriberKey,
        identity: Option<&str>,
        sink: Arc<dyn Subscriber>,
    ) -> Result<ObjectSnapshot, ObjectAccessError> {
        let Some(record) = self.objects.get_mut(&oid) else {
            return Err(ObjectAccessError::NoSuchObject { oid });
        };
        if !self.access.allows(identity, oid, AccessOp::Subscribe) {
            return Err(ObjectAccessError::AccessDenied { oid });
        }
        if !record.watch(key, sink) {
            trace!("Redundant subscribe to {} by {:?}", oid, key);
        }
        Ok(record.snapshot(oid))
    }

    /// Removes a subscription. Succeeds whether or not the key was
    /// subscribed, and whether or not the object still exists.
    pub fn unsubscribe(&mut self, oid: Oid, key: SubscriberKey) {
        if let Some(record) = self.objects.get_mut(&oid) {
            record.unwatch(key);
        }
    }

    /// Drops every subscription held by a key. Session teardown path.
    pub fn unsubscribe_all(&mut self, key: SubscriberKey) {
        for record in self.objects.values_mut() {
            record.unwatch(key);
        }
    }

    /// Applies one event to canonical state, then delivers it to the
    /// target's subscribers in subscription order. An event that fails
    /// to apply is logged and dropped; the processing sequence moves
    /// on.
    pub fn post_event(&mut self, event: ObjectEvent) {
        if let ObjectEvent::ObjectDestroyed { oid } = event {
            self.destroy_object(oid);
            return;
        }
        self.post_batch(event.oid(), vec![event]);
    }

    /// Applies a committed batch to canonical state and delivers it as
    /// one unit: each subscriber sees the whole batch in a single call.
    pub(crate) fn post_batch(&mut self, oid: Oid, events: Vec<ObjectEvent>) {
        let Some(record) = self.objects.get_mut(&oid) else {
            warn!("Event target no longer exists: {}", oid);
            return;
        };
        let mut applied = Vec::with_capacity(events.len());
        for event in events {
            match event.apply(&mut record.attrs) {
                Ok(()) => applied.push(event),
                Err(fault) => warn!("Dropping inapplicable event on {}: {}", oid, fault),
            }
        }
        if applied.is_empty() {
            return;
        }
        for sink in record.watchers() {
            sink.deliver(&applied);
        }
    }

    /// Tears an object down: subscribers get a final ObjectDestroyed
    /// delivery, the subscription list is cleared, and the oid goes
    /// dead permanently. Destroying a dead oid is a logged no-op.
    pub fn destroy_object(&mut self, oid: Oid) {
        let Some(record) = self.objects.remove(&oid) else {
            warn!("Destroy of nonexistent object: {}", oid);
            return;
        };
        let notice = [ObjectEvent::ObjectDestroyed { oid }];
        for sink in record.watchers() {
            sink.deliver(&notice);
        }
        trace!("Destroyed object {}", oid);
    }
}
