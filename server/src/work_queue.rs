use std::sync::mpsc::Sender;
use std::sync::Arc;

use parlor_shared::{Attributes, ObjectEvent, ObjectSchema, ObjectSnapshot, Oid};

use crate::error::{AllocationError, ObjectAccessError, PostError, TransactionError};
use crate::invocation::ServiceRegistry;
use crate::store::ObjectStore;
use crate::subscriber::{Subscriber, SubscriberKey};
use crate::transaction::TransactionCoordinator;

/// A unit of work queued for the processing sequence.
pub(crate) type WorkItem = Box<dyn FnOnce(&mut EventContext) + Send + 'static>;

/// The cross-thread door into the processing sequence. Cloneable and
/// `Send`; everything posted through it runs, in post order, inside
/// the next `Server::process()` call.
#[derive(Clone)]
pub struct ServerHandle {
    sender: Sender<WorkItem>,
}

impl ServerHandle {
    pub(crate) fn new(sender: Sender<WorkItem>) -> Self {
        Self { sender }
    }

    pub fn post<F>(&self, work: F) -> Result<(), PostError>
    where
        F: FnOnce(&mut EventContext) + Send + 'static,
    {
        self.sender.send(Box::new(work)).map_err(|_| PostError)
    }
}

/// All mutable server state, reachable only from the processing
/// sequence. There is no public constructor and no way to obtain one
/// off-thread: work items receive `&mut EventContext` inside
/// `Server::process()`, and `&mut Server` methods are themselves on
/// the sequence. That confinement is what makes every operation here
/// lock-free and every per-object event stream totally ordered.
pub struct EventContext {
    store: ObjectStore,
    transactions: TransactionCoordinator,
    services: ServiceRegistry,
    handle: ServerHandle,
}

impl EventContext {
    pub(crate) fn new(store: ObjectStore, services: ServiceRegistry, handle: ServerHandle) -> Self {
        Self {
            store,
            transactions: TransactionCoordinator::default(),
            services,
            handle,
        }
    }

    /// A handle for posting further work from other threads.
    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    pub fn create_object(&mut self, schema: &ObjectSchema) -> Result<Oid, AllocationError> {
        self.store.create_object(schema)
    }

    pub fn destroy_object(&mut self, oid: Oid) {
        self.transactions.abandon(oid);
        self.store.destroy_object(oid);
    }

    /// Routes an event to its target: staged if the target is inside
    /// an open transaction, applied and delivered immediately
    /// otherwise.
    pub fn post_event(&mut self, event: ObjectEvent) {
        if let ObjectEvent::ObjectDestroyed { oid } = event {
            self.destroy_object(oid);
            return;
        }
        if self.transactions.is_buffering(event.oid()) {
            self.transactions.stage(event);
        } else {
            self.store.post_event(event);
        }
    }

    /// The attribute table a read should see right now: the working
    /// copy while the object is buffering, canonical state otherwise.
    pub fn attributes(&self, oid: Oid) -> Option<&Attributes> {
        self.transactions
            .working_attributes(oid)
            .or_else(|| self.store.attributes(oid))
    }

    pub fn snapshot(&self, oid: Oid) -> Option<ObjectSnapshot> {
        self.attributes(oid).map(|attrs| attrs.snapshot(oid))
    }

    pub fn begin_transaction(&mut self, oid: Oid) -> Result<(), TransactionError> {
        self.transactions.begin(oid, &self.store)
    }

    pub fn commit_transaction(&mut self, oid: Oid) -> Result<(), TransactionError> {
        self.transactions.commit(oid, &mut self.store)
    }

    pub fn rollback_transaction(&mut self, oid: Oid) -> Result<(), TransactionError> {
        self.transactions.rollback(oid)
    }

    pub fn allocate_subscriber_key(&mut self) -> SubscriberKey {
        self.store.allocate_subscriber_key()
    }

    /// Server-internal subscription; bypasses identity-based access
    /// checks the way in-process code always may.
    pub fn subscribe(
        &mut self,
        oid: Oid,
        key: SubscriberKey,
        sink: Arc<dyn Subscriber>,
    ) -> Result<ObjectSnapshot, ObjectAccessError> {
        self.store.subscribe(oid, key, None, sink)
    }

    pub fn unsubscribe(&mut self, oid: Oid, key: SubscriberKey) {
        self.store.unsubscribe(oid, key);
    }

    pub(crate) fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    pub(crate) fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub(crate) fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }
}
