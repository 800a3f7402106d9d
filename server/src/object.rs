use std::sync::Arc;

use parlor_shared::{Attributes, ObjectSchema, ObjectSnapshot, Oid};

use crate::subscriber::{Subscriber, SubscriberKey};

/// One live distributed object: its canonical attribute table plus the
/// ordered list of watchers to notify after each applied event.
pub(crate) struct ObjectRecord {
    pub(crate) attrs: Attributes,
    watchers: Vec<(SubscriberKey, Arc<dyn Subscriber>)>,
}

impl ObjectRecord {
    pub(crate) fn new(schema: &ObjectSchema) -> Self {
        Self {
            attrs: Attributes::from_schema(schema),
            watchers: Vec::new(),
        }
    }

    pub(crate) fn snapshot(&self, oid: Oid) -> ObjectSnapshot {
        self.attrs.snapshot(oid)
    }

    pub(crate) fn is_watching(&self, key: SubscriberKey) -> bool {
        self.watchers.iter().any(|(watcher, _)| *watcher == key)
    }

    /// Adds a watcher; returns false (and changes nothing) when the
    /// key is already watching.
    pub(crate) fn watch(&mut self, key: SubscriberKey, sink: Arc<dyn Subscriber>) -> bool {
        if self.is_watching(key) {
            return false;
        }
        self.watchers.push((key, sink));
        true
    }

    pub(crate) fn unwatch(&mut self, key: SubscriberKey) {
        self.watchers.retain(|(watcher, _)| *watcher != key);
    }

    /// Watchers in subscription order.
    pub(crate) fn watchers(&self) -> impl Iterator<Item = &Arc<dyn Subscriber>> {
        self.watchers.iter().map(|(_, sink)| sink)
    }
}
