use parlor_shared::{Attributes, ObjectEvent, Oid};

use log::warn;
use std::collections::HashMap;

use crate::error::TransactionError;
use crate::store::ObjectStore;

/// One open transaction: staged events plus a working copy of the
/// target's attributes, so staged mutations validate and read through
/// each other while canonical state stays untouched until commit.
struct OpenTransaction {
    working: Attributes,
    staged: Vec<ObjectEvent>,
}

/// Buffers events per object between `begin` and `commit`/`rollback`.
/// Transactions are per-object, never nested, and complete
/// synchronously on the processing sequence.
#[derive(Default)]
pub(crate) struct TransactionCoordinator {
    open: HashMap<Oid, OpenTransaction>,
}

impl TransactionCoordinator {
    pub(crate) fn begin(&mut self, oid: Oid, store: &ObjectStore) -> Result<(), TransactionError> {
        if self.open.contains_key(&oid) {
            return Err(TransactionError::AlreadyBuffering { oid });
        }
        let Some(attrs) = store.attributes(oid) else {
            return Err(TransactionError::NoSuchObject { oid });
        };
        self.open.insert(
            oid,
            OpenTransaction {
                working: attrs.clone(),
                staged: Vec::new(),
            },
        );
        Ok(())
    }

    pub(crate) fn is_buffering(&self, oid: Oid) -> bool {
        self.open.contains_key(&oid)
    }

    /// The attribute table a read of this object should see: the
    /// working copy while buffering, nothing otherwise.
    pub(crate) fn working_attributes(&self, oid: Oid) -> Option<&Attributes> {
        self.open.get(&oid).map(|txn| &txn.working)
    }

    /// Stages an event into the object's open transaction. The event
    /// is validated against the working copy so a bad stage surfaces
    /// immediately instead of poisoning the commit.
    pub(crate) fn stage(&mut self, event: ObjectEvent) -> bool {
        let oid = event.oid();
        let Some(txn) = self.open.get_mut(&oid) else {
            return false;
        };
        match event.apply(&mut txn.working) {
            Ok(()) => txn.staged.push(event),
            Err(fault) => warn!("Dropping unstageable event on {}: {}", oid, fault),
        }
        true
    }

    /// Closes the transaction and applies the whole staged batch to
    /// canonical state as one delivery.
    pub(crate) fn commit(
        &mut self,
        oid: Oid,
        store: &mut ObjectStore,
    ) -> Result<(), TransactionError> {
        let Some(txn) = self.open.remove(&oid) else {
            return Err(TransactionError::NotBuffering { oid });
        };
        if !txn.staged.is_empty() {
            store.post_batch(oid, txn.staged);
        }
        Ok(())
    }

    /// Discards the staged batch. Canonical state was never touched,
    /// so nothing needs undoing and no events are delivered.
    pub(crate) fn rollback(&mut self, oid: Oid) -> Result<(), TransactionError> {
        match self.open.remove(&oid) {
            Some(_) => Ok(()),
            None => Err(TransactionError::NotBuffering { oid }),
        }
    }

    /// Destruction of the target discards its open transaction.
    pub(crate) fn abandon(&mut self, oid: Oid) {
        if self.open.remove(&oid).is_some() {
            warn!("Open transaction abandoned by destruction of {}", oid);
        }
    }
}
