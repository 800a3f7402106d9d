use crate::codec::{ByteReader, ByteWriter, CodecError, Wire};
use crate::schema::{Attr, Attributes};
use crate::transport::Transport;
use crate::types::{MethodId, Oid, RequestId, ServiceId};
use crate::value::{Arg, Key, Value};

/// An event could not be applied to an object's attribute table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("object has no field named `{field}`")]
    NoSuchField { field: String },
    #[error("field `{field}` is not a {expected}")]
    WrongKind {
        field: String,
        expected: &'static str,
    },
    #[error("field `{field}` has no entry for the given key")]
    NoSuchEntry { field: String },
    #[error("field `{field}` has an entry for the given key already")]
    DuplicateEntry { field: String },
    #[error("index {index} is out of range for field `{field}`")]
    IndexOutOfRange { field: String, index: u16 },
}

/// Every state change in the system, expressed uniformly.
///
/// Mutation variants carry the displaced prior value so listeners on
/// either endpoint can observe what a change replaced without keeping
/// their own shadow copies.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEvent {
    AttributeChanged {
        oid: Oid,
        field: String,
        old: Value,
        new: Value,
    },
    EntryAdded {
        oid: Oid,
        field: String,
        key: Key,
        value: Value,
    },
    EntryUpdated {
        oid: Oid,
        field: String,
        key: Key,
        old: Value,
        new: Value,
    },
    EntryRemoved {
        oid: Oid,
        field: String,
        key: Key,
        old: Value,
    },
    ElementUpdated {
        oid: Oid,
        field: String,
        index: u16,
        old: Value,
        new: Value,
    },
    MessagePosted {
        oid: Oid,
        name: String,
        args: Vec<Value>,
    },
    InvocationRequest {
        oid: Oid,
        service_id: ServiceId,
        method_id: MethodId,
        args: Vec<Arg>,
    },
    InvocationResponse {
        oid: Oid,
        request_id: RequestId,
        method_id: MethodId,
        args: Vec<Value>,
    },
    ObjectDestroyed {
        oid: Oid,
    },
}

impl ObjectEvent {
    /// The object this event targets.
    pub fn oid(&self) -> Oid {
        match self {
            ObjectEvent::AttributeChanged { oid, .. }
            | ObjectEvent::EntryAdded { oid, .. }
            | ObjectEvent::EntryUpdated { oid, .. }
            | ObjectEvent::EntryRemoved { oid, .. }
            | ObjectEvent::ElementUpdated { oid, .. }
            | ObjectEvent::MessagePosted { oid, .. }
            | ObjectEvent::InvocationRequest { oid, .. }
            | ObjectEvent::InvocationResponse { oid, .. }
            | ObjectEvent::ObjectDestroyed { oid } => *oid,
        }
    }

    /// The delivery guarantee this event kind requires. All state
    /// mutations ride the reliable ordered stream; only transient
    /// notifications may ever be downgraded by callers.
    pub fn default_transport(&self) -> Transport {
        Transport::RELIABLE_ORDERED
    }

    /// Applies this event to an attribute table, mutating it in place.
    ///
    /// Both the server's canonical objects and the client's mirrors go
    /// through this one switch, which is what keeps the two sides in
    /// agreement event for event.
    pub fn apply(&self, attrs: &mut Attributes) -> Result<(), ApplyError> {
        match self {
            ObjectEvent::AttributeChanged { field, new, .. } => {
                match attrs.get_mut(field) {
                    Some(Attr::Scalar(slot)) => {
                        *slot = new.clone();
                        Ok(())
                    }
                    Some(_) => Err(ApplyError::WrongKind {
                        field: field.clone(),
                        expected: "scalar",
                    }),
                    None => Err(ApplyError::NoSuchField {
                        field: field.clone(),
                    }),
                }
            }
            ObjectEvent::EntryAdded {
                field, key, value, ..
            } => match attrs.get_mut(field) {
                Some(Attr::Set(entries)) => {
                    if entries.contains_key(key) {
                        return Err(ApplyError::DuplicateEntry {
                            field: field.clone(),
                        });
                    }
                    entries.insert(key.clone(), value.clone());
                    Ok(())
                }
                Some(_) => Err(ApplyError::WrongKind {
                    field: field.clone(),
                    expected: "set",
                }),
                None => Err(ApplyError::NoSuchField {
                    field: field.clone(),
                }),
            },
            ObjectEvent::EntryUpdated {
                field, key, new, ..
            } => match attrs.get_mut(field) {
                Some(Attr::Set(entries)) => match entries.get_mut(key) {
                    Some(slot) => {
                        *slot = new.clone();
                        Ok(())
                    }
                    None => Err(ApplyError::NoSuchEntry {
                        field: field.clone(),
                    }),
                },
                Some(_) => Err(ApplyError::WrongKind {
                    field: field.clone(),
                    expected: "set",
                }),
                None => Err(ApplyError::NoSuchField {
                    field: field.clone(),
                }),
            },
            ObjectEvent::EntryRemoved { field, key, .. } => match attrs.get_mut(field) {
                Some(Attr::Set(entries)) => {
                    if entries.remove(key).is_none() {
                        return Err(ApplyError::NoSuchEntry {
                            field: field.clone(),
                        });
                    }
                    Ok(())
                }
                Some(_) => Err(ApplyError::WrongKind {
                    field: field.clone(),
                    expected: "set",
                }),
                None => Err(ApplyError::NoSuchField {
                    field: field.clone(),
                }),
            },
            ObjectEvent::ElementUpdated {
                field, index, new, ..
            } => match attrs.get_mut(field) {
                Some(Attr::List(items)) => match items.get_mut(*index as usize) {
                    Some(slot) => {
                        *slot = new.clone();
                        Ok(())
                    }
                    None => Err(ApplyError::IndexOutOfRange {
                        field: field.clone(),
                        index: *index,
                    }),
                },
                Some(_) => Err(ApplyError::WrongKind {
                    field: field.clone(),
                    expected: "list",
                }),
                None => Err(ApplyError::NoSuchField {
                    field: field.clone(),
                }),
            },
            // Notifications carry no state; applying them is a no-op.
            ObjectEvent::MessagePosted { .. }
            | ObjectEvent::InvocationRequest { .. }
            | ObjectEvent::InvocationResponse { .. }
            | ObjectEvent::ObjectDestroyed { .. } => Ok(()),
        }
    }
}

const EVENT_ATTRIBUTE_CHANGED: u8 = 0;
const EVENT_ENTRY_ADDED: u8 = 1;
const EVENT_ENTRY_UPDATED: u8 = 2;
const EVENT_ENTRY_REMOVED: u8 = 3;
const EVENT_ELEMENT_UPDATED: u8 = 4;
const EVENT_MESSAGE_POSTED: u8 = 5;
const EVENT_INVOCATION_REQUEST: u8 = 6;
const EVENT_INVOCATION_RESPONSE: u8 = 7;
const EVENT_OBJECT_DESTROYED: u8 = 8;

impl Wire for ObjectEvent {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            ObjectEvent::AttributeChanged {
                oid,
                field,
                old,
                new,
            } => {
                writer.write_u8(EVENT_ATTRIBUTE_CHANGED);
                oid.ser(writer);
                field.ser(writer);
                old.ser(writer);
                new.ser(writer);
            }
            ObjectEvent::EntryAdded {
                oid,
                field,
                key,
                value,
            } => {
                writer.write_u8(EVENT_ENTRY_ADDED);
                oid.ser(writer);
                field.ser(writer);
                key.ser(writer);
                value.ser(writer);
            }
            ObjectEvent::EntryUpdated {
                oid,
                field,
                key,
                old,
                new,
            } => {
                writer.write_u8(EVENT_ENTRY_UPDATED);
                oid.ser(writer);
                field.ser(writer);
                key.ser(writer);
                old.ser(writer);
                new.ser(writer);
            }
            ObjectEvent::EntryRemoved {
                oid,
                field,
                key,
                old,
            } => {
                writer.write_u8(EVENT_ENTRY_REMOVED);
                oid.ser(writer);
                field.ser(writer);
                key.ser(writer);
                old.ser(writer);
            }
            ObjectEvent::ElementUpdated {
                oid,
                field,
                index,
                old,
                new,
            } => {
                writer.write_u8(EVENT_ELEMENT_UPDATED);
                oid.ser(writer);
                field.ser(writer);
                index.ser(writer);
                old.ser(writer);
                new.ser(writer);
            }
            ObjectEvent::MessagePosted { oid, name, args } => {
                writer.write_u8(EVENT_MESSAGE_POSTED);
                oid.ser(writer);
                name.ser(writer);
                args.ser(writer);
            }
            ObjectEvent::InvocationRequest {
                oid,
                service_id,
                method_id,
                args,
            } => {
                writer.write_u8(EVENT_INVOCATION_REQUEST);
                oid.ser(writer);
                service_id.ser(writer);
                method_id.ser(writer);
                args.ser(writer);
            }
            ObjectEvent::InvocationResponse {
                oid,
                request_id,
                method_id,
                args,
            } => {
                writer.write_u8(EVENT_INVOCATION_RESPONSE);
                oid.ser(writer);
                request_id.ser(writer);
                method_id.ser(writer);
                args.ser(writer);
            }
            ObjectEvent::ObjectDestroyed { oid } => {
                writer.write_u8(EVENT_OBJECT_DESTROYED);
                oid.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            EVENT_ATTRIBUTE_CHANGED => Ok(ObjectEvent::AttributeChanged {
                oid: Oid::de(reader)?,
                field: String::de(reader)?,
                old: Value::de(reader)?,
                new: Value::de(reader)?,
            }),
            EVENT_ENTRY_ADDED => Ok(ObjectEvent::EntryAdded {
                oid: Oid::de(reader)?,
                field: String::de(reader)?,
                key: Key::de(reader)?,
                value: Value::de(reader)?,
            }),
            EVENT_ENTRY_UPDATED => Ok(ObjectEvent::EntryUpdated {
                oid: Oid::de(reader)?,
                field: String::de(reader)?,
                key: Key::de(reader)?,
                old: Value::de(reader)?,
                new: Value::de(reader)?,
            }),
            EVENT_ENTRY_REMOVED => Ok(ObjectEvent::EntryRemoved {
                oid: Oid::de(reader)?,
                field: String::de(reader)?,
                key: Key::de(reader)?,
                old: Value::de(reader)?,
            }),
            EVENT_ELEMENT_UPDATED => Ok(ObjectEvent::ElementUpdated {
                oid: Oid::de(reader)?,
                field: String::de(reader)?,
                index: u16::de(reader)?,
                old: Value::de(reader)?,
                new: Value::de(reader)?,
            }),
            EVENT_MESSAGE_POSTED => Ok(ObjectEvent::MessagePosted {
                oid: Oid::de(reader)?,
                name: String::de(reader)?,
                args: Vec::de(reader)?,
            }),
            EVENT_INVOCATION_REQUEST => Ok(ObjectEvent::InvocationRequest {
                oid: Oid::de(reader)?,
                service_id: ServiceId::de(reader)?,
                method_id: MethodId::de(reader)?,
                args: Vec::de(reader)?,
            }),
            EVENT_INVOCATION_RESPONSE => Ok(ObjectEvent::InvocationResponse {
                oid: Oid::de(reader)?,
                request_id: RequestId::de(reader)?,
                method_id: MethodId::de(reader)?,
                args: Vec::de(reader)?,
            }),
            EVENT_OBJECT_DESTROYED => Ok(ObjectEvent::ObjectDestroyed {
                oid: Oid::de(reader)?,
            }),
            code => Err(CodecError::UnknownTypeCode { code }),
        }
    }
}
