use crate::codec::{ByteReader, ByteWriter, CodecError, Wire};
use crate::types::{Oid, RequestId};

/// The closed set of scalar values a distributed object attribute, event
/// argument, or invocation argument can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Oid(Oid),
    List(Vec<Value>),
}

impl Value {
    /// Converts a value into a set key, if it is of a keyable kind.
    pub fn as_key(&self) -> Option<Key> {
        match self {
            Value::Int(value) => Some(Key::Int(*value)),
            Value::Str(value) => Some(Key::Str(value.clone())),
            Value::Oid(oid) => Some(Key::Oid(*oid)),
            _ => None,
        }
    }
}

const VALUE_BOOL: u8 = 0;
const VALUE_INT: u8 = 1;
const VALUE_FLOAT: u8 = 2;
const VALUE_STR: u8 = 3;
const VALUE_OID: u8 = 4;
const VALUE_LIST: u8 = 5;

impl Wire for Value {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            Value::Bool(value) => {
                writer.write_u8(VALUE_BOOL);
                value.ser(writer);
            }
            Value::Int(value) => {
                writer.write_u8(VALUE_INT);
                value.ser(writer);
            }
            Value::Float(value) => {
                writer.write_u8(VALUE_FLOAT);
                value.ser(writer);
            }
            Value::Str(value) => {
                writer.write_u8(VALUE_STR);
                value.ser(writer);
            }
            Value::Oid(oid) => {
                writer.write_u8(VALUE_OID);
                oid.ser(writer);
            }
            Value::List(items) => {
                writer.write_u8(VALUE_LIST);
                items.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            VALUE_BOOL => Ok(Value::Bool(bool::de(reader)?)),
            VALUE_INT => Ok(Value::Int(i64::de(reader)?)),
            VALUE_FLOAT => Ok(Value::Float(f64::de(reader)?)),
            VALUE_STR => Ok(Value::Str(String::de(reader)?)),
            VALUE_OID => Ok(Value::Oid(Oid::de(reader)?)),
            VALUE_LIST => Ok(Value::List(Vec::de(reader)?)),
            tag => Err(CodecError::BadTag { tag }),
        }
    }
}

/// The comparable subset of [`Value`] usable as a keyed-set key. Keys
/// are unique within a set and their insertion order is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
    Oid(Oid),
}

impl Key {
    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(value) => Value::Int(*value),
            Key::Str(value) => Value::Str(value.clone()),
            Key::Oid(oid) => Value::Oid(*oid),
        }
    }
}

const KEY_INT: u8 = 0;
const KEY_STR: u8 = 1;
const KEY_OID: u8 = 2;

impl Wire for Key {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            Key::Int(value) => {
                writer.write_u8(KEY_INT);
                value.ser(writer);
            }
            Key::Str(value) => {
                writer.write_u8(KEY_STR);
                value.ser(writer);
            }
            Key::Oid(oid) => {
                writer.write_u8(KEY_OID);
                oid.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            KEY_INT => Ok(Key::Int(i64::de(reader)?)),
            KEY_STR => Ok(Key::Str(String::de(reader)?)),
            KEY_OID => Ok(Key::Oid(Oid::de(reader)?)),
            tag => Err(CodecError::BadTag { tag }),
        }
    }
}

/// What kind of response the caller of an invocation method expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// The caller only wants to know the request was processed.
    Confirm,
    /// The caller wants a result value (or a failure reason).
    Result,
}

impl Wire for ListenerKind {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u8(match self {
            ListenerKind::Confirm => 0,
            ListenerKind::Result => 1,
        });
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            0 => Ok(ListenerKind::Confirm),
            1 => Ok(ListenerKind::Result),
            tag => Err(CodecError::BadTag { tag }),
        }
    }
}

/// The marshalled stand-in for a caller-side response listener,
/// occupying the trailing argument slot of an invocation request. The
/// server addresses the response back via the request id captured here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSlot {
    pub kind: ListenerKind,
    pub request_id: RequestId,
}

impl Wire for ListenerSlot {
    fn ser(&self, writer: &mut ByteWriter) {
        self.kind.ser(writer);
        self.request_id.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        Ok(Self {
            kind: ListenerKind::de(reader)?,
            request_id: RequestId::de(reader)?,
        })
    }
}

/// One positional argument of an invocation request: either a plain
/// value or a marshalled listener slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    Listener(ListenerSlot),
}

const ARG_VALUE: u8 = 0;
const ARG_LISTENER: u8 = 1;

impl Wire for Arg {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            Arg::Value(value) => {
                writer.write_u8(ARG_VALUE);
                value.ser(writer);
            }
            Arg::Listener(slot) => {
                writer.write_u8(ARG_LISTENER);
                slot.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            ARG_VALUE => Ok(Arg::Value(Value::de(reader)?)),
            ARG_LISTENER => Ok(Arg::Listener(ListenerSlot::de(reader)?)),
            tag => Err(CodecError::BadTag { tag }),
        }
    }
}
