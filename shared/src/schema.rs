use std::collections::BTreeMap;

use crate::codec::{ByteReader, ByteWriter, CodecError, Wire};
use crate::types::Oid;
use crate::value::{Key, Value};

/// The kind of one declared attribute of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A single scalar value, with its initial value.
    Scalar(Value),
    /// A keyed set: unique comparable keys, insertion order irrelevant.
    Set,
    /// An ordered list addressed by position.
    List,
}

/// One declared attribute of an object schema. Schemas are explicit
/// descriptor lists; nothing about an object's shape is discovered at
/// runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn scalar(name: &str, initial: Value) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Scalar(initial),
        }
    }

    pub fn set(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Set,
        }
    }

    pub fn list(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::List,
        }
    }
}

/// The declared shape of a distributed object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub fields: Vec<FieldDescriptor>,
}

impl ObjectSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }
}

/// The current value of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Scalar(Value),
    Set(BTreeMap<Key, Value>),
    List(Vec<Value>),
}

const ATTR_SCALAR: u8 = 0;
const ATTR_SET: u8 = 1;
const ATTR_LIST: u8 = 2;

impl Wire for Attr {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            Attr::Scalar(value) => {
                writer.write_u8(ATTR_SCALAR);
                value.ser(writer);
            }
            Attr::Set(entries) => {
                writer.write_u8(ATTR_SET);
                // u32 count to match sequence framing; sets grow with
                // runtime data, not with the declared schema.
                writer.write_u32(entries.len() as u32);
                for (key, value) in entries {
                    key.ser(writer);
                    value.ser(writer);
                }
            }
            Attr::List(items) => {
                writer.write_u8(ATTR_LIST);
                items.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            ATTR_SCALAR => Ok(Attr::Scalar(Value::de(reader)?)),
            ATTR_SET => {
                let count = reader.read_u32()? as usize;
                let mut entries = BTreeMap::new();
                for _ in 0..count {
                    let key = Key::de(reader)?;
                    let value = Value::de(reader)?;
                    entries.insert(key, value);
                }
                Ok(Attr::Set(entries))
            }
            ATTR_LIST => Ok(Attr::List(Vec::de(reader)?)),
            tag => Err(CodecError::BadTag { tag }),
        }
    }
}

/// The live attribute table of an object, in schema declaration order.
///
/// Both endpoints hold state in this form: the server's canonical
/// objects and the client's subscribed mirrors, so event application
/// (see [`crate::ObjectEvent::apply`]) behaves identically on each side.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    fields: Vec<(String, Attr)>,
}

impl Attributes {
    pub fn from_schema(schema: &ObjectSchema) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|descriptor| {
                let attr = match &descriptor.kind {
                    FieldKind::Scalar(initial) => Attr::Scalar(initial.clone()),
                    FieldKind::Set => Attr::Set(BTreeMap::new()),
                    FieldKind::List => Attr::List(Vec::new()),
                };
                (descriptor.name.clone(), attr)
            })
            .collect();
        Self { fields }
    }

    pub fn from_snapshot(snapshot: &ObjectSnapshot) -> Self {
        Self {
            fields: snapshot.attributes.clone(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, attr)| attr)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Attr> {
        self.fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .map(|(_, attr)| attr)
    }

    pub fn scalar(&self, name: &str) -> Option<&Value> {
        match self.get(name) {
            Some(Attr::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    pub fn set_entries(&self, name: &str) -> Option<&BTreeMap<Key, Value>> {
        match self.get(name) {
            Some(Attr::Set(entries)) => Some(entries),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&Vec<Value>> {
        match self.get(name) {
            Some(Attr::List(items)) => Some(items),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Attr)> {
        self.fields.iter()
    }

    /// Produces the subscriber-visible copy of this object's state.
    pub fn snapshot(&self, oid: Oid) -> ObjectSnapshot {
        ObjectSnapshot {
            oid,
            attributes: self.fields.clone(),
        }
    }
}

/// A private, subscriber-visible copy of an object's full state at
/// subscription time. Attribute order follows schema declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSnapshot {
    pub oid: Oid,
    pub attributes: Vec<(String, Attr)>,
}

impl Wire for ObjectSnapshot {
    fn ser(&self, writer: &mut ByteWriter) {
        self.oid.ser(writer);
        writer.write_u16(self.attributes.len() as u16);
        for (name, attr) in &self.attributes {
            name.ser(writer);
            attr.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        let oid = Oid::de(reader)?;
        let count = reader.read_u16()? as usize;
        let mut attributes = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let name = String::de(reader)?;
            let attr = Attr::de(reader)?;
            attributes.push((name, attr));
        }
        Ok(Self { oid, attributes })
    }
}
