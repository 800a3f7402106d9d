//! Strict byte-oriented wire codec.
//!
//! Every wire type implements [`Wire`] by hand with a fixed field order;
//! there is no reflection and no self-describing framing. Decoding is
//! strict: reads past the end of a frame, unknown type codes, and bytes
//! left over after a frame are all hard errors.

mod error;
mod reader;
mod writer;

pub use error::CodecError;
pub use reader::ByteReader;
pub use writer::ByteWriter;

/// A type with a fixed wire representation.
pub trait Wire: Sized {
    fn ser(&self, writer: &mut ByteWriter);
    fn de(reader: &mut ByteReader) -> Result<Self, CodecError>;
}

impl Wire for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u8(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            code => Err(CodecError::BadTag { tag: code }),
        }
    }
}

impl Wire for u8 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u8(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        reader.read_u8()
    }
}

impl Wire for u16 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u16(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        reader.read_u16()
    }
}

impl Wire for u32 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u32(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        reader.read_u32()
    }
}

impl Wire for u64 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u64(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        reader.read_u64()
    }
}

impl Wire for i16 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u16(*self as u16);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        Ok(reader.read_u16()? as i16)
    }
}

impl Wire for i64 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u64(*self as u64);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        Ok(reader.read_u64()? as i64)
    }
}

impl Wire for f64 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u64(self.to_bits());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        Ok(f64::from_bits(reader.read_u64()?))
    }
}

impl Wire for String {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_string(self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        reader.read_string()
    }
}

impl<T: Wire> Wire for Vec<T> {
    // u32 count: a committed transaction travels as one batch, and a
    // large batch can exceed the u16 range.
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.len() as u32);
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        let count = reader.read_u32()? as usize;
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            items.push(T::de(reader)?);
        }
        Ok(items)
    }
}

impl<A: Wire, B: Wire> Wire for (A, B) {
    fn ser(&self, writer: &mut ByteWriter) {
        self.0.ser(writer);
        self.1.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        Ok((A::de(reader)?, B::de(reader)?))
    }
}
