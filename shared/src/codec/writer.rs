/// Accumulates one outbound frame. All multi-byte integers are written
/// big-endian; strings are u16-length-prefixed, sequences carry a u32
/// count.
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a u16 length prefix followed by the string's UTF-8 bytes.
    /// Strings longer than the prefix can express are truncated at a
    /// character boundary; wire strings are short identifiers and
    /// reasons, so this is a guard, not an expected path.
    pub fn write_string(&mut self, value: &str) {
        let mut bytes = value.as_bytes();
        if bytes.len() > u16::MAX as usize {
            let mut end = u16::MAX as usize;
            while !value.is_char_boundary(end) {
                end -= 1;
            }
            bytes = &bytes[..end];
        }
        self.write_u16(bytes.len() as u16);
        self.buffer.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn finish(self) -> Box<[u8]> {
        self.buffer.into_boxed_slice()
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}
