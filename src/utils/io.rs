use crate::error::SmallError;

/// Cursor over an in-memory page buffer.
pub struct SmallReader<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> SmallReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    pub fn read_exact(&mut self, bytes_count: usize) -> Result<&'a [u8], SmallError> {
        let start = self.cursor;
        let end = self.cursor + bytes_count;

        if end > self.buf.len() {
            return Err(SmallError::io("read out of boundary"));
        }

        self.cursor = end;
        Ok(&self.buf[start..end])
    }

    pub fn read_i32(&mut self) -> Result<i32, SmallError> {
        let bytes = self.read_exact(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, SmallError> {
        let bytes = self.read_exact(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

pub struct SmallWriter {
    buf: Vec<u8>,
}

impl SmallWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn write<T: Encodeable>(&mut self, obj: &T) {
        self.buf.extend_from_slice(obj.encode().as_slice());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.buf.clone()
    }

    /// Serialize to a fixed-size buffer, padding the tail with zeros.
    pub fn to_padded_bytes(&self, size: usize) -> Vec<u8> {
        let mut buf = self.buf.clone();

        if buf.len() > size {
            panic!(
                "buffer size is larger than the given size: {} > {}",
                buf.len(),
                size
            );
        }

        buf.resize(size, 0);
        buf
    }
}

pub trait Encodeable {
    fn encode(&self) -> Vec<u8>;
}
