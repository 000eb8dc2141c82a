use crate::error::SerdeErr;

/// A cursor over received bytes.
///
/// Every read is bounds-checked; running past the end yields
/// [`SerdeErr::BufferUnderflow`] instead of panicking, since the bytes come
/// from an untrusted peer.
#[derive(Clone)]
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Creates a reader that starts `offset` bytes into `buffer`
    pub fn at(buffer: &'a [u8], offset: usize) -> Result<Self, SerdeErr> {
        if offset > buffer.len() {
            return Err(SerdeErr::BufferUnderflow {
                offset: 0,
                needed: offset,
                available: buffer.len(),
            });
        }
        Ok(Self {
            buffer,
            cursor: offset,
        })
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], SerdeErr> {
        let available = self.remaining();
        if count > available {
            return Err(SerdeErr::BufferUnderflow {
                offset: self.cursor,
                needed: count,
                available,
            });
        }
        let start = self.cursor;
        self.cursor += count;
        Ok(&self.buffer[start..self.cursor])
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current offset into the underlying buffer
    pub fn position(&self) -> usize {
        self.cursor
    }
}
