use std::fmt::Debug;

use replicant_serde::{ByteReader, ByteWriter, SerdeErr};

use super::HandlerError;
use crate::value::Value;

/// A stateless codec bound to one [`TypeFlag`](super::TypeFlag).
///
/// Implementors provide single-value `write`/`read` plus `accepts`; batch
/// and byte-slice helpers are derived from those. Variable-length handlers
/// override the batch methods to share one length table.
pub trait Handler: Send + Sync + Debug {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError>;

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError>;

    /// Whether `value` has the shape this handler encodes. `Value::None` is
    /// accepted by field assignment separately and never reaches a handler.
    fn accepts(&self, value: &Value) -> bool;

    /// Encoded size when every value has the same width
    fn fixed_size(&self) -> Option<usize> {
        None
    }

    fn write_multiple(&self, values: &[Value], writer: &mut ByteWriter) -> Result<(), HandlerError> {
        for value in values {
            self.write(value, writer)?;
        }
        Ok(())
    }

    fn read_multiple(&self, reader: &mut ByteReader, count: usize) -> Result<Vec<Value>, HandlerError> {
        let mut values = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            values.push(self.read(reader)?);
        }
        Ok(values)
    }

    /// Number of bytes the value at the start of `bytes` occupies
    fn size(&self, bytes: &[u8]) -> Result<usize, HandlerError> {
        match self.fixed_size() {
            Some(size) => Ok(size),
            None => self.unpack_from(bytes, 0).map(|(_, consumed)| consumed),
        }
    }

    fn pack(&self, value: &Value) -> Result<Vec<u8>, HandlerError> {
        let mut writer = ByteWriter::new();
        self.write(value, &mut writer)?;
        Ok(writer.to_bytes())
    }

    fn pack_multiple(&self, values: &[Value], count: usize) -> Result<Vec<u8>, HandlerError> {
        if values.len() != count {
            return Err(SerdeErr::CountMismatch {
                expected: count,
                actual: values.len(),
            }
            .into());
        }
        let mut writer = ByteWriter::new();
        self.write_multiple(values, &mut writer)?;
        Ok(writer.to_bytes())
    }

    /// Decodes one value starting at `offset`, returning it with the number
    /// of bytes consumed
    fn unpack_from(&self, bytes: &[u8], offset: usize) -> Result<(Value, usize), HandlerError> {
        let mut reader = ByteReader::at(bytes, offset)?;
        let value = self.read(&mut reader)?;
        Ok((value, reader.position() - offset))
    }

    fn unpack_multiple(
        &self,
        bytes: &[u8],
        count: usize,
        offset: usize,
    ) -> Result<(Vec<Value>, usize), HandlerError> {
        let mut reader = ByteReader::at(bytes, offset)?;
        let values = self.read_multiple(&mut reader, count)?;
        Ok((values, reader.position() - offset))
    }
}
