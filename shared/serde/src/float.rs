use crate::{byte_reader::ByteReader, byte_writer::ByteWriter, error::SerdeErr};

/// IEEE-754 float widths, network byte order
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    pub fn bytes(self) -> usize {
        match self {
            FloatWidth::F32 => 4,
            FloatWidth::F64 => 8,
        }
    }

    /// Writes `value`, narrowing to single precision for [`FloatWidth::F32`]
    pub fn write(self, value: f64, writer: &mut ByteWriter) {
        match self {
            FloatWidth::F32 => writer.write_bytes(&(value as f32).to_be_bytes()),
            FloatWidth::F64 => writer.write_bytes(&value.to_be_bytes()),
        }
    }

    pub fn read(self, reader: &mut ByteReader) -> Result<f64, SerdeErr> {
        match self {
            FloatWidth::F32 => {
                let bytes = reader.read_bytes(4)?;
                let mut raw = [0u8; 4];
                raw.copy_from_slice(bytes);
                Ok(f64::from(f32::from_be_bytes(raw)))
            }
            FloatWidth::F64 => {
                let bytes = reader.read_bytes(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                Ok(f64::from_be_bytes(raw))
            }
        }
    }
}
