use replicant_serde::{ByteReader, ByteWriter, FloatWidth, IntegerWidth, SerdeErr};

use super::{DataType, Handler, HandlerError};
use crate::value::Value;

/// Length header used when a text or bytes flag gives no `max_length`
pub const DEFAULT_MAX_LENGTH: u64 = 255;

/// Integer width used when an integer flag gives neither `max_value` nor
/// `max_bits`
pub const DEFAULT_INTEGER_BITS: u32 = 8;

fn mismatch(expected: DataType, value: &Value) -> HandlerError {
    HandlerError::TypeMismatch {
        expected,
        found: value.type_name(),
    }
}

#[derive(Debug)]
pub struct UnsignedHandler {
    width: IntegerWidth,
    max_value: Option<u64>,
}

impl UnsignedHandler {
    pub fn new(width: IntegerWidth) -> Self {
        Self {
            width,
            max_value: None,
        }
    }

    /// Bounds accepted values by the flag's `max_value`
    pub fn with_max_value(mut self, max_value: Option<u64>) -> Self {
        self.max_value = max_value;
        self
    }

    pub fn width(&self) -> IntegerWidth {
        self.width
    }
}

impl Handler for UnsignedHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        match value {
            Value::UInt(value) => Ok(self.width.write_unsigned(*value, writer)?),
            Value::Int(value) => Err(SerdeErr::NegativeUnsigned {
                value: i128::from(*value),
            }
            .into()),
            other => Err(mismatch(DataType::INTEGER, other)),
        }
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        Ok(Value::UInt(self.width.read_unsigned(reader)?))
    }

    fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::UInt(value) => self.max_value.map_or(true, |max_value| *value <= max_value),
            _ => false,
        }
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.width.bytes())
    }
}

#[derive(Debug)]
pub struct SignedHandler {
    width: IntegerWidth,
    max_magnitude: Option<u64>,
}

impl SignedHandler {
    pub fn new(width: IntegerWidth) -> Self {
        Self {
            width,
            max_magnitude: None,
        }
    }

    /// Bounds accepted values to `-max_magnitude..=max_magnitude`
    pub fn with_max_magnitude(mut self, max_magnitude: Option<u64>) -> Self {
        self.max_magnitude = max_magnitude;
        self
    }

    pub fn width(&self) -> IntegerWidth {
        self.width
    }
}

impl Handler for SignedHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        match value {
            Value::Int(value) => Ok(self.width.write_signed(*value, writer)?),
            other => Err(mismatch(DataType::SIGNED_INTEGER, other)),
        }
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        Ok(Value::Int(self.width.read_signed(reader)?))
    }

    fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::Int(value) => self
                .max_magnitude
                .map_or(true, |max_magnitude| value.unsigned_abs() <= max_magnitude),
            _ => false,
        }
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.width.bytes())
    }
}

#[derive(Debug)]
pub struct FloatHandler {
    width: FloatWidth,
}

impl FloatHandler {
    pub fn new(width: FloatWidth) -> Self {
        Self { width }
    }
}

impl Handler for FloatHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        match value {
            Value::Float(value) => {
                self.width.write(*value, writer);
                Ok(())
            }
            other => Err(mismatch(DataType::FLOAT, other)),
        }
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        Ok(Value::Float(self.width.read(reader)?))
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Float(_))
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.width.bytes())
    }
}

/// Booleans share the one-byte unsigned wire format
#[derive(Debug)]
pub struct BoolHandler;

impl Handler for BoolHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        match value {
            Value::Bool(value) => Ok(IntegerWidth::W8.write_unsigned(u64::from(*value), writer)?),
            other => Err(mismatch(DataType::BOOL, other)),
        }
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        Ok(Value::Bool(IntegerWidth::W8.read_unsigned(reader)? != 0))
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Bytes,
    Text,
}

/// Length-prefixed raw bytes or UTF-8 text
#[derive(Debug)]
pub struct LengthPrefixedHandler {
    payload: Payload,
    header: IntegerWidth,
    max_length: u64,
}

impl LengthPrefixedHandler {
    pub fn new(payload: Payload, max_length: u64) -> Self {
        Self {
            payload,
            header: IntegerWidth::for_unsigned(max_length),
            max_length,
        }
    }

    pub fn header_width(&self) -> IntegerWidth {
        self.header
    }

    fn data_type(&self) -> DataType {
        match self.payload {
            Payload::Bytes => DataType::BYTES,
            Payload::Text => DataType::TEXT,
        }
    }

    fn content<'v>(&self, value: &'v Value) -> Result<&'v [u8], HandlerError> {
        let content = match (self.payload, value) {
            (Payload::Bytes, Value::Bytes(bytes)) => bytes.as_slice(),
            (Payload::Text, Value::Text(text)) => text.as_bytes(),
            (_, other) => return Err(mismatch(self.data_type(), other)),
        };
        if content.len() as u64 > self.max_length {
            return Err(SerdeErr::LengthExceeded {
                length: content.len(),
                max_length: self.max_length,
            }
            .into());
        }
        Ok(content)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, HandlerError> {
        match self.payload {
            Payload::Bytes => Ok(Value::Bytes(bytes.to_vec())),
            Payload::Text => match std::str::from_utf8(bytes) {
                Ok(text) => Ok(Value::Text(text.to_string())),
                Err(_) => Err(SerdeErr::InvalidUtf8 {
                    length: bytes.len(),
                }
                .into()),
            },
        }
    }

    fn read_length(&self, reader: &mut ByteReader) -> Result<usize, HandlerError> {
        let length = self.header.read_unsigned(reader)?;
        if length > self.max_length {
            return Err(SerdeErr::LengthExceeded {
                length: usize::try_from(length).unwrap_or(usize::MAX),
                max_length: self.max_length,
            }
            .into());
        }
        // bounded by max_length, which fits the header width
        Ok(usize::try_from(length).unwrap_or(usize::MAX))
    }
}

impl Handler for LengthPrefixedHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        let content = self.content(value)?;
        self.header.write_unsigned(content.len() as u64, writer)?;
        writer.write_bytes(content);
        Ok(())
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        let length = self.read_length(reader)?;
        let bytes = reader.read_bytes(length)?;
        self.decode(bytes)
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self.payload, value) {
            (Payload::Bytes, Value::Bytes(bytes)) => bytes.len() as u64 <= self.max_length,
            (Payload::Text, Value::Text(text)) => text.len() as u64 <= self.max_length,
            _ => false,
        }
    }

    fn size(&self, bytes: &[u8]) -> Result<usize, HandlerError> {
        let mut reader = ByteReader::new(bytes);
        let length = self.read_length(&mut reader)?;
        Ok(self.header.bytes() + length)
    }

    /// All lengths first, then all payloads
    fn write_multiple(&self, values: &[Value], writer: &mut ByteWriter) -> Result<(), HandlerError> {
        let contents = values
            .iter()
            .map(|value| self.content(value))
            .collect::<Result<Vec<_>, _>>()?;
        for content in &contents {
            self.header.write_unsigned(content.len() as u64, writer)?;
        }
        for content in contents {
            writer.write_bytes(content);
        }
        Ok(())
    }

    fn read_multiple(&self, reader: &mut ByteReader, count: usize) -> Result<Vec<Value>, HandlerError> {
        let mut lengths = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            lengths.push(self.read_length(reader)?);
        }
        lengths
            .into_iter()
            .map(|length| {
                let bytes = reader.read_bytes(length)?;
                self.decode(bytes)
            })
            .collect()
    }
}
