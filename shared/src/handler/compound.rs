use std::sync::Arc;

use replicant_serde::{Bitfield, ByteReader, ByteWriter, IntegerWidth, SerdeErr};

use super::{DataType, Handler, HandlerError};
use crate::value::Value;

fn check_count(count: usize, max_length: u64) -> Result<(), HandlerError> {
    if count as u64 > max_length {
        return Err(SerdeErr::LengthExceeded {
            length: count,
            max_length,
        }
        .into());
    }
    Ok(())
}

/// Bit count header followed by the packed bits
#[derive(Debug)]
pub struct BitfieldHandler {
    header: IntegerWidth,
    max_length: u64,
}

impl BitfieldHandler {
    pub fn new(max_length: u64) -> Self {
        Self {
            header: IntegerWidth::for_unsigned(max_length),
            max_length,
        }
    }
}

impl Handler for BitfieldHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        let Value::Bits(bits) = value else {
            return Err(HandlerError::TypeMismatch {
                expected: DataType::BITFIELD,
                found: value.type_name(),
            });
        };
        check_count(bits.len(), self.max_length)?;
        self.header.write_unsigned(bits.len() as u64, writer)?;
        bits.pack(writer);
        Ok(())
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        let length = self.header.read_unsigned(reader)?;
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        check_count(length, self.max_length)?;
        Ok(Value::Bits(Bitfield::unpack(reader, length)?))
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Bits(bits) if bits.len() as u64 <= self.max_length)
    }
}

/// Element count followed by the elements packed as one batch
#[derive(Debug)]
pub struct ListHandler {
    header: IntegerWidth,
    max_length: u64,
    element: Arc<dyn Handler>,
}

impl ListHandler {
    pub fn new(element: Arc<dyn Handler>, max_length: u64) -> Self {
        Self {
            header: IntegerWidth::for_unsigned(max_length),
            max_length,
            element,
        }
    }
}

impl Handler for ListHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        let Value::List(values) = value else {
            return Err(HandlerError::TypeMismatch {
                expected: DataType::LIST,
                found: value.type_name(),
            });
        };
        check_count(values.len(), self.max_length)?;
        self.header.write_unsigned(values.len() as u64, writer)?;
        self.element.write_multiple(values, writer)
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        let count = self.header.read_unsigned(reader)?;
        let count = usize::try_from(count).unwrap_or(usize::MAX);
        check_count(count, self.max_length)?;
        Ok(Value::List(self.element.read_multiple(reader, count)?))
    }

    fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::List(values) => {
                values.len() as u64 <= self.max_length
                    && values.iter().all(|value| self.element.accepts(value))
            }
            _ => false,
        }
    }
}

/// A fixed sequence of members, each with its own handler
#[derive(Debug)]
pub struct StructHandler {
    members: Vec<Arc<dyn Handler>>,
}

impl StructHandler {
    pub fn new(members: Vec<Arc<dyn Handler>>) -> Self {
        Self { members }
    }
}

impl Handler for StructHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        let Value::Struct(values) = value else {
            return Err(HandlerError::TypeMismatch {
                expected: DataType::STRUCT,
                found: value.type_name(),
            });
        };
        if values.len() != self.members.len() {
            return Err(SerdeErr::CountMismatch {
                expected: self.members.len(),
                actual: values.len(),
            }
            .into());
        }
        for (member, value) in self.members.iter().zip(values) {
            member.write(value, writer)?;
        }
        Ok(())
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        let values = self
            .members
            .iter()
            .map(|member| member.read(reader))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Struct(values))
    }

    fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::Struct(values) => {
                values.len() == self.members.len()
                    && self
                        .members
                        .iter()
                        .zip(values)
                        .all(|(member, value)| member.accepts(value))
            }
            _ => false,
        }
    }

    fn fixed_size(&self) -> Option<usize> {
        self.members.iter().map(|member| member.fixed_size()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::native::{LengthPrefixedHandler, Payload, UnsignedHandler};

    #[test]
    fn bitfield_carries_its_length() {
        let handler = BitfieldHandler::new(255);
        let bits = Bitfield::from_bools(&[true, false, true]);
        let bytes = handler.pack(&Value::Bits(bits.clone())).unwrap();
        assert_eq!(bytes, vec![3, 0b101]);
        assert_eq!(handler.unpack_from(&bytes, 0).unwrap(), (Value::Bits(bits), 2));
    }

    #[test]
    fn list_of_text_uses_shared_length_table() {
        let element: Arc<dyn Handler> = Arc::new(LengthPrefixedHandler::new(Payload::Text, 255));
        let handler = ListHandler::new(element, 255);
        let value = Value::List(vec![Value::from("a"), Value::from("bc")]);

        let bytes = handler.pack(&value).unwrap();
        assert_eq!(bytes, vec![2, 1, 2, b'a', b'b', b'c']);
        assert_eq!(handler.unpack_from(&bytes, 0).unwrap(), (value, 6));
    }

    #[test]
    fn list_rejects_foreign_elements() {
        let element: Arc<dyn Handler> = Arc::new(UnsignedHandler::new(IntegerWidth::W8));
        let handler = ListHandler::new(element, 255);
        assert!(handler.accepts(&Value::List(vec![Value::UInt(1)])));
        assert!(!handler.accepts(&Value::List(vec![Value::from("x")])));
    }

    #[test]
    fn struct_of_fixed_members_is_fixed() {
        let handler = StructHandler::new(vec![
            Arc::new(UnsignedHandler::new(IntegerWidth::W8)),
            Arc::new(UnsignedHandler::new(IntegerWidth::W32)),
        ]);
        assert_eq!(handler.fixed_size(), Some(5));

        let value = Value::Struct(vec![Value::UInt(1), Value::UInt(2)]);
        let bytes = handler.pack(&value).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 2]);
        assert_eq!(handler.size(&bytes).unwrap(), 5);
    }

    #[test]
    fn struct_member_count_must_match() {
        let handler = StructHandler::new(vec![Arc::new(UnsignedHandler::new(IntegerWidth::W8))]);
        assert!(!handler.accepts(&Value::Struct(vec![])));
        assert!(handler.pack(&Value::Struct(vec![])).is_err());
    }
}
