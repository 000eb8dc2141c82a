use replicant_serde::{ByteReader, ByteWriter, IntegerWidth};

use super::{native::DEFAULT_MAX_LENGTH, DataType, Handler, HandlerError};
use crate::{
    roles::{Role, Roles},
    value::Value,
};

/// Two role bytes, written from the receiver's point of view: the sender's
/// remote role becomes the receiver's local role
#[derive(Debug)]
pub struct RolesHandler;

impl RolesHandler {
    fn read_role(reader: &mut ByteReader) -> Result<Role, HandlerError> {
        let value = reader.read_byte()?;
        Role::from_u8(value).ok_or(HandlerError::UnknownRole { value })
    }
}

impl Handler for RolesHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        let Value::Roles(roles) = value else {
            return Err(HandlerError::TypeMismatch {
                expected: DataType::ROLES,
                found: value.type_name(),
            });
        };
        let switched = roles.switched();
        writer.write_byte(switched.local.to_u8());
        writer.write_byte(switched.remote.to_u8());
        Ok(())
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        let local = Self::read_role(reader)?;
        let remote = Self::read_role(reader)?;
        Ok(Value::Roles(Roles::new(local, remote)))
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Roles(_))
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(2)
    }
}

/// Presence byte followed by the unique id, when present
#[derive(Debug)]
pub struct ReplicableRefHandler {
    id_width: IntegerWidth,
}

impl ReplicableRefHandler {
    pub fn new(id_width: IntegerWidth) -> Self {
        Self { id_width }
    }
}

impl Handler for ReplicableRefHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        match value {
            Value::Replicable(None) => {
                writer.write_byte(0);
                Ok(())
            }
            Value::Replicable(Some(id)) => {
                writer.write_byte(1);
                Ok(self.id_width.write_unsigned(*id, writer)?)
            }
            other => Err(HandlerError::TypeMismatch {
                expected: DataType::REPLICABLE,
                found: other.type_name(),
            }),
        }
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        match reader.read_byte()? {
            0 => Ok(Value::Replicable(None)),
            _ => Ok(Value::Replicable(Some(self.id_width.read_unsigned(reader)?))),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Replicable(_))
    }
}

/// Kind names travel as short text
#[derive(Debug)]
pub struct KindHandler {
    header: IntegerWidth,
}

impl Default for KindHandler {
    fn default() -> Self {
        Self {
            header: IntegerWidth::for_unsigned(DEFAULT_MAX_LENGTH),
        }
    }
}

impl Handler for KindHandler {
    fn write(&self, value: &Value, writer: &mut ByteWriter) -> Result<(), HandlerError> {
        let Value::Kind(name) = value else {
            return Err(HandlerError::TypeMismatch {
                expected: DataType::KIND,
                found: value.type_name(),
            });
        };
        self.header.write_unsigned(name.len() as u64, writer)?;
        writer.write_bytes(name.as_bytes());
        Ok(())
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Value, HandlerError> {
        let length = self.header.read_unsigned(reader)?;
        let bytes = reader.read_bytes(usize::try_from(length).unwrap_or(usize::MAX))?;
        match std::str::from_utf8(bytes) {
            Ok(name) => Ok(Value::Kind(name.to_string())),
            Err(_) => Err(replicant_serde::SerdeErr::InvalidUtf8 {
                length: bytes.len(),
            }
            .into()),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Kind(name) if name.len() as u64 <= DEFAULT_MAX_LENGTH)
    }
}
