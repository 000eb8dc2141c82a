use std::hash::{Hash, Hasher};

use replicant_serde::Bitfield;

use crate::{handler::DataType, roles::Roles, types::ReplicableId};

/// A dynamically typed field, parameter or wire value.
///
/// `None` is the unset value: every field accepts it regardless of its type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Bits(Bitfield),
    List(Vec<Value>),
    Struct(Vec<Value>),
    Roles(Roles),
    /// Weak reference to a replicable in the same scene, by unique id
    Replicable(Option<ReplicableId>),
    /// Name of a replicable kind
    Kind(String),
}

impl Value {
    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::UInt(_) => "unsigned integer",
            Value::Int(_) => "signed integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Bits(_) => "bitfield",
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
            Value::Roles(_) => "roles",
            Value::Replicable(_) => "replicable reference",
            Value::Kind(_) => "kind",
        }
    }

    /// The data type a field declared only by this example value would take,
    /// if it can be inferred
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Bool(_) => Some(DataType::BOOL),
            Value::UInt(_) => Some(DataType::INTEGER),
            Value::Int(_) => Some(DataType::SIGNED_INTEGER),
            Value::Float(_) => Some(DataType::FLOAT),
            Value::Text(_) => Some(DataType::TEXT),
            Value::Bytes(_) => Some(DataType::BYTES),
            Value::Bits(_) => Some(DataType::BITFIELD),
            Value::Roles(_) => Some(DataType::ROLES),
            Value::Replicable(_) => Some(DataType::REPLICABLE),
            Value::Kind(_) => Some(DataType::KIND),
            Value::None | Value::List(_) | Value::Struct(_) => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) | Value::Kind(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_roles(&self) -> Option<&Roles> {
        match self {
            Value::Roles(roles) => Some(roles),
            _ => None,
        }
    }

    pub fn as_replicable(&self) -> Option<Option<ReplicableId>> {
        match self {
            Value::Replicable(id) => Some(*id),
            _ => None,
        }
    }

    /// A description the value carries for itself, overriding structural
    /// hashing
    pub fn intrinsic_description(&self) -> Option<u64> {
        match self {
            Value::Roles(roles) => Some(roles.description()),
            _ => None,
        }
    }

    /// Feeds the value's structure into `state`. Floats hash by bit pattern.
    pub fn hash_structure<H: Hasher>(&self, state: &mut H) {
        self.type_name().hash(state);
        match self {
            Value::None => {}
            Value::Bool(value) => value.hash(state),
            Value::UInt(value) => value.hash(state),
            Value::Int(value) => value.hash(state),
            Value::Float(value) => value.to_bits().hash(state),
            Value::Text(value) | Value::Kind(value) => value.hash(state),
            Value::Bytes(value) => value.hash(state),
            Value::Bits(value) => value.hash(state),
            Value::List(values) | Value::Struct(values) => {
                values.len().hash(state);
                for value in values {
                    value.hash_structure(state);
                }
            }
            Value::Roles(roles) => roles.description().hash(state),
            Value::Replicable(id) => id.hash(state),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::UInt(u64::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::UInt(u64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(u64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Bitfield> for Value {
    fn from(value: Bitfield) -> Self {
        Value::Bits(value)
    }
}

impl From<Roles> for Value {
    fn from(value: Roles) -> Self {
        Value::Roles(value)
    }
}
