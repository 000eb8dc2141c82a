use thiserror::Error;

use replicant_serde::SerdeErr;

use super::DataType;

/// Errors raised while resolving handlers or packing values through them
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Neither the type nor any of its ancestors has a registered factory
    #[error("No handler registered for type '{data_type}' or any of its ancestors")]
    NoHandler { data_type: DataType },

    /// Factories may only be registered before the first resolution
    #[error("Cannot register a handler for '{data_type}': the registry is locked after first use")]
    RegistryLocked { data_type: DataType },

    /// A value of the wrong shape was given to a handler
    #[error("Handler for '{expected}' cannot encode a {found} value")]
    TypeMismatch {
        expected: DataType,
        found: &'static str,
    },

    /// Lists and structs need element type flags
    #[error("Type '{data_type}' requires element type flags")]
    MissingElementType { data_type: DataType },

    /// A decoded role byte is outside the known roles
    #[error("Unknown role discriminant {value}")]
    UnknownRole { value: u8 },

    #[error(transparent)]
    Serde(#[from] SerdeErr),
}
