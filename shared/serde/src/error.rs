use thiserror::Error;

/// Errors that can occur while packing or unpacking wire values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// Not enough bytes remain in the buffer
    #[error("Buffer underflow: needed {needed} bytes at offset {offset}, but only {available} remain")]
    BufferUnderflow {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A requested integer width exceeds the widest supported integer (64 bits)
    #[error("Integer too large to pack: {bytes} bytes required, at most 8 are supported")]
    IntegerTooWide { bytes: usize },

    /// A value does not fit in the width selected for it
    #[error("Value {value} does not fit in {bytes} byte(s)")]
    ValueTooLarge { value: i128, bytes: usize },

    /// A negative value was given to an unsigned codec
    #[error("Cannot encode negative value {value} with an unsigned codec")]
    NegativeUnsigned { value: i128 },

    /// Text payload was not valid UTF-8
    #[error("Text payload of {length} bytes is not valid UTF-8")]
    InvalidUtf8 { length: usize },

    /// A variable-length payload exceeds its declared maximum length
    #[error("Payload of {length} bytes exceeds the declared maximum length of {max_length}")]
    LengthExceeded { length: usize, max_length: u64 },

    /// Number of values given to a batch codec does not match the count
    #[error("Expected {expected} values for batch packing, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}
