//! # Replicant Serde
//! Byte-level building blocks for the replicant wire format: a growable
//! writer, a bounds-checked reader, fixed-width integer and float codecs and
//! a compact [`Bitfield`].

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bitfield;
mod byte_reader;
mod byte_writer;
mod error;
mod float;
mod integer;

pub use bitfield::Bitfield;
pub use byte_reader::ByteReader;
pub use byte_writer::ByteWriter;
pub use error::SerdeErr;
pub use float::FloatWidth;
pub use integer::{bit_length, bits_to_bytes, next_or_equal_power_of_two, IntegerWidth};
