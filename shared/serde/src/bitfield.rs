use crate::{byte_reader::ByteReader, byte_writer::ByteWriter, error::SerdeErr};

/// A fixed-length sequence of flags packed into `ceil(len / 8)` bytes.
///
/// Bit `i` lives in byte `i / 8` at position `i % 8`, least significant bit
/// first. The length itself is never written by [`Bitfield::pack`]; both ends
/// must agree on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bitfield {
    bits: Vec<bool>,
}

impl Bitfield {
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    pub fn from_bools(bits: &[bool]) -> Self {
        Self {
            bits: bits.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Sets a flag; out-of-range indices are ignored and return false
    pub fn set(&mut self, index: usize, value: bool) -> bool {
        match self.bits.get_mut(index) {
            Some(bit) => {
                *bit = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, value: bool) {
        self.bits.push(value);
    }

    pub fn any(&self) -> bool {
        self.bits.iter().any(|bit| *bit)
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    pub fn to_bools(&self) -> Vec<bool> {
        self.bits.clone()
    }

    /// Bytes occupied on the wire by a field of `len` flags
    pub fn footprint(len: usize) -> usize {
        len.div_ceil(8)
    }

    pub fn pack(&self, writer: &mut ByteWriter) {
        for chunk in self.bits.chunks(8) {
            let mut byte = 0u8;
            for (position, bit) in chunk.iter().enumerate() {
                if *bit {
                    byte |= 1 << position;
                }
            }
            writer.write_byte(byte);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(Self::footprint(self.len()));
        self.pack(&mut writer);
        writer.to_bytes()
    }

    /// Reads `len` flags; padding bits in the final byte are ignored
    pub fn unpack(reader: &mut ByteReader, len: usize) -> Result<Self, SerdeErr> {
        let bytes = reader.read_bytes(Self::footprint(len))?;
        let mut bits = Vec::with_capacity(len);
        for index in 0..len {
            bits.push(bytes[index / 8] & (1 << (index % 8)) != 0);
        }
        Ok(Self { bits })
    }
}
