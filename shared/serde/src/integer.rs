use crate::{byte_reader::ByteReader, byte_writer::ByteWriter, error::SerdeErr};

/// Number of bytes needed to hold `bits` bits
pub fn bits_to_bytes(bits: u32) -> usize {
    bits.div_ceil(8) as usize
}

/// Smallest power of two greater than or equal to `value` (0 rounds to 1)
pub fn next_or_equal_power_of_two(value: usize) -> usize {
    value.next_power_of_two()
}

/// Number of significant bits in `value` (0 has none)
pub fn bit_length(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

/// One of the four fixed integer widths that go on the wire, always in
/// network (big-endian) byte order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum IntegerWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntegerWidth {
    /// Smallest width able to hold `total_bytes`, rounded up to a power of two
    pub fn from_byte_length(total_bytes: usize) -> Result<Self, SerdeErr> {
        match next_or_equal_power_of_two(total_bytes) {
            1 => Ok(IntegerWidth::W8),
            2 => Ok(IntegerWidth::W16),
            4 => Ok(IntegerWidth::W32),
            8 => Ok(IntegerWidth::W64),
            _ => Err(SerdeErr::IntegerTooWide { bytes: total_bytes }),
        }
    }

    /// Smallest width able to hold `total_bits` bits
    pub fn from_bit_length(total_bits: u32) -> Result<Self, SerdeErr> {
        Self::from_byte_length(bits_to_bytes(total_bits))
    }

    /// Smallest unsigned width able to represent `max_value`
    pub fn for_unsigned(max_value: u64) -> Self {
        // a u64 never needs more than 8 bytes
        match bits_to_bytes(bit_length(max_value)) {
            0 | 1 => IntegerWidth::W8,
            2 => IntegerWidth::W16,
            3 | 4 => IntegerWidth::W32,
            _ => IntegerWidth::W64,
        }
    }

    /// Smallest signed width able to represent `-max_magnitude..=max_magnitude`
    pub fn for_signed(max_magnitude: u64) -> Result<Self, SerdeErr> {
        Self::from_bit_length(bit_length(max_magnitude) + 1)
    }

    pub fn bytes(self) -> usize {
        match self {
            IntegerWidth::W8 => 1,
            IntegerWidth::W16 => 2,
            IntegerWidth::W32 => 4,
            IntegerWidth::W64 => 8,
        }
    }

    pub fn max_unsigned(self) -> u64 {
        match self {
            IntegerWidth::W8 => u8::MAX as u64,
            IntegerWidth::W16 => u16::MAX as u64,
            IntegerWidth::W32 => u32::MAX as u64,
            IntegerWidth::W64 => u64::MAX,
        }
    }

    pub fn signed_range(self) -> (i64, i64) {
        match self {
            IntegerWidth::W8 => (i8::MIN as i64, i8::MAX as i64),
            IntegerWidth::W16 => (i16::MIN as i64, i16::MAX as i64),
            IntegerWidth::W32 => (i32::MIN as i64, i32::MAX as i64),
            IntegerWidth::W64 => (i64::MIN, i64::MAX),
        }
    }

    pub fn write_unsigned(self, value: u64, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        if value > self.max_unsigned() {
            return Err(SerdeErr::ValueTooLarge {
                value: value as i128,
                bytes: self.bytes(),
            });
        }
        let bytes = value.to_be_bytes();
        writer.write_bytes(&bytes[8 - self.bytes()..]);
        Ok(())
    }

    pub fn read_unsigned(self, reader: &mut ByteReader) -> Result<u64, SerdeErr> {
        let bytes = reader.read_bytes(self.bytes())?;
        let mut value: u64 = 0;
        for byte in bytes {
            value = (value << 8) | u64::from(*byte);
        }
        Ok(value)
    }

    pub fn write_signed(self, value: i64, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        let (min, max) = self.signed_range();
        if value < min || value > max {
            return Err(SerdeErr::ValueTooLarge {
                value: value as i128,
                bytes: self.bytes(),
            });
        }
        let bytes = value.to_be_bytes();
        writer.write_bytes(&bytes[8 - self.bytes()..]);
        Ok(())
    }

    pub fn read_signed(self, reader: &mut ByteReader) -> Result<i64, SerdeErr> {
        let raw = self.read_unsigned(reader)?;
        let shift = 64 - (self.bytes() as u32 * 8);
        // sign-extend from the top bit of the narrow width
        Ok(((raw << shift) as i64) >> shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_selection_from_max_value() {
        assert_eq!(IntegerWidth::for_unsigned(0), IntegerWidth::W8);
        assert_eq!(IntegerWidth::for_unsigned(255), IntegerWidth::W8);
        assert_eq!(IntegerWidth::for_unsigned(256), IntegerWidth::W16);
        assert_eq!(IntegerWidth::for_unsigned(300), IntegerWidth::W16);
        assert_eq!(IntegerWidth::for_unsigned(65_536), IntegerWidth::W32);
        assert_eq!(IntegerWidth::for_unsigned(1 << 40), IntegerWidth::W64);
        assert_eq!(IntegerWidth::for_unsigned(u64::MAX), IntegerWidth::W64);
    }

    #[test]
    fn width_selection_from_bits_rounds_to_power_of_two() {
        assert_eq!(IntegerWidth::from_bit_length(1).unwrap(), IntegerWidth::W8);
        assert_eq!(IntegerWidth::from_bit_length(9).unwrap(), IntegerWidth::W16);
        // 3 bytes round up to 4
        assert_eq!(IntegerWidth::from_bit_length(17).unwrap(), IntegerWidth::W32);
        assert_eq!(IntegerWidth::from_bit_length(40).unwrap(), IntegerWidth::W64);
        assert_eq!(
            IntegerWidth::from_bit_length(65),
            Err(SerdeErr::IntegerTooWide { bytes: 9 })
        );
    }

    #[test]
    fn signed_width_reserves_a_sign_bit() {
        assert_eq!(IntegerWidth::for_signed(127).unwrap(), IntegerWidth::W8);
        assert_eq!(IntegerWidth::for_signed(128).unwrap(), IntegerWidth::W16);
        assert!(IntegerWidth::for_signed(u64::MAX).is_err());
    }

    #[test]
    fn unsigned_is_big_endian() {
        let mut writer = ByteWriter::new();
        IntegerWidth::W16.write_unsigned(300, &mut writer).unwrap();
        assert_eq!(writer.as_slice(), &[0x01, 0x2C]);
    }

    #[test]
    fn unsigned_overflow_is_rejected() {
        let mut writer = ByteWriter::new();
        let result = IntegerWidth::W8.write_unsigned(256, &mut writer);
        assert_eq!(result, Err(SerdeErr::ValueTooLarge { value: 256, bytes: 1 }));
        assert_eq!(writer.bytes_written(), 0);
    }

    #[test]
    fn signed_values_sign_extend() {
        for width in [
            IntegerWidth::W8,
            IntegerWidth::W16,
            IntegerWidth::W32,
            IntegerWidth::W64,
        ] {
            let (min, max) = width.signed_range();
            for value in [min, -1, 0, 1, max] {
                let mut writer = ByteWriter::new();
                width.write_signed(value, &mut writer).unwrap();
                let bytes = writer.to_bytes();
                assert_eq!(bytes.len(), width.bytes());
                let mut reader = ByteReader::new(&bytes);
                assert_eq!(width.read_signed(&mut reader).unwrap(), value);
            }
        }
    }

    #[test]
    fn signed_overflow_is_rejected() {
        let mut writer = ByteWriter::new();
        assert!(IntegerWidth::W8.write_signed(128, &mut writer).is_err());
        assert!(IntegerWidth::W8.write_signed(-129, &mut writer).is_err());
    }
}
