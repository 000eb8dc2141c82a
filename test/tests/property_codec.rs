/// PROPERTY-BASED TESTS: codec invariants
///
/// Key invariants:
/// 1. Every value packs and unpacks to itself
/// 2. Integer widths are the smallest power of two bytes that fit
/// 3. Bitfields are an exact inverse for any length
/// 4. Descriptions are stable for equal values
use proptest::prelude::*;
use replicant_shared::{
    default_description, Bitfield, ByteReader, ByteWriter, Handler, HandlerRegistry, IntegerWidth,
    TypeFlag, Value,
};

fn minimal_bytes(value: u64) -> usize {
    [1usize, 2, 4, 8]
        .into_iter()
        .find(|bytes| *bytes == 8 || value < 1u64 << (bytes * 8))
        .unwrap_or(8)
}

#[test]
fn known_widths() {
    assert_eq!(IntegerWidth::for_unsigned(255).bytes(), 1);
    assert_eq!(IntegerWidth::for_unsigned(256).bytes(), 2);
    assert_eq!(IntegerWidth::for_unsigned(300).bytes(), 2);
    assert_eq!(IntegerWidth::for_unsigned(u64::MAX).bytes(), 8);
}

proptest! {
    #[test]
    fn prop_unsigned_width_is_minimal(value in any::<u64>()) {
        prop_assert_eq!(IntegerWidth::for_unsigned(value).bytes(), minimal_bytes(value));
    }

    #[test]
    fn prop_unsigned_round_trip(value in any::<u64>()) {
        let width = IntegerWidth::for_unsigned(value);
        let mut writer = ByteWriter::new();
        width.write_unsigned(value, &mut writer).unwrap();
        let bytes = writer.to_bytes();
        prop_assert_eq!(bytes.len(), width.bytes());

        let mut reader = ByteReader::new(&bytes);
        prop_assert_eq!(width.read_unsigned(&mut reader).unwrap(), value);
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn prop_signed_round_trip(value in i64::MIN + 1..=i64::MAX) {
        let width = IntegerWidth::for_signed(value.unsigned_abs()).unwrap();
        let mut writer = ByteWriter::new();
        width.write_signed(value, &mut writer).unwrap();
        let bytes = writer.to_bytes();

        let mut reader = ByteReader::new(&bytes);
        prop_assert_eq!(width.read_signed(&mut reader).unwrap(), value);
    }

    #[test]
    fn prop_bitfield_inverse(bits in prop::collection::vec(any::<bool>(), 0..100)) {
        let field = Bitfield::from_bools(&bits);
        let bytes = field.to_bytes();
        prop_assert_eq!(bytes.len(), bits.len().div_ceil(8));

        let mut reader = ByteReader::new(&bytes);
        let decoded = Bitfield::unpack(&mut reader, bits.len()).unwrap();
        prop_assert_eq!(decoded.to_bools(), bits);
    }

    #[test]
    fn prop_text_round_trip(text in "\\PC{0,40}") {
        let registry = HandlerRegistry::new();
        let handler = registry.resolve(&TypeFlag::text()).unwrap();
        let value = Value::from(text.as_str());

        let bytes = handler.pack(&value).unwrap();
        let (decoded, consumed) = handler.unpack_from(&bytes, 0).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn prop_list_batch_round_trip(values in prop::collection::vec(0u64..=1000, 0..20)) {
        let registry = HandlerRegistry::new();
        let handler = registry
            .resolve(&TypeFlag::integer().max_value(1000))
            .unwrap();
        let values: Vec<Value> = values.into_iter().map(Value::UInt).collect();

        let bytes = handler.pack_multiple(&values, values.len()).unwrap();
        prop_assert_eq!(bytes.len(), values.len() * 2);
        let (decoded, consumed) = handler.unpack_multiple(&bytes, values.len(), 0).unwrap();
        prop_assert_eq!(decoded, values);
        prop_assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn prop_description_is_stable(value in any::<u64>(), text in "[a-z]{0,12}") {
        let first = Value::List(vec![Value::UInt(value), Value::from(text.as_str())]);
        let second = Value::List(vec![Value::UInt(value), Value::from(text.as_str())]);

        prop_assert_eq!(default_description(&first), default_description(&first));
        prop_assert_eq!(default_description(&first), default_description(&second));
    }
}
