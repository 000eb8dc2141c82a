use std::sync::Arc;

use replicant_shared::{
    ByteReader, ByteWriter, DataType, Handler, HandlerError, HandlerRegistry, IntegerWidth,
    ListHandler, SerdeErr, TypeFlag, UnsignedHandler, Value,
};

// ========== Resolution ==========

#[test]
fn test_unregistered_type_has_no_handler() {
    let registry = HandlerRegistry::new();
    let flag = TypeFlag::new(DataType::new("vector"));

    assert_eq!(
        registry.resolve(&flag).err(),
        Some(HandlerError::NoHandler {
            data_type: DataType::new("vector")
        })
    );
}

#[test]
fn test_declared_subtype_uses_ancestor_factory() {
    let registry = HandlerRegistry::new();
    let percent = DataType::new("percent");
    registry.declare_type(percent, &[DataType::INTEGER]);

    let handler = registry
        .resolve(&TypeFlag::new(percent).max_value(100))
        .unwrap();
    assert_eq!(handler.pack(&Value::UInt(100)).unwrap(), vec![100]);
}

#[test]
fn test_registry_locks_after_first_resolution() {
    let registry = HandlerRegistry::new();
    registry.resolve(&TypeFlag::boolean()).unwrap();

    let result = registry.register(DataType::new("vector"), |_, _| {
        Ok(Arc::new(UnsignedHandler::new(IntegerWidth::W8)) as Arc<dyn Handler>)
    });
    assert_eq!(
        result.err(),
        Some(HandlerError::RegistryLocked {
            data_type: DataType::new("vector")
        })
    );
}

#[test]
fn test_list_without_element_type_is_rejected() {
    let registry = HandlerRegistry::new();

    assert_eq!(
        registry.resolve(&TypeFlag::new(DataType::LIST)).err(),
        Some(HandlerError::MissingElementType {
            data_type: DataType::LIST
        })
    );
}

// ========== Packing ==========

#[test]
fn test_value_over_max_is_rejected() {
    let registry = HandlerRegistry::new();
    let handler = registry
        .resolve(&TypeFlag::integer().max_value(100))
        .unwrap();

    let mut writer = ByteWriter::new();
    assert!(matches!(
        handler.write(&Value::UInt(300), &mut writer),
        Err(HandlerError::Serde(SerdeErr::ValueTooLarge { .. }))
    ));
}

#[test]
fn test_wrong_value_shape_is_rejected() {
    let registry = HandlerRegistry::new();
    let handler = registry.resolve(&TypeFlag::boolean()).unwrap();

    let mut writer = ByteWriter::new();
    assert_eq!(
        handler.write(&Value::from("yes"), &mut writer).err(),
        Some(HandlerError::TypeMismatch {
            expected: DataType::BOOL,
            found: "text"
        })
    );
}

#[test]
fn test_truncated_input_underflows() {
    let registry = HandlerRegistry::new();
    let handler = registry.resolve(&TypeFlag::text()).unwrap();

    let mut reader = ByteReader::new(&[5, b'a', b'b']);
    assert!(matches!(
        handler.read(&mut reader),
        Err(HandlerError::Serde(SerdeErr::BufferUnderflow { .. }))
    ));
}

#[test]
fn test_text_over_max_length_is_rejected() {
    let registry = HandlerRegistry::new();
    let handler = registry
        .resolve(&TypeFlag::text().max_length(3))
        .unwrap();

    let mut writer = ByteWriter::new();
    assert!(matches!(
        handler.write(&Value::from("four"), &mut writer),
        Err(HandlerError::Serde(SerdeErr::LengthExceeded { .. }))
    ));
}

#[test]
fn test_list_round_trip_through_registry() {
    let registry = HandlerRegistry::new();
    let handler = registry
        .resolve(&TypeFlag::list(TypeFlag::integer()))
        .unwrap();
    let value = Value::List(vec![Value::UInt(1), Value::UInt(2), Value::UInt(3)]);

    let bytes = handler.pack(&value).unwrap();
    let (decoded, consumed) = handler.unpack_from(&bytes, 0).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(consumed, bytes.len());
}

#[test]
fn test_list_handler_reports_element_errors() {
    let list = ListHandler::new(Arc::new(UnsignedHandler::new(IntegerWidth::W8)), 10);

    let mut writer = ByteWriter::new();
    assert!(list
        .write(&Value::List(vec![Value::from("x")]), &mut writer)
        .is_err());
}
