//! Field model matrix: layouts, round trips and format equivalence.

use fbe::{
    final_size, standard_extra, Decimal, FbeError, FieldModel, FieldModelMut, FieldType,
    FinalFieldModel, FinalFieldModelMut, Primitive, ReadBuffer, Record, StructSchema, Uuid, Value,
    WriteBuffer,
};

fn standard(ty: &FieldType, value: &Value) -> Vec<u8> {
    let mut buffer = WriteBuffer::new();
    let at = buffer.allocate(ty.head_size()).unwrap();
    let written = FieldModelMut::new(&mut buffer, ty, at).set(value).unwrap();
    assert_eq!(written, buffer.size(), "{ty}: set must report every byte");
    assert_eq!(written, ty.head_size() + standard_extra(ty, value).unwrap());
    buffer.into_inner()
}

fn final_(ty: &FieldType, value: &Value) -> Vec<u8> {
    let mut buffer = WriteBuffer::new();
    let size = final_size(ty, value).unwrap();
    let at = buffer.allocate(size).unwrap();
    let written = FinalFieldModelMut::new(&mut buffer, ty, at)
        .set(value)
        .unwrap();
    assert_eq!(written, size, "{ty}: final size drift");
    buffer.into_inner()
}

fn standard_get(ty: &FieldType, bytes: &[u8]) -> Value {
    let model = FieldModel::new(ReadBuffer::new(bytes), ty, 0);
    assert!(model.verify(), "{ty}: verify failed");
    assert_eq!(model.size() + model.extra().unwrap(), bytes.len());
    model.get().unwrap()
}

fn final_get(ty: &FieldType, bytes: &[u8]) -> Value {
    let model = FinalFieldModel::new(ReadBuffer::new(bytes), ty, 0);
    assert!(model.verify(), "{ty}: verify failed");
    let (value, consumed) = model.get().unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(model.size().unwrap(), consumed);
    value
}

fn ints(values: &[i32]) -> Value {
    Value::Seq(values.iter().copied().map(Value::I32).collect())
}

fn primitive_samples() -> Vec<(FieldType, Value)> {
    vec![
        (FieldType::bool(), Value::Bool(true)),
        (FieldType::byte(), Value::Byte(0xfe)),
        (FieldType::char(), Value::Char(b'x')),
        (FieldType::wchar(), Value::WChar('€')),
        (FieldType::i8(), Value::I8(i8::MIN)),
        (FieldType::u8(), Value::U8(u8::MAX)),
        (FieldType::i16(), Value::I16(i16::MIN)),
        (FieldType::u16(), Value::U16(u16::MAX)),
        (FieldType::i32(), Value::I32(i32::MIN)),
        (FieldType::i32(), Value::I32(i32::MAX)),
        (FieldType::u32(), Value::U32(u32::MAX)),
        (FieldType::i64(), Value::I64(i64::MIN)),
        (FieldType::u64(), Value::U64(u64::MAX)),
        (FieldType::f32(), Value::F32(-1.5)),
        (FieldType::f64(), Value::F64(1.23456)),
        (
            FieldType::uuid(),
            Value::Uuid(Uuid::from_u128(0x123e4567_e89b_12d3_a456_426655440000)),
        ),
        (
            FieldType::decimal(),
            Value::Decimal("-79228162514264337593543950.335".parse::<Decimal>().unwrap()),
        ),
        (FieldType::timestamp(), Value::Timestamp(1_700_000_000_123_456_789)),
    ]
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

#[test]
fn primitives_round_trip_in_both_formats() {
    for (ty, value) in primitive_samples() {
        assert_eq!(standard_get(&ty, &standard(&ty, &value)), value, "{ty}");
        assert_eq!(final_get(&ty, &final_(&ty, &value)), value, "{ty}");
    }
}

#[test]
fn primitives_encode_identically_in_both_formats() {
    for (ty, value) in primitive_samples() {
        let bytes = standard(&ty, &value);
        assert_eq!(bytes.len(), ty.head_size());
        assert_eq!(bytes, final_(&ty, &value), "{ty}");
    }
}

#[test]
fn fixed_arrays_encode_identically_in_both_formats() {
    let ty = FieldType::array(FieldType::i16(), 3);
    let value = Value::Seq(vec![Value::I16(-1), Value::I16(0), Value::I16(1)]);
    assert_eq!(standard(&ty, &value), final_(&ty, &value));
    assert_eq!(standard(&ty, &value).len(), 6);
}

#[test]
fn primitive_widths() {
    let widths = [
        (Primitive::Bool, 1),
        (Primitive::WChar, 4),
        (Primitive::Double, 8),
        (Primitive::Uuid, 16),
        (Primitive::Decimal, 16),
        (Primitive::Timestamp, 8),
    ];
    for (primitive, width) in widths {
        assert_eq!(primitive.width(), width, "{}", primitive.name());
    }
}

// ---------------------------------------------------------------------------
// Strings and collections
// ---------------------------------------------------------------------------

#[test]
fn empty_string_and_bytes() {
    for (ty, value) in [
        (FieldType::string(), Value::from("")),
        (FieldType::bytes(), Value::Bytes(Vec::new())),
    ] {
        let bytes = standard(&ty, &value);
        assert_eq!(bytes, [4, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(standard_get(&ty, &bytes), value);
        assert_eq!(final_(&ty, &value), [0, 0, 0, 0]);
    }
}

#[test]
fn vector_of_int32_layouts() {
    let ty = FieldType::vector(FieldType::i32());
    let value = ints(&[10, 20, 30]);

    let std_bytes = standard(&ty, &value);
    assert_eq!(std_bytes.len(), 20);
    assert_eq!(
        std_bytes,
        [
            4, 0, 0, 0, // pointer
            3, 0, 0, 0, // count
            10, 0, 0, 0, 20, 0, 0, 0, 30, 0, 0, 0,
        ]
    );

    let final_bytes = final_(&ty, &value);
    assert_eq!(final_bytes.len(), 16);
    assert_eq!(&final_bytes[..], &std_bytes[4..]);

    assert_eq!(standard_get(&ty, &std_bytes), value);
    assert_eq!(final_get(&ty, &final_bytes), value);
}

#[test]
fn empty_collections() {
    let cases = [
        (FieldType::vector(FieldType::string()), Value::Seq(Vec::new())),
        (FieldType::list(FieldType::i64()), Value::Seq(Vec::new())),
        (FieldType::set(FieldType::u8()), Value::Seq(Vec::new())),
        (
            FieldType::map(FieldType::i32(), FieldType::string()),
            Value::Map(Vec::new()),
        ),
        (
            FieldType::hash(FieldType::string(), FieldType::i32()),
            Value::Map(Vec::new()),
        ),
    ];
    for (ty, value) in cases {
        let bytes = standard(&ty, &value);
        assert_eq!(bytes.len(), 8, "{ty}");
        assert_eq!(standard_get(&ty, &bytes), value);
        assert_eq!(final_(&ty, &value), [0, 0, 0, 0]);
    }
}

#[test]
fn set_deduplicates_and_orders() {
    let ty = FieldType::set(FieldType::i32());
    let value = ints(&[3, 1, 2, 1]);
    let expected = ints(&[1, 2, 3]);
    assert_eq!(standard_get(&ty, &standard(&ty, &value)), expected);
    assert_eq!(final_get(&ty, &final_(&ty, &value)), expected);
}

#[test]
fn set_of_strings_orders_lexicographically() {
    let ty = FieldType::set(FieldType::string());
    let value = Value::Seq(vec!["pear".into(), "apple".into(), "pear".into()]);
    assert_eq!(
        standard_get(&ty, &standard(&ty, &value)),
        Value::Seq(vec!["apple".into(), "pear".into()])
    );
}

#[test]
fn ordered_map_keeps_last_value_for_repeated_key() {
    let ty = FieldType::map(FieldType::string(), FieldType::i32());
    let value = Value::Map(vec![
        ("b".into(), Value::I32(1)),
        ("a".into(), Value::I32(2)),
        ("b".into(), Value::I32(3)),
    ]);
    let expected = Value::Map(vec![("a".into(), Value::I32(2)), ("b".into(), Value::I32(3))]);
    assert_eq!(standard_get(&ty, &standard(&ty, &value)), expected);
    assert_eq!(final_get(&ty, &final_(&ty, &value)), expected);
}

#[test]
fn hash_keeps_presented_order() {
    let ty = FieldType::hash(FieldType::string(), FieldType::f64());
    let value = Value::Map(vec![
        ("z".into(), Value::F64(1.0)),
        ("a".into(), Value::F64(2.0)),
    ]);
    assert_eq!(standard_get(&ty, &standard(&ty, &value)), value);
    assert_eq!(final_get(&ty, &final_(&ty, &value)), value);
}

#[test]
fn nested_collections_round_trip() {
    let ty = FieldType::map(
        FieldType::string(),
        FieldType::vector(FieldType::optional(FieldType::string())),
    );
    let value = Value::Map(vec![
        ("a".into(), Value::Seq(vec![Some("x").into(), None::<&str>.into()])),
        ("b".into(), Value::Seq(Vec::new())),
    ]);
    assert_eq!(standard_get(&ty, &standard(&ty, &value)), value);
    assert_eq!(final_get(&ty, &final_(&ty, &value)), value);
}

#[test]
fn array_of_strings_points_per_item() {
    let ty = FieldType::array(FieldType::string(), 2);
    let value = Value::Seq(vec!["ab".into(), "c".into()]);
    let bytes = standard(&ty, &value);
    assert_eq!(
        bytes,
        [8, 0, 0, 0, 14, 0, 0, 0, 2, 0, 0, 0, b'a', b'b', 1, 0, 0, 0, b'c']
    );
    assert_eq!(standard_get(&ty, &bytes), value);
    assert_eq!(
        final_(&ty, &value),
        [2, 0, 0, 0, b'a', b'b', 1, 0, 0, 0, b'c']
    );
}

#[test]
fn array_with_wrong_cardinality_is_rejected() {
    let ty = FieldType::array(FieldType::i32(), 3);
    let value = ints(&[1, 2]);
    let mut buffer = WriteBuffer::new();
    let at = buffer.allocate(ty.head_size()).unwrap();
    assert_eq!(
        FieldModelMut::new(&mut buffer, &ty, at).set(&value),
        Err(FbeError::SizeMismatch {
            expected: 3,
            actual: 2
        })
    );
    assert_eq!(
        final_size(&ty, &value),
        Err(FbeError::SizeMismatch {
            expected: 3,
            actual: 2
        })
    );
}

// ---------------------------------------------------------------------------
// Optionals
// ---------------------------------------------------------------------------

#[test]
fn optional_semantics() {
    let ty = FieldType::optional(FieldType::i64());
    let none = Value::Optional(None);
    let some = Value::from(Some(-5i64));

    assert_eq!(standard_get(&ty, &standard(&ty, &none)), none);
    assert_eq!(standard_get(&ty, &standard(&ty, &some)), some);
    assert_eq!(final_get(&ty, &final_(&ty, &none)), none);
    assert_eq!(final_get(&ty, &final_(&ty, &some)), some);
}

#[test]
fn absent_optional_consumes_one_final_byte() {
    let ty = FieldType::optional(FieldType::string());
    // an absent optional followed by unrelated bytes
    let bytes = [0u8, 0xde, 0xad];
    let (value, consumed) = FinalFieldModel::new(ReadBuffer::new(&bytes), &ty, 0)
        .get()
        .unwrap();
    assert_eq!(value, Value::Optional(None));
    assert_eq!(consumed, 1);
}

#[test]
fn absent_standard_optional_has_no_payload() {
    let ty = FieldType::optional(FieldType::vector(FieldType::i32()));
    let bytes = standard(&ty, &Value::Optional(None));
    assert_eq!(bytes, [0, 0, 0, 0, 0]);
}

#[test]
fn optional_of_optional() {
    let ty = FieldType::optional(FieldType::optional(FieldType::u8()));
    for value in [
        Value::Optional(None),
        Value::Optional(Some(Box::new(Value::Optional(None)))),
        Value::Optional(Some(Box::new(Value::from(Some(7u8))))),
    ] {
        assert_eq!(standard_get(&ty, &standard(&ty, &value)), value);
        assert_eq!(final_get(&ty, &final_(&ty, &value)), value);
    }
}

// ---------------------------------------------------------------------------
// Pointers and malformed input
// ---------------------------------------------------------------------------

#[test]
fn standard_pointers_resolve_to_valid_prefixes() {
    let ty = FieldType::array(FieldType::vector(FieldType::string()), 3);
    let value = Value::Seq(vec![
        Value::Seq(vec!["one".into(), "two".into()]),
        Value::Seq(Vec::new()),
        Value::Seq(vec!["three".into()]),
    ]);
    let bytes = standard(&ty, &value);
    let reader = ReadBuffer::new(&bytes);
    for i in 0..3 {
        let pointer = reader.read_u32(i * 4).unwrap() as usize;
        assert_ne!(pointer, 0);
        let count = reader.read_u32(pointer).unwrap() as usize;
        assert!(count * 4 <= reader.remaining(pointer + 4));
        for j in 0..count {
            let item = reader.read_u32(pointer + 4 + j * 4).unwrap() as usize;
            assert_ne!(item, 0);
            assert!(reader.read_length(item).is_ok());
        }
    }
}

#[test]
fn zero_filled_head_reads_as_empty() {
    let data = [0u8; 4];
    for ty in [
        FieldType::string(),
        FieldType::bytes(),
        FieldType::vector(FieldType::i32()),
        FieldType::map(FieldType::i32(), FieldType::i32()),
    ] {
        let model = FieldModel::new(ReadBuffer::new(&data), &ty, 0);
        assert_eq!(model.get().unwrap(), ty.default_value(), "{ty}");
    }
}

#[test]
fn out_of_range_pointer_fails() {
    let ty = FieldType::string();
    let data = [64u8, 0, 0, 0];
    let model = FieldModel::new(ReadBuffer::new(&data), &ty, 0);
    assert!(matches!(model.get(), Err(FbeError::Buffer(_))));
    assert!(!model.verify());
}

#[test]
fn oversized_length_prefix_fails() {
    let ty = FieldType::string();
    let data = [4u8, 0, 0, 0, 100, 0, 0, 0, b'a'];
    let model = FieldModel::new(ReadBuffer::new(&data), &ty, 0);
    let err = model.get().unwrap_err();
    assert_eq!(err.kind(), fbe::ErrorKind::Format);
}

fn zero_width_items() -> Vec<FieldType> {
    let empty = StructSchema::builder("Empty").build().unwrap();
    vec![
        FieldType::vector(FieldType::structure(empty.clone())),
        FieldType::set(FieldType::array(FieldType::i32(), 0)),
        FieldType::hash(FieldType::structure(empty), FieldType::array(FieldType::u8(), 0)),
    ]
}

#[test]
fn huge_count_of_zero_width_items_fails() {
    for ty in zero_width_items() {
        let data = [0xffu8, 0xff, 0xff, 0xff];
        let model = FinalFieldModel::new(ReadBuffer::new(&data), &ty, 0);
        assert!(
            matches!(model.get(), Err(FbeError::Buffer(fbe::BufferError::InvalidLength { .. }))),
            "{ty}"
        );
        assert!(!model.verify());
    }

    let ty = FieldType::vector(FieldType::array(FieldType::i32(), 0));
    let data = [4u8, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];
    let model = FieldModel::new(ReadBuffer::new(&data), &ty, 0);
    assert!(matches!(
        model.get(),
        Err(FbeError::Buffer(fbe::BufferError::InvalidLength { .. }))
    ));
    assert!(!model.verify());
}

#[test]
fn zero_width_items_cannot_be_encoded() {
    for ty in zero_width_items() {
        let value = ty.default_value();
        let non_empty = match &value {
            Value::Seq(_) => {
                let FieldType::Collection(_, item) = &ty else { unreachable!() };
                Value::Seq(vec![item.default_value()])
            }
            Value::Map(_) => {
                let FieldType::Map(_, key, val) = &ty else { unreachable!() };
                Value::Map(vec![(key.default_value(), val.default_value())])
            }
            other => panic!("unexpected default {other:?}"),
        };
        assert!(
            matches!(final_size(&ty, &non_empty), Err(FbeError::SizeMismatch { .. })),
            "{ty}"
        );
        assert_eq!(final_(&ty, &value), vec![0, 0, 0, 0]);
    }

    let ty = FieldType::vector(FieldType::array(FieldType::i32(), 0));
    let value = Value::Seq(vec![Value::Seq(Vec::new())]);
    let mut buffer = WriteBuffer::new();
    let at = buffer.allocate(ty.head_size()).unwrap();
    assert!(matches!(
        FieldModelMut::new(&mut buffer, &ty, at).set(&value),
        Err(FbeError::SizeMismatch { .. })
    ));
}

#[test]
fn invalid_utf8_fails_verification() {
    let ty = FieldType::string();
    let data = [2u8, 0, 0, 0, 0xc3, 0x28];
    let model = FinalFieldModel::new(ReadBuffer::new(&data), &ty, 0);
    assert!(!model.verify());
    assert!(model.get().is_err());
}

#[test]
fn invalid_decimal_scale_fails() {
    let mut bytes = [0u8; 16];
    bytes[14] = 40;
    let ty = FieldType::decimal();
    let model = FieldModel::new(ReadBuffer::new(&bytes), &ty, 0);
    assert_eq!(
        model.get(),
        Err(FbeError::Buffer(fbe::BufferError::InvalidDecimalScale(40)))
    );
}

#[test]
fn type_mismatch_is_reported() {
    let ty = FieldType::vector(FieldType::string());
    let value = ints(&[1]);
    assert!(matches!(
        standard_extra(&ty, &value),
        Err(FbeError::TypeMismatch { .. })
    ));
    assert!(matches!(
        final_size(&FieldType::string(), &Value::I32(1)),
        Err(FbeError::TypeMismatch { .. })
    ));
}

// ---------------------------------------------------------------------------
// Nested structs as fields
// ---------------------------------------------------------------------------

#[test]
fn struct_field_round_trips() {
    let point = StructSchema::builder("Point")
        .field("x", FieldType::i32())
        .field("label", FieldType::string())
        .build()
        .unwrap();
    let ty = FieldType::vector(FieldType::structure(point));
    let value = Value::Seq(vec![
        Record::new().with("x", 1i32).with("label", "a").into(),
        Record::new().with("x", 2i32).into(),
    ]);
    let expected = Value::Seq(vec![
        Record::new().with("x", 1i32).with("label", "a").into(),
        Record::new().with("x", 2i32).with("label", "").into(),
    ]);
    assert_eq!(standard_get(&ty, &standard(&ty, &value)), expected);
    assert_eq!(final_get(&ty, &final_(&ty, &value)), expected);
}

#[test]
fn final_is_never_larger_than_standard() {
    let ty = FieldType::list(FieldType::map(
        FieldType::u8(),
        FieldType::optional(FieldType::bytes()),
    ));
    let value = Value::Seq(vec![
        Value::Map(vec![(Value::U8(1), Some(vec![1u8, 2, 3]).into())]),
        Value::Map(vec![(Value::U8(2), Value::Optional(None))]),
    ]);
    assert!(final_(&ty, &value).len() <= standard(&ty, &value).len());
}
