mod common;

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::json;

use engine_memory::MemValue;
use graphval_api::{
    CodecConfig, CollectionKind, ConversionError, Engine, ErrorKind, HostValue, LogicalType,
    MapEntries, StructField, StructFields, TypeId,
};
use graphval_codec::Codec;

use common::{assert_released, cell, setup, setup_with};

// ---------------------------------------------------------------------------
// Lists and arrays
// ---------------------------------------------------------------------------

#[test]
fn list_round_trip_preserves_order() {
    let (engine, codec) = setup();

    let v = codec.encode(&engine, &vec![3_i64, 1, 2]).unwrap();
    assert_eq!(v.type_id().unwrap(), TypeId::List);
    assert_eq!(codec.decode_typed::<Vec<i64>>(&v).unwrap(), vec![3, 1, 2]);
    drop(v);

    let nested = vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string()]];
    let v = codec.encode(&engine, &nested).unwrap();
    assert_eq!(codec.decode_typed::<Vec<Vec<String>>>(&v).unwrap(), nested);
    drop(v);

    assert_released(&engine);
}

#[test]
fn nulls_inside_a_list_take_the_element_type() {
    let (engine, codec) = setup();
    let items = vec![Some(1_i64), None, Some(3)];

    let v = codec.encode(&engine, &items).unwrap();
    assert_eq!(codec.decode_typed::<Vec<Option<i64>>>(&v).unwrap(), items);
    assert_eq!(
        codec.decode_dynamic(&v).unwrap(),
        HostValue::List(vec![HostValue::Int64(1), HostValue::Null, HostValue::Int64(3)])
    );

    let err = codec.decode_typed::<Vec<i64>>(&v).unwrap_err();
    assert_eq!(err, ConversionError::NullValue);
    drop(v);

    assert_released(&engine);
}

#[test]
fn array_uses_static_size() {
    let (engine, codec) = setup();
    let arr = MemValue::array(vec![MemValue::int64(4), MemValue::int64(5), MemValue::int64(6)]).unwrap();
    let v = cell(&engine, arr);

    let ty = v.logical_type().unwrap();
    assert_eq!(ty.id(), TypeId::Array);
    assert_eq!(ty.array_size(), Some(3));
    assert_eq!(codec.decode_typed::<Vec<i64>>(&v).unwrap(), vec![4, 5, 6]);
    assert_eq!(
        codec.decode_dynamic(&v).unwrap(),
        HostValue::List(vec![HostValue::Int64(4), HostValue::Int64(5), HostValue::Int64(6)])
    );
    drop(v);

    assert_released(&engine);
}

#[test]
fn element_type_mismatch_names_the_element() {
    let (engine, codec) = setup();
    let v = codec.encode(&engine, &vec![1_i64, 2]).unwrap();

    let err = codec.decode_typed::<Vec<String>>(&v).unwrap_err();
    assert_eq!(err, ConversionError::type_mismatch(&[TypeId::String], TypeId::Int64));
    drop(v);

    assert_released(&engine);
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

fn field_names(engine: &dyn Engine, value: &graphval_api::OwnedValue<'_>) -> Vec<String> {
    let count = engine.struct_field_count(value.raw()).unwrap();
    (0..count).map(|i| engine.struct_field_name(value.raw(), i).unwrap()).collect()
}

#[test]
fn struct_keys_are_sorted_before_construction() {
    let (engine, codec) = setup();

    let ba = StructFields::new(vec![("b".to_string(), 1_i64), ("a".to_string(), 2)]);
    let ab = StructFields::new(vec![("a".to_string(), 2_i64), ("b".to_string(), 1)]);
    let hashed: HashMap<String, i64> = [("b".to_string(), 1), ("a".to_string(), 2)].into();

    let v1 = codec.encode(&engine, &ba).unwrap();
    let v2 = codec.encode(&engine, &ab).unwrap();
    let v3 = codec.encode(&engine, &hashed).unwrap();
    let v4 = codec.encode(&engine, &json!({"b": 1, "a": 2})).unwrap();

    for v in [&v1, &v2, &v3, &v4] {
        assert_eq!(field_names(&engine, v), vec!["a", "b"]);
    }
    assert_eq!(v1.logical_type().unwrap(), v2.logical_type().unwrap());
    assert_eq!(v1.logical_type().unwrap(), v3.logical_type().unwrap());

    let decoded: StructFields<i64> = codec.decode_typed(&v1).unwrap();
    assert_eq!(decoded, ab);
    assert_eq!(decoded.get("b"), Some(&1));
    drop((v1, v2, v3, v4));

    assert_released(&engine);
}

#[test]
fn list_of_structs_with_different_insertion_order() {
    let (engine, codec) = setup();
    let rows = vec![
        StructFields::new(vec![("b".to_string(), 1_i64), ("a".to_string(), 2)]),
        StructFields::new(vec![("a".to_string(), 3_i64), ("b".to_string(), 4)]),
    ];

    let v = codec.encode(&engine, &rows).unwrap();
    let back: Vec<StructFields<i64>> = codec.decode_typed(&v).unwrap();
    assert_eq!(back[0].names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(back[1].get("b"), Some(&4));
    drop(v);

    assert_released(&engine);
}

#[test]
fn mixed_struct_fields_decode_dynamically() {
    let (engine, codec) = setup();
    let value = HostValue::Struct(vec![
        ("id".into(), HostValue::Int64(7)),
        (
            "meta".into(),
            HostValue::Map(vec![(HostValue::from("score"), HostValue::Double(0.5))]),
        ),
        ("tags".into(), HostValue::List(vec!["x".into(), "y".into()])),
    ]);

    let v = codec.encode(&engine, &value).unwrap();
    assert_eq!(codec.decode_dynamic(&v).unwrap(), value);
    drop(v);

    assert_released(&engine);
}

// ---------------------------------------------------------------------------
// Maps
// ---------------------------------------------------------------------------

#[test]
fn map_keeps_pair_order_and_composite_keys() {
    let (engine, codec) = setup();

    let entries = MapEntries::new(vec![("z".to_string(), 1_i64), ("a".to_string(), 2)]);
    let v = codec.encode(&engine, &entries).unwrap();
    assert_eq!(v.type_id().unwrap(), TypeId::Map);
    assert_eq!(codec.decode_typed::<MapEntries<String, i64>>(&v).unwrap(), entries);
    drop(v);

    let composite = MapEntries::new(vec![(vec![1_i64, 2], "pair".to_string()), (vec![3], "one".to_string())]);
    let v = codec.encode(&engine, &composite).unwrap();
    assert_eq!(codec.decode_typed::<MapEntries<Vec<i64>, String>>(&v).unwrap(), composite);
    drop(v);

    assert_released(&engine);
}

#[test]
fn heterogeneous_map_values_are_rejected() {
    let (engine, codec) = setup();
    let entries = MapEntries::new(vec![
        (HostValue::from("a"), HostValue::Int64(1)),
        (HostValue::from("b"), HostValue::from("two")),
    ]);

    let err = codec.encode(&engine, &entries).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeterogeneousType);
    assert!(err.to_string().contains("the same type"));

    assert_released(&engine);
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[test]
fn empty_collections_are_rejected() {
    let (engine, codec) = setup();

    let cases: Vec<(Result<_, _>, CollectionKind)> = vec![
        (codec.encode(&engine, &Vec::<i64>::new()).map(drop), CollectionKind::List),
        (codec.encode(&engine, &HostValue::List(vec![])).map(drop), CollectionKind::List),
        (codec.encode(&engine, &json!([])).map(drop), CollectionKind::List),
        (codec.encode(&engine, &BTreeMap::<String, i64>::new()).map(drop), CollectionKind::Struct),
        (codec.encode(&engine, &json!({})).map(drop), CollectionKind::Struct),
        (
            codec.encode(&engine, &MapEntries::<String, i64>::new(vec![])).map(drop),
            CollectionKind::Map,
        ),
    ];
    for (result, kind) in cases {
        assert_eq!(result.unwrap_err(), ConversionError::EmptyCollection(kind));
    }

    assert_released(&engine);
}

#[test]
fn heterogeneous_list_is_rejected() {
    let (engine, codec) = setup();

    let err = codec.encode(&engine, &json!(["one", "two", 4])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeterogeneousType);
    assert!(err.to_string().contains("the same type"), "{err}");

    let mixed = HostValue::List(vec![HostValue::from("one"), HostValue::Int32(4)]);
    assert_eq!(codec.encode(&engine, &mixed).unwrap_err().kind(), ErrorKind::HeterogeneousType);

    assert_released(&engine);
}

#[test]
fn structs_with_different_field_types_do_not_share_a_list() {
    let (engine, codec) = setup();
    let value = json!([{"a": 1}, {"a": "one"}]);

    let err = codec.encode(&engine, &value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeterogeneousType);

    assert_released(&engine);
}

#[test]
fn failed_encode_releases_earlier_siblings() {
    let (engine, codec) = setup();
    let too_wide = BigDecimal::from_str("0.000000000000000000000000000000000000000001").unwrap();
    let value = HostValue::List(vec![
        HostValue::Decimal(BigDecimal::from_str("1.5").unwrap()),
        HostValue::Decimal(BigDecimal::from_str("2.5").unwrap()),
        HostValue::Decimal(too_wide),
    ]);

    let err = codec.encode(&engine, &value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConversionFailed);
    assert!(err.to_string().starts_with("element 2"), "{err}");

    assert_released(&engine);
}

#[test]
fn graph_values_cannot_be_encoded() {
    let (engine, codec) = setup();
    let node = HostValue::Node(graphval_api::Node {
        id: graphval_api::InternalId::new(0, 0),
        label: "Person".into(),
        properties: vec![],
    });

    assert_eq!(codec.encode(&engine, &node).unwrap_err().kind(), ErrorKind::UnsupportedType);
    assert_released(&engine);
}

#[test]
fn nesting_depth_is_bounded_both_ways() {
    let deep = vec![vec![vec![vec![1_i64]]]];

    let shallow = CodecConfig { max_depth: 3, ..CodecConfig::default() };
    let (engine, codec) = setup_with(shallow.clone());
    let err = codec.encode(&engine, &deep).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConversionFailed);
    assert_released(&engine);

    let v = Codec::default().encode(&engine, &deep).unwrap();
    let err = Codec::new(shallow).decode_dynamic(&v).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConversionFailed);
    assert_eq!(codec.decode_typed::<Vec<Vec<Vec<Vec<i64>>>>>(&v).unwrap_err().kind(), ErrorKind::ConversionFailed);
    drop(v);

    assert_released(&engine);
}

// ---------------------------------------------------------------------------
// Unions
// ---------------------------------------------------------------------------

#[test]
fn union_decodes_the_active_member_only() {
    let (engine, codec) = setup();
    let members = vec![
        StructField::new("num", TypeId::Int64.into()),
        StructField::new("text", TypeId::String.into()),
        StructField::new("flag", TypeId::Bool.into()),
    ];

    let num = cell(&engine, MemValue::union_of(members.clone(), "num", MemValue::int64(7)).unwrap());
    assert_eq!(num.type_id().unwrap(), TypeId::Union);
    assert_eq!(codec.decode_dynamic(&num).unwrap(), HostValue::Int64(7));
    drop(num);

    let text = cell(&engine, MemValue::union_of(members, "text", MemValue::string("seven")).unwrap());
    assert_eq!(codec.decode_dynamic(&text).unwrap(), HostValue::from("seven"));
    drop(text);

    assert_released(&engine);
}

#[test]
fn union_inside_a_struct() {
    let (engine, codec) = setup();
    let members = vec![
        StructField::new("n", TypeId::Int64.into()),
        StructField::new("s", TypeId::String.into()),
    ];
    let value = MemValue::struct_of(vec![
        ("u".into(), MemValue::union_of(members, "s", MemValue::string("x")).unwrap()),
        ("k".into(), MemValue::int64(1)),
    ])
    .unwrap();

    let v = cell(&engine, value);
    assert_eq!(
        codec.decode_dynamic(&v).unwrap(),
        HostValue::Struct(vec![("u".into(), HostValue::from("x")), ("k".into(), HostValue::Int64(1))])
    );
    drop(v);

    assert_released(&engine);
}

// ---------------------------------------------------------------------------
// Decimals in collections
// ---------------------------------------------------------------------------

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

#[test]
fn whole_and_fractional_decimals_share_a_list() {
    let (engine, codec) = setup();
    let items = vec![dec("1.5"), dec("2")];

    let v = codec.encode(&engine, &items).unwrap();
    assert_eq!(codec.decode_typed::<Vec<BigDecimal>>(&v).unwrap(), items);
    drop(v);

    let dynamic = HostValue::List(vec![HostValue::Decimal(dec("-7")), HostValue::Decimal(dec("0.25"))]);
    let v = codec.encode(&engine, &dynamic).unwrap();
    assert_eq!(codec.decode_dynamic(&v).unwrap(), dynamic);
    drop(v);

    assert_released(&engine);
}

#[test]
fn whole_decimals_alone_stay_int128() {
    let (engine, codec) = setup();

    let v = codec.encode(&engine, &vec![dec("1"), dec("18446744073709551610")]).unwrap();
    let ty = v.logical_type().unwrap();
    assert_eq!(ty.child().map(LogicalType::id), Some(TypeId::Int128));
    drop(v);

    assert_released(&engine);
}

#[test]
fn map_values_mixing_decimal_kinds() {
    let (engine, codec) = setup();
    let entries = MapEntries(vec![("a".to_string(), dec("3")), ("b".to_string(), dec("0.125"))]);

    let v = codec.encode(&engine, &entries).unwrap();
    assert_eq!(codec.decode_typed::<MapEntries<String, BigDecimal>>(&v).unwrap(), entries);
    drop(v);

    assert_released(&engine);
}

// ---------------------------------------------------------------------------
// Unresolved tags
// ---------------------------------------------------------------------------

#[test]
fn non_null_any_and_pointer_values_are_unsupported() {
    let (engine, codec) = setup();

    for tag in [TypeId::Any, TypeId::Pointer] {
        let v = cell(
            &engine,
            MemValue::List { ty: LogicalType::scalar(tag), items: vec![MemValue::int64(1)] },
        );
        assert!(!v.is_null().unwrap());

        let err = codec.decode_dynamic(&v).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert!(err.to_string().contains(tag.name()), "{err}");

        let err = codec.decode_typed::<HostValue>(&v).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        drop(v);
    }

    assert_released(&engine);
}
