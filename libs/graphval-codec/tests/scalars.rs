mod common;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use engine_memory::MemValue;
use graphval_api::wrappers::{Int16Wrapper, UInt8Wrapper, UInt32Wrapper};
use graphval_api::{
    Blob, BlobLength, CodecConfig, ConversionError, ErrorKind, HostValue, InternalId, Interval,
    Primitive, TypeId,
};
use graphval_codec::{Codec, Decode, Encode};

use common::{assert_released, cell, setup, setup_with};

fn round_trip<T: Encode + Decode>(codec: &Codec, engine: &engine_memory::MemoryEngine, value: &T) -> T {
    let encoded = codec.encode(engine, value).expect("encode");
    codec.decode_typed(&encoded).expect("decode")
}

#[test]
fn fixed_width_scalars_round_trip() {
    let (engine, codec) = setup();

    assert!(round_trip(&codec, &engine, &true));
    assert_eq!(round_trip(&codec, &engine, &i8::MIN), i8::MIN);
    assert_eq!(round_trip(&codec, &engine, &i16::MAX), i16::MAX);
    assert_eq!(round_trip(&codec, &engine, &-7_i32), -7);
    assert_eq!(round_trip(&codec, &engine, &i64::MIN), i64::MIN);
    assert_eq!(round_trip(&codec, &engine, &u8::MAX), u8::MAX);
    assert_eq!(round_trip(&codec, &engine, &u16::MAX), u16::MAX);
    assert_eq!(round_trip(&codec, &engine, &u32::MAX), u32::MAX);
    assert_eq!(round_trip(&codec, &engine, &u64::MAX), u64::MAX);
    assert_eq!(round_trip(&codec, &engine, &1.5_f32), 1.5);
    assert_eq!(round_trip(&codec, &engine, &-2.25_f64), -2.25);
    assert_eq!(round_trip(&codec, &engine, &"héllo".to_string()), "héllo");

    assert_released(&engine);
}

#[test]
fn rich_scalars_round_trip() {
    let (engine, codec) = setup();

    let id = Uuid::parse_str("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11").unwrap();
    assert_eq!(round_trip(&codec, &engine, &id), id);

    let t = DateTime::parse_from_rfc3339("2024-02-29T13:45:01.123456Z")
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(round_trip(&codec, &engine, &t), t);

    let d = TimeDelta::days(3) + TimeDelta::microseconds(17);
    assert_eq!(round_trip(&codec, &engine, &d), d);

    let iid = InternalId::new(2, 40);
    assert_eq!(round_trip(&codec, &engine, &iid), iid);

    let blob = Blob(vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(round_trip(&codec, &engine, &blob), blob);

    let dec = BigDecimal::from_str("-1234.5678").unwrap();
    assert_eq!(round_trip(&codec, &engine, &dec), dec);

    assert_released(&engine);
}

#[test]
fn decimal_text_survives_int128() {
    let (engine, codec) = setup();
    let d = BigDecimal::from_str("18446744073709551610").unwrap();

    let encoded = codec.encode(&engine, &d).unwrap();
    assert_eq!(encoded.type_id().unwrap(), TypeId::Int128);
    let back: BigDecimal = codec.decode_typed(&encoded).unwrap();
    assert_eq!(back.to_string(), "18446744073709551610");
    drop(encoded);

    assert_released(&engine);
}

#[test]
fn tag_outside_accepted_set_is_a_mismatch() {
    let (engine, codec) = setup();
    let s = codec.encode(&engine, "not a number").unwrap();

    let err = codec.decode_typed::<i64>(&s).unwrap_err();
    assert_eq!(
        err,
        ConversionError::TypeMismatch {
            expected: vec![TypeId::Int64, TypeId::Serial],
            actual: TypeId::String,
        }
    );
    assert_eq!(codec.decode_typed::<f64>(&s).unwrap_err().kind(), ErrorKind::TypeMismatch);
    assert_eq!(
        codec.decode_typed::<DateTime<Utc>>(&s).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
    drop(s);

    let f = codec.encode(&engine, &1.0_f32).unwrap();
    assert_eq!(codec.decode_typed::<f64>(&f).unwrap_err().kind(), ErrorKind::TypeMismatch);
    drop(f);

    assert_released(&engine);
}

#[test]
fn serial_is_accepted_as_int64() {
    let (engine, codec) = setup();
    let v = cell(&engine, Primitive::Serial(41).into());
    assert_eq!(codec.decode_typed::<i64>(&v).unwrap(), 41);
    assert_eq!(codec.decode_dynamic(&v).unwrap(), HostValue::Int64(41));
    drop(v);
    assert_released(&engine);
}

#[test]
fn null_handling_per_decode_path() {
    let (engine, codec) = setup();
    let none: Option<i64> = None;
    let v = codec.encode(&engine, &none).unwrap();

    assert!(v.is_null().unwrap());
    assert_eq!(codec.decode_typed::<i64>(&v).unwrap_err(), ConversionError::NullValue);
    assert_eq!(codec.decode_typed::<Option<i64>>(&v).unwrap(), None);
    assert_eq!(codec.decode_typed::<Option<String>>(&v).unwrap(), None);
    assert_eq!(codec.decode_dynamic(&v).unwrap(), HostValue::Null);
    drop(v);

    let some = codec.encode(&engine, &Some(5_i64)).unwrap();
    assert_eq!(codec.decode_typed::<Option<i64>>(&some).unwrap(), Some(5));
    drop(some);

    assert_released(&engine);
}

#[test]
fn every_temporal_tag_decodes_to_one_instant() {
    let (engine, codec) = setup();
    let expected = DateTime::parse_from_rfc3339("2001-09-09T01:46:40Z").unwrap().with_timezone(&Utc);
    let secs = 1_000_000_000_i64;

    for p in [
        Primitive::Date(11_574),
        Primitive::Timestamp(secs * 1_000_000),
        Primitive::TimestampTz(secs * 1_000_000),
        Primitive::TimestampMs(secs * 1_000),
        Primitive::TimestampNs(secs * 1_000_000_000),
        Primitive::TimestampSec(secs),
    ] {
        let is_date = matches!(p, Primitive::Date(_));
        let v = cell(&engine, p.into());
        let t: DateTime<Utc> = codec.decode_typed(&v).unwrap();
        if is_date {
            assert_eq!(t.date_naive(), expected.date_naive());
            assert_eq!(t.timestamp() % 86_400, 0);
        } else {
            assert_eq!(t, expected);
        }
    }

    assert_released(&engine);
}

#[test]
fn nanosecond_timestamps_keep_full_precision_on_decode() {
    let (engine, codec) = setup();
    let v = cell(&engine, Primitive::TimestampNs(1_500_000_001).into());
    let t: DateTime<Utc> = codec.decode_typed(&v).unwrap();
    assert_eq!(t.timestamp(), 1);
    assert_eq!(t.timestamp_subsec_nanos(), 500_000_001);
    drop(v);

    // Re-encoding goes through microseconds; the trailing nanosecond is dropped.
    let again: DateTime<Utc> = {
        let encoded = codec.encode(&engine, &t).unwrap();
        codec.decode_typed(&encoded).unwrap()
    };
    assert_eq!(again.timestamp_subsec_nanos(), 500_000_000);

    assert_released(&engine);
}

#[test]
fn interval_collapses_with_thirty_day_months() {
    let (engine, codec) = setup();
    let v = cell(&engine, Primitive::Interval(Interval::new(2, 3, 1_000_000)).into());

    let raw: Interval = codec.decode_typed(&v).unwrap();
    assert_eq!(raw, Interval::new(2, 3, 1_000_000));
    let d: TimeDelta = codec.decode_typed(&v).unwrap();
    assert_eq!(d, TimeDelta::days(63) + TimeDelta::seconds(1));
    assert_eq!(codec.decode_dynamic(&v).unwrap(), HostValue::Duration(d));
    drop(v);

    assert_released(&engine);
}

#[test]
fn blob_length_follows_config() {
    let bytes = vec![b'a', b'b', 0, b'c'];

    let (engine, codec) = setup();
    let v = cell(&engine, Primitive::Blob(bytes.clone()).into());
    assert_eq!(codec.decode_typed::<Blob>(&v).unwrap(), Blob(b"ab".to_vec()));
    assert_eq!(codec.decode_dynamic(&v).unwrap(), HostValue::Blob(b"ab".to_vec()));
    drop(v);
    assert_released(&engine);

    let config = CodecConfig { blob_length: BlobLength::Exact, ..CodecConfig::default() };
    let (engine, codec) = setup_with(config);
    let v = cell(&engine, Primitive::Blob(bytes.clone()).into());
    assert_eq!(codec.decode_typed::<Blob>(&v).unwrap(), Blob(bytes));
    drop(v);
    assert_released(&engine);
}

#[test]
fn malformed_engine_uuid_is_conversion_failure() {
    let (engine, codec) = setup();
    // The engine validates on create; a corrupt stored value can still surface.
    let v = cell(&engine, MemValue::Primitive(Primitive::Uuid("zzzz".into())));
    let err = codec.decode_typed::<Uuid>(&v).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConversionFailed);
    drop(v);
    assert_released(&engine);
}

#[test]
fn typed_null_short_circuits_before_tag_check() {
    let (engine, codec) = setup();
    let v = cell(&engine, MemValue::Null(TypeId::Pointer.into()));
    // Null short-circuits before the tag is consulted.
    assert_eq!(codec.decode_dynamic(&v).unwrap(), HostValue::Null);
    drop(v);
    assert_released(&engine);
}

// ---------------------------------------------------------------------------
// Numeric width
// ---------------------------------------------------------------------------

#[test]
fn width_wrapper_pins_the_engine_tag() {
    let (engine, codec) = setup();

    let v = codec.encode(&engine, &UInt32Wrapper::new(4_000_000_000)).unwrap();
    assert_eq!(v.type_id().unwrap(), TypeId::UInt32);
    assert_eq!(codec.decode_typed::<u32>(&v).unwrap(), 4_000_000_000);
    assert_eq!(codec.decode_typed::<i64>(&v).unwrap_err().kind(), ErrorKind::TypeMismatch);
    drop(v);

    let v = codec.encode(&engine, &UInt8Wrapper::new(200)).unwrap();
    assert_eq!(codec.decode_dynamic(&v).unwrap(), HostValue::UInt8(200));
    drop(v);

    let v = codec.encode(&engine, &Int16Wrapper::new(-2)).unwrap();
    assert_eq!(v.type_id().unwrap(), TypeId::Int16);
    drop(v);

    assert_released(&engine);
}

#[test]
fn generic_numbers_follow_the_fixed_rule() {
    let (engine, codec) = setup();

    let cases = [
        (serde_json::json!(4_000_000_000_u32), TypeId::Int64),
        (serde_json::json!(-3), TypeId::Int64),
        (serde_json::json!(u64::MAX), TypeId::UInt64),
        (serde_json::json!(0.5), TypeId::Double),
    ];
    for (number, tag) in cases {
        let v = codec.encode(&engine, &number).unwrap();
        assert_eq!(v.type_id().unwrap(), tag, "{number}");
    }

    assert_released(&engine);
}

#[test]
fn strict_width_refuses_generic_numbers() {
    let config = CodecConfig { strict_numeric_width: true, ..CodecConfig::default() };
    let (engine, codec) = setup_with(config);

    let err = codec.encode(&engine, &serde_json::json!(7)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);

    // Wrappers and native integers are unaffected.
    let v = codec.encode(&engine, &UInt32Wrapper::new(7)).unwrap();
    assert_eq!(codec.decode_typed::<u32>(&v).unwrap(), 7);
    drop(v);

    assert_released(&engine);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    // Years 1..=9999, microsecond resolution.
    (-62_135_596_800_000_000_i64..253_402_300_799_000_000).prop_map(|us| {
        DateTime::from_timestamp(us.div_euclid(1_000_000), (us.rem_euclid(1_000_000) * 1_000) as u32)
            .expect("in range")
    })
}

fn arb_decimal() -> impl Strategy<Value = BigDecimal> {
    (any::<i64>(), 0_u32..12).prop_map(|(mantissa, scale)| {
        BigDecimal::from_str(&format!("{mantissa}e-{scale}")).expect("valid decimal")
    })
}

proptest! {
    #[test]
    fn prop_int64_round_trip(v in any::<i64>()) {
        let (engine, codec) = setup();
        prop_assert_eq!(round_trip(&codec, &engine, &v), v);
        prop_assert_eq!(engine.live_handles(), 0);
    }

    #[test]
    fn prop_uint32_round_trip(v in any::<u32>()) {
        let (engine, codec) = setup();
        prop_assert_eq!(round_trip(&codec, &engine, &v), v);
        prop_assert_eq!(engine.live_handles(), 0);
    }

    #[test]
    fn prop_double_round_trip(v in any::<f64>().prop_filter("not NaN", |f| !f.is_nan())) {
        let (engine, codec) = setup();
        prop_assert_eq!(round_trip(&codec, &engine, &v), v);
    }

    #[test]
    fn prop_string_round_trip(s in ".*") {
        let (engine, codec) = setup();
        prop_assert_eq!(round_trip(&codec, &engine, &s), s);
    }

    #[test]
    fn prop_timestamp_round_trip(t in arb_timestamp()) {
        let (engine, codec) = setup();
        prop_assert_eq!(round_trip(&codec, &engine, &t), t);
    }

    #[test]
    fn prop_decimal_round_trip(d in arb_decimal()) {
        let (engine, codec) = setup();
        prop_assert_eq!(round_trip(&codec, &engine, &d), d);
        prop_assert_eq!(engine.live_handles(), 0);
    }

    #[test]
    fn prop_nul_free_blob_round_trip(bytes in prop::collection::vec(1_u8..=255, 0..64)) {
        let (engine, codec) = setup();
        let blob = Blob(bytes);
        prop_assert_eq!(round_trip(&codec, &engine, &blob), blob);
    }

    #[test]
    fn prop_duration_round_trip(us in -10_i64.pow(15)..10_i64.pow(15)) {
        let (engine, codec) = setup();
        let d = TimeDelta::microseconds(us);
        prop_assert_eq!(round_trip(&codec, &engine, &d), d);
    }
}
