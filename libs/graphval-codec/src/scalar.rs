//! Scalar codec: per-tag extraction of engine payloads into host values and
//! the reverse mapping for host scalars. No recursion happens here.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use graphval_api::types::display_tags;
use graphval_api::{
    BlobLength, ConversionError, HostValue, Interval, OwnedValue, Primitive, TypeId,
};

use crate::Result;
use crate::context::Context;

const SECONDS_PER_DAY: i64 = 86_400;
const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Widest decimal the engine stores.
pub const MAX_DECIMAL_PRECISION: i64 = 38;

/// Read the scalar payload of a value.
pub fn read(value: &OwnedValue<'_>) -> Result<Primitive> {
    Ok(value.engine().read_primitive(value.raw())?)
}

/// The engine handed back a payload that disagrees with the tag it reported.
pub(crate) fn payload_mismatch(expected: &[TypeId], found: &Primitive) -> ConversionError {
    ConversionError::failed(format!(
        "engine returned a {} payload where {} was expected",
        found.type_id(),
        display_tags(expected)
    ))
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

fn from_units(value: i64, per_second: i64) -> Result<DateTime<Utc>> {
    let secs = value.div_euclid(per_second);
    let sub = value.rem_euclid(per_second);
    let nanos = u32::try_from(sub * (NANOS_PER_SECOND / per_second))
        .map_err(|_| ConversionError::failed(format!("timestamp {value} out of range")))?;
    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| ConversionError::failed(format!("timestamp {value} out of range")))
}

/// `DATE` and every timestamp tag collapse to one UTC instant.
pub fn timestamp(p: &Primitive) -> Result<DateTime<Utc>> {
    match p {
        Primitive::Date(days) => from_units(i64::from(*days) * SECONDS_PER_DAY, 1),
        Primitive::Timestamp(us) | Primitive::TimestampTz(us) => from_units(*us, 1_000_000),
        Primitive::TimestampMs(ms) => from_units(*ms, 1_000),
        Primitive::TimestampNs(ns) => from_units(*ns, NANOS_PER_SECOND),
        Primitive::TimestampSec(s) => from_units(*s, 1),
        other => Err(payload_mismatch(&TypeId::TEMPORAL, other)),
    }
}

/// Interval collapsed to one duration, 1 month = 30 days.
pub fn duration(interval: Interval) -> Result<TimeDelta> {
    interval
        .total_micros()
        .map(TimeDelta::microseconds)
        .ok_or_else(|| ConversionError::failed(format!("interval {interval:?} overflows a duration")))
}

/// Blob bytes, cut according to `mode`.
pub fn blob(mode: BlobLength, mut bytes: Vec<u8>) -> Vec<u8> {
    if mode == BlobLength::NulTerminated {
        if let Some(end) = bytes.iter().position(|b| *b == 0) {
            tracing::debug!(len = bytes.len(), kept = end, "blob truncated at first NUL");
            bytes.truncate(end);
        }
    }
    bytes
}

/// `DECIMAL` text or `INT128`, both as arbitrary-precision decimal.
pub fn decimal(p: &Primitive) -> Result<BigDecimal> {
    match p {
        Primitive::Decimal { text, .. } => Ok(BigDecimal::from_str(text)?),
        Primitive::Int128(v) => Ok(BigDecimal::from_str(&v.to_string())?),
        other => Err(payload_mismatch(&[TypeId::Decimal, TypeId::Int128], other)),
    }
}

pub fn uuid(p: &Primitive) -> Result<Uuid> {
    match p {
        Primitive::Uuid(text) => Ok(Uuid::parse_str(text)?),
        other => Err(payload_mismatch(&[TypeId::Uuid], other)),
    }
}

/// Any scalar payload as a dynamically typed host value.
pub fn to_host(cx: Context<'_>, p: Primitive) -> Result<HostValue> {
    let value = match p {
        Primitive::Bool(v) => HostValue::Bool(v),
        Primitive::Int8(v) => HostValue::Int8(v),
        Primitive::Int16(v) => HostValue::Int16(v),
        Primitive::Int32(v) => HostValue::Int32(v),
        Primitive::Int64(v) | Primitive::Serial(v) => HostValue::Int64(v),
        Primitive::UInt8(v) => HostValue::UInt8(v),
        Primitive::UInt16(v) => HostValue::UInt16(v),
        Primitive::UInt32(v) => HostValue::UInt32(v),
        Primitive::UInt64(v) => HostValue::UInt64(v),
        Primitive::Float(v) => HostValue::Float(v),
        Primitive::Double(v) => HostValue::Double(v),
        Primitive::String(v) => HostValue::String(v),
        Primitive::Blob(bytes) => HostValue::Blob(blob(cx.config().blob_length, bytes)),
        Primitive::Interval(iv) => HostValue::Duration(duration(iv)?),
        Primitive::InternalId(id) => HostValue::InternalId(id),
        ref p @ (Primitive::Int128(_) | Primitive::Decimal { .. }) => HostValue::Decimal(decimal(p)?),
        ref p @ Primitive::Uuid(_) => HostValue::Uuid(uuid(p)?),
        ref p @ (Primitive::Date(_)
        | Primitive::Timestamp(_)
        | Primitive::TimestampTz(_)
        | Primitive::TimestampMs(_)
        | Primitive::TimestampNs(_)
        | Primitive::TimestampSec(_)) => HostValue::Timestamp(timestamp(p)?),
    };
    Ok(value)
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Integral decimals that fit 128 bits go to `INT128`, everything else to
/// `DECIMAL(p, s)`.
pub fn encode_decimal(d: &BigDecimal) -> Result<Primitive> {
    let integral = d.with_scale(0);
    if integral == *d {
        let (digits, _) = integral.as_bigint_and_exponent();
        if let Ok(v) = digits.to_string().parse::<i128>() {
            return Ok(Primitive::Int128(v));
        }
    }

    let d = if d.as_bigint_and_exponent().1 < 0 { integral } else { d.clone() };
    decimal_payload(&d)
}

/// `INT128` payload restated as `DECIMAL(p, 0)`, for collections that also
/// hold fractional decimals.
pub fn int128_as_decimal(v: i128) -> Result<Primitive> {
    decimal_payload(&BigDecimal::from_str(&v.to_string())?)
}

fn decimal_payload(d: &BigDecimal) -> Result<Primitive> {
    let (digits, scale) = d.as_bigint_and_exponent();
    let width = digits.to_string().trim_start_matches('-').len() as i64;
    let precision = width.max(scale);
    if precision > MAX_DECIMAL_PRECISION {
        return Err(ConversionError::failed(format!(
            "decimal {d} needs {precision} digits, engine maximum is {MAX_DECIMAL_PRECISION}"
        )));
    }
    Ok(Primitive::Decimal {
        text: d.to_string(),
        precision: precision as u8,
        scale: scale as u8,
    })
}

/// Sub-microsecond precision is dropped.
pub fn encode_timestamp(t: &DateTime<Utc>) -> Primitive {
    Primitive::Timestamp(t.timestamp_micros())
}

pub fn encode_duration(d: &TimeDelta) -> Result<Primitive> {
    let micros = d
        .num_microseconds()
        .ok_or_else(|| ConversionError::failed(format!("duration {d} overflows an interval")))?;
    Ok(Primitive::Interval(Interval::from_micros(micros)))
}

/// UUIDs travel as their canonical hyphenated text.
pub fn encode_uuid(u: &Uuid) -> Primitive {
    Primitive::Uuid(u.hyphenated().to_string())
}
