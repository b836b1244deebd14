//! Encoder: host value → newly constructed engine value.
//!
//! Every host type maps to exactly one engine constructor. Children of a
//! composite are encoded first and held as [`OwnedValue`]s; the engine copies
//! them into the new collection, and the children are released when this
//! scope ends, whether construction succeeded or not.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use graphval_api::wrappers::{
    BoolWrapper, DoubleWrapper, FloatWrapper, Int8Wrapper, Int16Wrapper, Int32Wrapper,
    Int64Wrapper, UInt8Wrapper, UInt16Wrapper, UInt32Wrapper, UInt64Wrapper,
};
use graphval_api::{
    Blob, CollectionKind, ConversionError, Engine, EngineResult, EngineStatus, HostValue,
    InternalId, Interval, LogicalType, MapEntries, OwnedValue, Primitive, RawValue, StructFields,
    TypeId,
};

use crate::context::Context;
use crate::{Result, scalar};

/// Host type that can be turned into an engine value.
pub trait Encode {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>>;
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

pub fn primitive<'e>(engine: &'e dyn Engine, value: Primitive) -> Result<OwnedValue<'e>> {
    Ok(OwnedValue::from_result(engine, engine.create_primitive(value))?)
}

/// Untyped null; unifies with any element type inside a collection.
pub fn null<'e>(engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
    Ok(OwnedValue::from_result(engine, engine.create_null(LogicalType::any()))?)
}

fn heterogeneous(kind: CollectionKind, status: EngineStatus) -> ConversionError {
    tracing::debug!(collection = %kind, reason = %status.message, "engine rejected collection");
    ConversionError::HeterogeneousType(format!(
        "failed to construct an engine {kind}; make sure all elements are of the same type ({})",
        status.message
    ))
}

fn raws(values: &[OwnedValue<'_>]) -> Vec<RawValue> {
    values.iter().map(OwnedValue::raw).collect()
}

/// Whole-number decimals encode as `INT128`. When such a value sits next to
/// a fractional `DECIMAL` in one collection, restate it as `DECIMAL(p, 0)`
/// so the engine sees a single element type.
fn align_decimals<'e>(engine: &'e dyn Engine, values: Vec<OwnedValue<'e>>) -> Result<Vec<OwnedValue<'e>>> {
    let tags = values.iter().map(OwnedValue::type_id).collect::<EngineResult<Vec<_>>>()?;
    if !tags.contains(&TypeId::Decimal) || !tags.contains(&TypeId::Int128) {
        return Ok(values);
    }
    tracing::debug!(count = values.len(), "restating INT128 siblings as DECIMAL");
    values
        .into_iter()
        .zip(tags)
        .map(|(value, tag)| {
            if tag != TypeId::Int128 {
                return Ok(value);
            }
            match scalar::read(&value)? {
                Primitive::Int128(v) => primitive(engine, scalar::int128_as_decimal(v)?),
                other => Err(scalar::payload_mismatch(&[TypeId::Int128], &other)),
            }
        })
        .collect()
}

/// `LIST` from a non-empty slice. Element homogeneity is left to the engine.
pub fn list<'e, T: Encode>(cx: Context<'_>, engine: &'e dyn Engine, items: &[T]) -> Result<OwnedValue<'e>> {
    if items.is_empty() {
        return Err(ConversionError::EmptyCollection(CollectionKind::List));
    }
    let cx = cx.nested()?;
    let children = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.encode(cx, engine)
                .map_err(|e| e.with_context(format_args!("element {i}")))
        })
        .collect::<Result<Vec<_>>>()?;
    let children = align_decimals(engine, children)?;
    engine
        .create_list(&raws(&children))
        .map(|raw| OwnedValue::adopt(engine, raw))
        .map_err(|status| heterogeneous(CollectionKind::List, status))
}

/// `STRUCT` with fields sorted by name.
///
/// Sorting makes two mappings with the same keys produce the same field
/// order, which a list of structs requires.
pub fn structure<'e, 'a, T: Encode + 'a>(
    cx: Context<'_>,
    engine: &'e dyn Engine,
    fields: impl IntoIterator<Item = (&'a str, &'a T)>,
) -> Result<OwnedValue<'e>> {
    let mut fields: Vec<(&str, &T)> = fields.into_iter().collect();
    if fields.is_empty() {
        return Err(ConversionError::EmptyCollection(CollectionKind::Struct));
    }
    fields.sort_by(|a, b| a.0.cmp(b.0));
    let cx = cx.nested()?;

    let mut children = Vec::with_capacity(fields.len());
    for (name, value) in &fields {
        let child = value
            .encode(cx, engine)
            .map_err(|e| e.with_context(format_args!("field '{name}'")))?;
        children.push(child);
    }
    let named: Vec<(&str, RawValue)> = fields
        .iter()
        .zip(&children)
        .map(|((name, _), child)| (*name, child.raw()))
        .collect();
    Ok(OwnedValue::from_result(engine, engine.create_struct(&named))?)
}

/// `MAP` from ordered pairs. Key and value homogeneity is left to the engine.
pub fn map<'e, K: Encode, V: Encode>(
    cx: Context<'_>,
    engine: &'e dyn Engine,
    entries: &[(K, V)],
) -> Result<OwnedValue<'e>> {
    if entries.is_empty() {
        return Err(ConversionError::EmptyCollection(CollectionKind::Map));
    }
    let cx = cx.nested()?;
    let mut keys = Vec::with_capacity(entries.len());
    let mut values = Vec::with_capacity(entries.len());
    for (i, (k, v)) in entries.iter().enumerate() {
        let ctx = |e: ConversionError| e.with_context(format_args!("map entry {i}"));
        keys.push(k.encode(cx, engine).map_err(ctx)?);
        values.push(v.encode(cx, engine).map_err(ctx)?);
    }
    let keys = align_decimals(engine, keys)?;
    let values = align_decimals(engine, values)?;
    engine
        .create_map(&raws(&keys), &raws(&values))
        .map(|raw| OwnedValue::adopt(engine, raw))
        .map_err(|status| heterogeneous(CollectionKind::Map, status))
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

macro_rules! encode_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode<'e>(&self, _cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
                    primitive(engine, Primitive::$variant(*self))
                }
            }
        )*
    };
}

encode_primitive! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    InternalId => InternalId,
    Interval => Interval,
}

macro_rules! encode_wrapper {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode<'e>(&self, _cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
                    primitive(engine, Primitive::$variant(self.value))
                }
            }
        )*
    };
}

encode_wrapper! {
    BoolWrapper => Bool,
    Int8Wrapper => Int8,
    Int16Wrapper => Int16,
    Int32Wrapper => Int32,
    Int64Wrapper => Int64,
    UInt8Wrapper => UInt8,
    UInt16Wrapper => UInt16,
    UInt32Wrapper => UInt32,
    UInt64Wrapper => UInt64,
    FloatWrapper => Float,
    DoubleWrapper => Double,
}

impl Encode for String {
    fn encode<'e>(&self, _cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        primitive(engine, Primitive::String(self.clone()))
    }
}

impl Encode for str {
    fn encode<'e>(&self, _cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        primitive(engine, Primitive::String(self.to_string()))
    }
}

impl Encode for Blob {
    fn encode<'e>(&self, _cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        primitive(engine, Primitive::Blob(self.0.clone()))
    }
}

impl Encode for Uuid {
    fn encode<'e>(&self, _cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        primitive(engine, scalar::encode_uuid(self))
    }
}

impl Encode for BigDecimal {
    fn encode<'e>(&self, _cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        primitive(engine, scalar::encode_decimal(self)?)
    }
}

impl Encode for DateTime<Utc> {
    fn encode<'e>(&self, _cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        primitive(engine, scalar::encode_timestamp(self))
    }
}

impl Encode for TimeDelta {
    fn encode<'e>(&self, _cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        primitive(engine, scalar::encode_duration(self)?)
    }
}

// ---------------------------------------------------------------------------
// Generic containers
// ---------------------------------------------------------------------------

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        (**self).encode(cx, engine)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        (**self).encode(cx, engine)
    }
}

/// `None` → untyped engine null.
impl<T: Encode> Encode for Option<T> {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        match self {
            Some(v) => v.encode(cx, engine),
            None => null(engine),
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        list(cx, engine, self)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        list(cx, engine, self)
    }
}

impl<T: Encode> Encode for BTreeMap<String, T> {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        structure(cx, engine, self.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl<T: Encode, S: BuildHasher> Encode for HashMap<String, T, S> {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        structure(cx, engine, self.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl<T: Encode> Encode for StructFields<T> {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        structure(cx, engine, self.0.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl<K: Encode, V: Encode> Encode for MapEntries<K, V> {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        map(cx, engine, &self.0)
    }
}

// ---------------------------------------------------------------------------
// Dynamic host values
// ---------------------------------------------------------------------------

impl Encode for HostValue {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        match self {
            HostValue::Null => null(engine),
            HostValue::Bool(v) => v.encode(cx, engine),
            HostValue::Int8(v) => v.encode(cx, engine),
            HostValue::Int16(v) => v.encode(cx, engine),
            HostValue::Int32(v) => v.encode(cx, engine),
            HostValue::Int64(v) => v.encode(cx, engine),
            HostValue::UInt8(v) => v.encode(cx, engine),
            HostValue::UInt16(v) => v.encode(cx, engine),
            HostValue::UInt32(v) => v.encode(cx, engine),
            HostValue::UInt64(v) => v.encode(cx, engine),
            HostValue::Float(v) => v.encode(cx, engine),
            HostValue::Double(v) => v.encode(cx, engine),
            HostValue::Decimal(v) => v.encode(cx, engine),
            HostValue::String(v) => v.encode(cx, engine),
            HostValue::Blob(v) => primitive(engine, Primitive::Blob(v.clone())),
            HostValue::Uuid(v) => v.encode(cx, engine),
            HostValue::Timestamp(v) => v.encode(cx, engine),
            HostValue::Duration(v) => v.encode(cx, engine),
            HostValue::InternalId(v) => v.encode(cx, engine),
            HostValue::List(items) => list(cx, engine, items),
            HostValue::Struct(fields) => {
                structure(cx, engine, fields.iter().map(|(k, v)| (k.as_str(), v)))
            }
            HostValue::Map(entries) => map(cx, engine, entries),
            HostValue::Node(_) | HostValue::Relationship(_) | HostValue::RecursiveRelationship(_) => {
                Err(ConversionError::unsupported(format!(
                    "{} values are query results and cannot be encoded",
                    self.kind_name()
                )))
            }
        }
    }
}

/// Generic numbers carry no engine width. With `strict_numeric_width` they
/// are refused; otherwise `INT64`, then `UINT64`, then `DOUBLE`.
fn encode_number<'e>(
    cx: Context<'_>,
    engine: &'e dyn Engine,
    n: &serde_json::Number,
) -> Result<OwnedValue<'e>> {
    if cx.config().strict_numeric_width {
        return Err(ConversionError::unsupported(format!(
            "generic number {n} has no fixed engine width; use a width wrapper"
        )));
    }
    let value = if let Some(v) = n.as_i64() {
        Primitive::Int64(v)
    } else if let Some(v) = n.as_u64() {
        Primitive::UInt64(v)
    } else if let Some(v) = n.as_f64() {
        Primitive::Double(v)
    } else {
        return Err(ConversionError::unsupported(format!("number {n} has no engine mapping")));
    };
    tracing::debug!(number = %n, tag = %value.type_id(), "inferred width for generic number");
    primitive(engine, value)
}

impl Encode for serde_json::Value {
    fn encode<'e>(&self, cx: Context<'_>, engine: &'e dyn Engine) -> Result<OwnedValue<'e>> {
        use serde_json::Value;
        match self {
            Value::Null => null(engine),
            Value::Bool(v) => v.encode(cx, engine),
            Value::Number(n) => encode_number(cx, engine, n),
            Value::String(s) => s.encode(cx, engine),
            Value::Array(items) => list(cx, engine, items),
            Value::Object(fields) => {
                structure(cx, engine, fields.iter().map(|(k, v)| (k.as_str(), v)))
            }
        }
    }
}
