//! Statically-typed decoder.
//!
//! Each host type names the engine tags it accepts. A value is decoded only
//! if its tag is in that set; extraction then goes through the same scalar
//! and composite routines the dynamic decoder uses.

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use graphval_api::{
    Blob, ConversionError, HostValue, InternalId, Interval, MapEntries, Node, OwnedValue,
    Primitive, RecursiveRelationship, Relationship, StructFields, TypeId,
};

use crate::context::Context;
use crate::{Result, composite, dispatch, scalar};

/// Host type that can be decoded from an engine value.
pub trait Decode: Sized {
    /// Engine tags this type accepts. `[ANY]` means every tag, resolved at
    /// runtime.
    const ACCEPTS: &'static [TypeId];

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self>;
}

/// Reject null, then check tag membership.
pub fn expect_tag(value: &OwnedValue<'_>, accepts: &[TypeId]) -> Result<TypeId> {
    if value.is_null()? {
        return Err(ConversionError::NullValue);
    }
    let actual = value.type_id()?;
    if accepts.contains(&actual) {
        Ok(actual)
    } else {
        Err(ConversionError::type_mismatch(accepts, actual))
    }
}

macro_rules! decode_scalar {
    ($($ty:ty => [$($tag:ident),+] { $($variant:ident),+ };)*) => {
        $(
            impl Decode for $ty {
                const ACCEPTS: &'static [TypeId] = &[$(TypeId::$tag),+];

                fn decode(_cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
                    expect_tag(value, Self::ACCEPTS)?;
                    match scalar::read(value)? {
                        $(Primitive::$variant(v) => Ok(v),)+
                        other => Err(scalar::payload_mismatch(Self::ACCEPTS, &other)),
                    }
                }
            }
        )*
    };
}

decode_scalar! {
    bool => [Bool] { Bool };
    i8 => [Int8] { Int8 };
    i16 => [Int16] { Int16 };
    i32 => [Int32] { Int32 };
    i64 => [Int64, Serial] { Int64, Serial };
    u8 => [UInt8] { UInt8 };
    u16 => [UInt16] { UInt16 };
    u32 => [UInt32] { UInt32 };
    u64 => [UInt64] { UInt64 };
    f32 => [Float] { Float };
    f64 => [Double] { Double };
    String => [String] { String };
    InternalId => [InternalId] { InternalId };
    Interval => [Interval] { Interval };
}

impl Decode for BigDecimal {
    const ACCEPTS: &'static [TypeId] = &[TypeId::Decimal, TypeId::Int128];

    fn decode(_cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        expect_tag(value, Self::ACCEPTS)?;
        scalar::decimal(&scalar::read(value)?)
    }
}

impl Decode for Uuid {
    const ACCEPTS: &'static [TypeId] = &[TypeId::Uuid];

    fn decode(_cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        expect_tag(value, Self::ACCEPTS)?;
        scalar::uuid(&scalar::read(value)?)
    }
}

impl Decode for DateTime<Utc> {
    const ACCEPTS: &'static [TypeId] = &TypeId::TEMPORAL;

    fn decode(_cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        expect_tag(value, Self::ACCEPTS)?;
        scalar::timestamp(&scalar::read(value)?)
    }
}

impl Decode for TimeDelta {
    const ACCEPTS: &'static [TypeId] = &[TypeId::Interval];

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        scalar::duration(Interval::decode(cx, value)?)
    }
}

impl Decode for Blob {
    const ACCEPTS: &'static [TypeId] = &[TypeId::Blob];

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        expect_tag(value, Self::ACCEPTS)?;
        match scalar::read(value)? {
            Primitive::Blob(bytes) => Ok(Blob(scalar::blob(cx.config().blob_length, bytes))),
            other => Err(scalar::payload_mismatch(Self::ACCEPTS, &other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Composite targets
// ---------------------------------------------------------------------------

impl<T: Decode> Decode for Vec<T> {
    const ACCEPTS: &'static [TypeId] = &[TypeId::List, TypeId::Array];

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        expect_tag(value, Self::ACCEPTS)?;
        composite::decode_list(cx, value, T::decode)
    }
}

impl<T: Decode> Decode for StructFields<T> {
    const ACCEPTS: &'static [TypeId] = &[TypeId::Struct];

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        expect_tag(value, Self::ACCEPTS)?;
        composite::decode_struct(cx, value, T::decode).map(StructFields)
    }
}

impl<K: Decode, V: Decode> Decode for MapEntries<K, V> {
    const ACCEPTS: &'static [TypeId] = &[TypeId::Map];

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        expect_tag(value, Self::ACCEPTS)?;
        composite::decode_map(cx, value, K::decode, V::decode).map(MapEntries)
    }
}

impl Decode for Node {
    const ACCEPTS: &'static [TypeId] = &[TypeId::Node];

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        expect_tag(value, Self::ACCEPTS)?;
        composite::decode_node(cx, value)
    }
}

impl Decode for Relationship {
    const ACCEPTS: &'static [TypeId] = &[TypeId::Rel];

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        expect_tag(value, Self::ACCEPTS)?;
        composite::decode_relationship(cx, value)
    }
}

impl Decode for RecursiveRelationship {
    const ACCEPTS: &'static [TypeId] = &[TypeId::RecursiveRel];

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        expect_tag(value, Self::ACCEPTS)?;
        composite::decode_recursive_relationship(cx, value)
    }
}

/// Any tag, null included.
impl Decode for HostValue {
    const ACCEPTS: &'static [TypeId] = &[TypeId::Any];

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        dispatch::decode(cx, value)
    }
}

/// Null short-circuits to `None` without looking at the tag.
impl<T: Decode> Decode for Option<T> {
    const ACCEPTS: &'static [TypeId] = T::ACCEPTS;

    fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Self> {
        if value.is_null()? {
            return Ok(None);
        }
        T::decode(cx, value).map(Some)
    }
}
