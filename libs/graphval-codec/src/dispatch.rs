//! Dynamic decoder: routes on the value's own tag when the host type is not
//! known up front.

use graphval_api::{ConversionError, HostValue, OwnedValue, TypeId};

use crate::context::Context;
use crate::{Result, composite, scalar};

/// Decode any engine value into a [`HostValue`].
///
/// Null is handled once here, before dispatch. Composite children come back
/// through this same function, so mixed-type struct fields, map entries and
/// properties each resolve by their own tag.
pub fn decode(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<HostValue> {
    if value.is_null()? {
        return Ok(HostValue::Null);
    }
    let tag = value.type_id()?;
    tracing::trace!(tag = %tag, depth = cx.depth(), "dispatch");

    match tag {
        TypeId::List | TypeId::Array => composite::decode_list(cx, value, decode).map(HostValue::List),
        TypeId::Struct => composite::decode_struct(cx, value, decode).map(HostValue::Struct),
        TypeId::Map => composite::decode_map(cx, value, decode, decode).map(HostValue::Map),
        TypeId::Union => composite::decode_union(cx, value),
        TypeId::Node => composite::decode_node(cx, value).map(HostValue::Node),
        TypeId::Rel => composite::decode_relationship(cx, value).map(HostValue::Relationship),
        TypeId::RecursiveRel => {
            composite::decode_recursive_relationship(cx, value).map(HostValue::RecursiveRelationship)
        }
        // A non-null value always reports a concrete tag; ANY here means the
        // engine could not resolve one.
        TypeId::Any | TypeId::Pointer => Err(ConversionError::unsupported(format!(
            "no decoder for engine type {tag}"
        ))),
        _ => scalar::to_host(cx, scalar::read(value)?),
    }
}
