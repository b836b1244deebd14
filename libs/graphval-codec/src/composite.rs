//! Composite decoders: list/array, struct, map, union and the graph types.
//!
//! Every child handle is taken into an [`OwnedValue`] the moment it is
//! returned, so a failure partway through releases the children already
//! materialized. Element decoding is passed in, which lets the same walk
//! serve both the dynamic and the typed decoder.

use graphval_api::{
    ConversionError, Engine, EngineResult, HostValue, InternalId, Node, OwnedValue, Primitive,
    RawValue, RecursiveRelationship, Relationship, TypeId,
};

use crate::context::Context;
use crate::typed::Decode;
use crate::{Result, dispatch, scalar};

// Capacity hint cap; the engine reports sizes we have not walked yet.
const PREALLOCATE_LIMIT: u64 = 1024;

fn with_capacity<T>(count: u64) -> Vec<T> {
    Vec::with_capacity(count.min(PREALLOCATE_LIMIT) as usize)
}

/// Elements of a `LIST` or `ARRAY`, in engine order.
///
/// Arrays take their element count from the static size on the logical
/// type; lists ask the engine at runtime.
pub fn decode_list<T>(
    cx: Context<'_>,
    value: &OwnedValue<'_>,
    mut element: impl FnMut(Context<'_>, &OwnedValue<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let cx = cx.nested()?;
    let count = match value.logical_type()?.array_size() {
        Some(size) => size,
        None => value.engine().list_size(value.raw())?,
    };
    let mut items = with_capacity(count);
    for i in 0..count {
        let child = value.child(|e, raw| e.list_element(raw, i))?;
        let item = element(cx, &child).map_err(|e| e.with_context(format_args!("element {i}")))?;
        items.push(item);
    }
    Ok(items)
}

/// Field name → value pairs of a `STRUCT`, in engine field order.
pub fn decode_struct<T>(
    cx: Context<'_>,
    value: &OwnedValue<'_>,
    mut field: impl FnMut(Context<'_>, &OwnedValue<'_>) -> Result<T>,
) -> Result<Vec<(String, T)>> {
    let cx = cx.nested()?;
    let engine = value.engine();
    let count = engine.struct_field_count(value.raw())?;
    let mut fields = with_capacity(count);
    for i in 0..count {
        let name = engine.struct_field_name(value.raw(), i)?;
        let child = value.child(|e, raw| e.struct_field_value(raw, i))?;
        let decoded = field(cx, &child).map_err(|e| e.with_context(format_args!("field '{name}'")))?;
        fields.push((name, decoded));
    }
    Ok(fields)
}

/// Key-value pairs of a `MAP`, in engine order.
pub fn decode_map<K, V>(
    cx: Context<'_>,
    value: &OwnedValue<'_>,
    mut key: impl FnMut(Context<'_>, &OwnedValue<'_>) -> Result<K>,
    mut val: impl FnMut(Context<'_>, &OwnedValue<'_>) -> Result<V>,
) -> Result<Vec<(K, V)>> {
    let cx = cx.nested()?;
    let count = value.engine().map_size(value.raw())?;
    let mut entries = with_capacity(count);
    for i in 0..count {
        let k = value.child(|e, raw| e.map_key(raw, i))?;
        let v = value.child(|e, raw| e.map_value(raw, i))?;
        let ctx = |e: ConversionError| e.with_context(format_args!("map entry {i}"));
        entries.push((key(cx, &k).map_err(ctx)?, val(cx, &v).map_err(ctx)?));
    }
    Ok(entries)
}

/// Active member of a `UNION`, decoded by its own tag.
///
/// The member always sits at field 0; declared member types are ignored.
pub fn decode_union(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<HostValue> {
    let cx = cx.nested()?;
    let member = value.child(|e, raw| e.struct_field_value(raw, 0))?;
    dispatch::decode(cx, &member)
}

// ---------------------------------------------------------------------------
// Graph elements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Element {
    Node,
    Rel,
}

impl Element {
    fn property_count(self, engine: &dyn Engine, raw: RawValue) -> EngineResult<u64> {
        match self {
            Element::Node => engine.node_property_count(raw),
            Element::Rel => engine.rel_property_count(raw),
        }
    }

    fn property_name(self, engine: &dyn Engine, raw: RawValue, i: u64) -> EngineResult<String> {
        match self {
            Element::Node => engine.node_property_name(raw, i),
            Element::Rel => engine.rel_property_name(raw, i),
        }
    }

    fn property_value(self, engine: &dyn Engine, raw: RawValue, i: u64) -> EngineResult<RawValue> {
        match self {
            Element::Node => engine.node_property_value(raw, i),
            Element::Rel => engine.rel_property_value(raw, i),
        }
    }
}

/// Properties decode dynamically: their types vary per element.
fn properties(
    cx: Context<'_>,
    value: &OwnedValue<'_>,
    element: Element,
) -> Result<Vec<(String, HostValue)>> {
    let engine = value.engine();
    let count = element.property_count(engine, value.raw())?;
    let mut props = with_capacity(count);
    for i in 0..count {
        let name = element.property_name(engine, value.raw(), i)?;
        let child = value.child(|e, raw| element.property_value(e, raw, i))?;
        let decoded = dispatch::decode(cx, &child)
            .map_err(|e| e.with_context(format_args!("property '{name}'")))?;
        props.push((name, decoded));
    }
    Ok(props)
}

fn internal_id(value: OwnedValue<'_>) -> Result<InternalId> {
    match scalar::read(&value)? {
        Primitive::InternalId(id) => Ok(id),
        other => Err(scalar::payload_mismatch(&[TypeId::InternalId], &other)),
    }
}

fn label(value: OwnedValue<'_>) -> Result<String> {
    match scalar::read(&value)? {
        Primitive::String(s) => Ok(s),
        other => Err(scalar::payload_mismatch(&[TypeId::String], &other)),
    }
}

pub fn decode_node(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Node> {
    let cx = cx.nested()?;
    Ok(Node {
        id: internal_id(value.child(|e, raw| e.node_id(raw))?)?,
        label: label(value.child(|e, raw| e.node_label(raw))?)?,
        properties: properties(cx, value, Element::Node)?,
    })
}

pub fn decode_relationship(cx: Context<'_>, value: &OwnedValue<'_>) -> Result<Relationship> {
    let cx = cx.nested()?;
    Ok(Relationship {
        id: internal_id(value.child(|e, raw| e.rel_id(raw))?)?,
        source_id: internal_id(value.child(|e, raw| e.rel_source_id(raw))?)?,
        target_id: internal_id(value.child(|e, raw| e.rel_target_id(raw))?)?,
        label: label(value.child(|e, raw| e.rel_label(raw))?)?,
        properties: properties(cx, value, Element::Rel)?,
    })
}

/// Path as node list plus relationship list, each walked as an ordinary list.
///
/// A one-hop path reports zero nodes and one relationship; no relation
/// between the two counts is assumed.
pub fn decode_recursive_relationship(
    cx: Context<'_>,
    value: &OwnedValue<'_>,
) -> Result<RecursiveRelationship> {
    let cx = cx.nested()?;
    let nodes = value.child(|e, raw| e.recursive_rel_nodes(raw))?;
    let rels = value.child(|e, raw| e.recursive_rel_rels(raw))?;
    Ok(RecursiveRelationship {
        nodes: decode_list(cx, &nodes, Node::decode)?,
        relationships: decode_list(cx, &rels, Relationship::decode)?,
    })
}
