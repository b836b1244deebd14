use std::fmt;

use base64::Engine as _;
use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

/// Host-side value, fully detached from the engine.
///
/// Strategy by type:
/// - Fixed-width integers and floats: one variant per engine width, no boxing ambiguity
/// - Decimal: arbitrary precision, also carries 128-bit integers
/// - Timestamp: every engine temporal tag collapses here (UTC instant)
/// - Duration: engine interval collapsed with 1 month = 30 days
/// - List, Struct, Map: ordered, recursive
/// - Node, Relationship, RecursiveRelationship: graph elements with ordered properties
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    String(String),
    Blob(Vec<u8>),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Duration(TimeDelta),
    InternalId(InternalId),

    /// List or fixed-size array, engine order preserved.
    List(Vec<HostValue>),
    /// Ordered field name → value pairs.
    Struct(Vec<(String, HostValue)>),
    /// Ordered key → value pairs. Not a hash map: keys may be composite.
    Map(Vec<(HostValue, HostValue)>),

    Node(Node),
    Relationship(Relationship),
    RecursiveRelationship(RecursiveRelationship),
}

impl HostValue {
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Short kind name, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "bool",
            HostValue::Int8(_) => "int8",
            HostValue::Int16(_) => "int16",
            HostValue::Int32(_) => "int32",
            HostValue::Int64(_) => "int64",
            HostValue::UInt8(_) => "uint8",
            HostValue::UInt16(_) => "uint16",
            HostValue::UInt32(_) => "uint32",
            HostValue::UInt64(_) => "uint64",
            HostValue::Float(_) => "float",
            HostValue::Double(_) => "double",
            HostValue::Decimal(_) => "decimal",
            HostValue::String(_) => "string",
            HostValue::Blob(_) => "blob",
            HostValue::Uuid(_) => "uuid",
            HostValue::Timestamp(_) => "timestamp",
            HostValue::Duration(_) => "duration",
            HostValue::InternalId(_) => "internal id",
            HostValue::List(_) => "list",
            HostValue::Struct(_) => "struct",
            HostValue::Map(_) => "map",
            HostValue::Node(_) => "node",
            HostValue::Relationship(_) => "relationship",
            HostValue::RecursiveRelationship(_) => "recursive relationship",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Int8(v) => Some(i64::from(*v)),
            HostValue::Int16(v) => Some(i64::from(*v)),
            HostValue::Int32(v) => Some(i64::from(*v)),
            HostValue::Int64(v) => Some(*v),
            HostValue::UInt8(v) => Some(i64::from(*v)),
            HostValue::UInt16(v) => Some(i64::from(*v)),
            HostValue::UInt32(v) => Some(i64::from(*v)),
            HostValue::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Field lookup on a struct value.
    pub fn field(&self, name: &str) -> Option<&HostValue> {
        match self {
            HostValue::Struct(fields) => lookup(fields, name),
            _ => None,
        }
    }

    /// JSON rendering for display and export.
    ///
    /// Decimals and 64-bit unsigned values that overflow `i64` stay exact as
    /// strings, timestamps are RFC 3339, blobs base64, durations microseconds.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{Value, json};
        match self {
            HostValue::Null => Value::Null,
            HostValue::Bool(b) => Value::Bool(*b),
            HostValue::Int8(v) => json!(v),
            HostValue::Int16(v) => json!(v),
            HostValue::Int32(v) => json!(v),
            HostValue::Int64(v) => json!(v),
            HostValue::UInt8(v) => json!(v),
            HostValue::UInt16(v) => json!(v),
            HostValue::UInt32(v) => json!(v),
            HostValue::UInt64(v) => json!(v),
            HostValue::Float(v) => json!(v),
            HostValue::Double(v) => json!(v),
            HostValue::Decimal(d) => Value::String(d.to_string()),
            HostValue::String(s) => Value::String(s.clone()),
            HostValue::Blob(b) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            HostValue::Uuid(u) => Value::String(u.to_string()),
            HostValue::Timestamp(ts) => Value::String(ts.to_rfc3339()),
            HostValue::Duration(d) => match d.num_microseconds() {
                Some(micros) => json!(micros),
                None => Value::Null,
            },
            HostValue::InternalId(id) => id.to_json(),
            HostValue::List(items) => Value::Array(items.iter().map(HostValue::to_json).collect()),
            HostValue::Struct(fields) => properties_json(fields),
            HostValue::Map(entries) => Value::Array(
                entries
                    .iter()
                    .map(|(k, v)| json!({ "key": k.to_json(), "value": v.to_json() }))
                    .collect(),
            ),
            HostValue::Node(node) => json!({
                "_id": node.id.to_json(),
                "_label": node.label,
                "properties": properties_json(&node.properties),
            }),
            HostValue::Relationship(rel) => json!({
                "_id": rel.id.to_json(),
                "_src": rel.source_id.to_json(),
                "_dst": rel.target_id.to_json(),
                "_label": rel.label,
                "properties": properties_json(&rel.properties),
            }),
            HostValue::RecursiveRelationship(path) => json!({
                "_nodes": path.nodes.iter().map(|n| HostValue::Node(n.clone()).to_json()).collect::<Vec<_>>(),
                "_rels": path.relationships.iter().map(|r| HostValue::Relationship(r.clone()).to_json()).collect::<Vec<_>>(),
            }),
        }
    }
}

fn lookup<'a>(pairs: &'a [(String, HostValue)], name: &str) -> Option<&'a HostValue> {
    pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
}

fn properties_json(pairs: &[(String, HostValue)]) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> =
        pairs.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
    serde_json::Value::Object(map)
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Engine-assigned identity of a node or relationship.
///
/// Equality is structural on both fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternalId {
    pub table_id: u64,
    pub offset: u64,
}

impl InternalId {
    pub fn new(table_id: u64, offset: u64) -> Self {
        Self { table_id, offset }
    }

    fn to_json(self) -> serde_json::Value {
        serde_json::json!({ "table": self.table_id, "offset": self.offset })
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.offset)
    }
}

/// Graph node as decoded from a query result.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: InternalId,
    pub label: String,
    /// Property name → value, in engine order.
    pub properties: Vec<(String, HostValue)>,
}

impl Node {
    pub fn property(&self, name: &str) -> Option<&HostValue> {
        lookup(&self.properties, name)
    }
}

/// Graph relationship as decoded from a query result.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: InternalId,
    pub source_id: InternalId,
    pub target_id: InternalId,
    pub label: String,
    pub properties: Vec<(String, HostValue)>,
}

impl Relationship {
    pub fn property(&self, name: &str) -> Option<&HostValue> {
        lookup(&self.properties, name)
    }
}

/// Path produced by a variable-length traversal.
///
/// `nodes` holds only intermediate nodes: a one-hop path has zero nodes
/// and one relationship, so `nodes.len() == relationships.len() + 1`
/// does not hold in general.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecursiveRelationship {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
}

/// Raw engine interval, before collapsing to a single duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub micros: i64,
}

impl Interval {
    pub const DAYS_PER_MONTH: i64 = 30;
    pub const MICROS_PER_DAY: i64 = 86_400 * 1_000_000;

    pub fn new(months: i32, days: i32, micros: i64) -> Self {
        Self { months, days, micros }
    }

    /// Interval with only a microsecond component.
    pub fn from_micros(micros: i64) -> Self {
        Self { months: 0, days: 0, micros }
    }

    /// Total length in microseconds, 1 month = 30 days.
    ///
    /// `None` if the total does not fit in `i64`.
    pub fn total_micros(&self) -> Option<i64> {
        let days = i128::from(self.months) * i128::from(Self::DAYS_PER_MONTH)
            + i128::from(self.days);
        let total = days * i128::from(Self::MICROS_PER_DAY) + i128::from(self.micros);
        i64::try_from(total).ok()
    }
}

/// Opaque byte string. Distinct from `Vec<u8>`, which encodes as a list of `UINT8`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob(pub Vec<u8>);

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Blob {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Ordered key-value pairs of an engine `MAP`.
///
/// Kept as a pair list so composite keys and insertion order survive the
/// round trip. Key uniqueness is not checked.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntries<K, V>(pub Vec<(K, V)>);

impl<K, V> MapEntries<K, V> {
    pub fn new(entries: Vec<(K, V)>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.0.iter()
    }
}

impl<K, V> From<Vec<(K, V)>> for MapEntries<K, V> {
    fn from(entries: Vec<(K, V)>) -> Self {
        Self(entries)
    }
}

/// Ordered field name → value pairs of an engine `STRUCT`, typed per field.
///
/// Decoding keeps engine field order. Encoding sorts by name first.
#[derive(Debug, Clone, PartialEq)]
pub struct StructFields<T>(pub Vec<(String, T)>);

impl<T> StructFields<T> {
    pub fn new(fields: Vec<(String, T)>) -> Self {
        Self(fields)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl<T> From<Vec<(String, T)>> for StructFields<T> {
    fn from(fields: Vec<(String, T)>) -> Self {
        Self(fields)
    }
}

// ---------------------------------------------------------------------------
// From impls: native host types → HostValue
// ---------------------------------------------------------------------------

macro_rules! host_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for HostValue {
                fn from(v: $ty) -> Self {
                    HostValue::$variant(v)
                }
            }
        )*
    };
}

host_from! {
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
    BigDecimal => Decimal,
    String => String,
    Uuid => Uuid,
    DateTime<Utc> => Timestamp,
    TimeDelta => Duration,
    InternalId => InternalId,
    Node => Node,
    Relationship => Relationship,
    RecursiveRelationship => RecursiveRelationship,
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<Blob> for HostValue {
    fn from(b: Blob) -> Self {
        HostValue::Blob(b.0)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(HostValue::Null, Into::into)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(items: Vec<T>) -> Self {
        HostValue::List(items.into_iter().map(Into::into).collect())
    }
}
