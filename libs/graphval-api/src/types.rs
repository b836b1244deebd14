use std::fmt;

/// Logical type tag of an engine value.
///
/// Closed set. Discriminants match the engine's numeric type ids so a tag
/// can cross the boundary as a plain `u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeId {
    Any = 0,
    Node = 10,
    Rel = 11,
    RecursiveRel = 12,
    /// Auto-increment int64.
    Serial = 13,
    Bool = 22,
    Int64 = 23,
    Int32 = 24,
    Int16 = 25,
    Int8 = 26,
    UInt64 = 27,
    UInt32 = 28,
    UInt16 = 29,
    UInt8 = 30,
    Int128 = 31,
    Double = 32,
    Float = 33,
    Date = 34,
    Timestamp = 35,
    TimestampSec = 36,
    TimestampMs = 37,
    TimestampNs = 38,
    TimestampTz = 39,
    Interval = 40,
    Decimal = 41,
    InternalId = 42,
    String = 50,
    Blob = 51,
    List = 52,
    Array = 53,
    Struct = 54,
    Map = 55,
    Union = 56,
    /// Reserved by the engine, never produced for user data.
    Pointer = 58,
    Uuid = 59,
}

impl TypeId {
    pub const ALL: [TypeId; 35] = [
        TypeId::Any,
        TypeId::Node,
        TypeId::Rel,
        TypeId::RecursiveRel,
        TypeId::Serial,
        TypeId::Bool,
        TypeId::Int64,
        TypeId::Int32,
        TypeId::Int16,
        TypeId::Int8,
        TypeId::UInt64,
        TypeId::UInt32,
        TypeId::UInt16,
        TypeId::UInt8,
        TypeId::Int128,
        TypeId::Double,
        TypeId::Float,
        TypeId::Date,
        TypeId::Timestamp,
        TypeId::TimestampSec,
        TypeId::TimestampMs,
        TypeId::TimestampNs,
        TypeId::TimestampTz,
        TypeId::Interval,
        TypeId::Decimal,
        TypeId::InternalId,
        TypeId::String,
        TypeId::Blob,
        TypeId::List,
        TypeId::Array,
        TypeId::Struct,
        TypeId::Map,
        TypeId::Union,
        TypeId::Pointer,
        TypeId::Uuid,
    ];

    /// Every temporal tag that decodes to the host timestamp type.
    pub const TEMPORAL: [TypeId; 6] = [
        TypeId::Date,
        TypeId::Timestamp,
        TypeId::TimestampSec,
        TypeId::TimestampMs,
        TypeId::TimestampNs,
        TypeId::TimestampTz,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Engine spelling of the tag (`INT64`, `TIMESTAMP_NS`, ...).
    pub fn name(self) -> &'static str {
        match self {
            TypeId::Any => "ANY",
            TypeId::Node => "NODE",
            TypeId::Rel => "REL",
            TypeId::RecursiveRel => "RECURSIVE_REL",
            TypeId::Serial => "SERIAL",
            TypeId::Bool => "BOOL",
            TypeId::Int64 => "INT64",
            TypeId::Int32 => "INT32",
            TypeId::Int16 => "INT16",
            TypeId::Int8 => "INT8",
            TypeId::UInt64 => "UINT64",
            TypeId::UInt32 => "UINT32",
            TypeId::UInt16 => "UINT16",
            TypeId::UInt8 => "UINT8",
            TypeId::Int128 => "INT128",
            TypeId::Double => "DOUBLE",
            TypeId::Float => "FLOAT",
            TypeId::Date => "DATE",
            TypeId::Timestamp => "TIMESTAMP",
            TypeId::TimestampSec => "TIMESTAMP_SEC",
            TypeId::TimestampMs => "TIMESTAMP_MS",
            TypeId::TimestampNs => "TIMESTAMP_NS",
            TypeId::TimestampTz => "TIMESTAMP_TZ",
            TypeId::Interval => "INTERVAL",
            TypeId::Decimal => "DECIMAL",
            TypeId::InternalId => "INTERNAL_ID",
            TypeId::String => "STRING",
            TypeId::Blob => "BLOB",
            TypeId::List => "LIST",
            TypeId::Array => "ARRAY",
            TypeId::Struct => "STRUCT",
            TypeId::Map => "MAP",
            TypeId::Union => "UNION",
            TypeId::Pointer => "POINTER",
            TypeId::Uuid => "UUID",
        }
    }

    /// Tags whose values contain child values.
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            TypeId::List
                | TypeId::Array
                | TypeId::Struct
                | TypeId::Map
                | TypeId::Union
                | TypeId::Node
                | TypeId::Rel
                | TypeId::RecursiveRel
        )
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Formats a tag set as `[INT64, SERIAL]`.
pub fn display_tags(tags: &[TypeId]) -> String {
    let names: Vec<&str> = tags.iter().map(|t| t.name()).collect();
    format!("[{}]", names.join(", "))
}

/// Named member of a struct or union type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub ty: LogicalType,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: LogicalType) -> Self {
        Self { name: name.into(), ty }
    }
}

/// Shape metadata carried next to the tag for composite and decimal types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    None,
    Decimal { precision: u8, scale: u8 },
    List(Box<LogicalType>),
    /// Fixed-size array: element type plus static element count.
    Array { child: Box<LogicalType>, size: u64 },
    Struct(Vec<StructField>),
    Map { key: Box<LogicalType>, value: Box<LogicalType> },
    Union(Vec<StructField>),
}

/// Full logical type of an engine value: tag plus shape.
///
/// Examples:
/// - `INT64` → `{ id: Int64, shape: None }`
/// - `INT64[3]` → `{ id: Array, shape: Array { child: INT64, size: 3 } }`
/// - `STRUCT(a INT64, b STRING)` → `{ id: Struct, shape: Struct([...]) }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalType {
    id: TypeId,
    shape: Shape,
}

impl LogicalType {
    /// Tag without shape metadata. Use the dedicated constructors for
    /// list, array, struct, map, union and decimal.
    pub fn scalar(id: TypeId) -> Self {
        Self { id, shape: Shape::None }
    }

    pub fn any() -> Self {
        Self::scalar(TypeId::Any)
    }

    pub fn decimal(precision: u8, scale: u8) -> Self {
        Self { id: TypeId::Decimal, shape: Shape::Decimal { precision, scale } }
    }

    pub fn list(child: LogicalType) -> Self {
        Self { id: TypeId::List, shape: Shape::List(Box::new(child)) }
    }

    pub fn array(child: LogicalType, size: u64) -> Self {
        Self { id: TypeId::Array, shape: Shape::Array { child: Box::new(child), size } }
    }

    pub fn struct_of(fields: Vec<StructField>) -> Self {
        Self { id: TypeId::Struct, shape: Shape::Struct(fields) }
    }

    pub fn map(key: LogicalType, value: LogicalType) -> Self {
        Self {
            id: TypeId::Map,
            shape: Shape::Map { key: Box::new(key), value: Box::new(value) },
        }
    }

    pub fn union_of(members: Vec<StructField>) -> Self {
        Self { id: TypeId::Union, shape: Shape::Union(members) }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Static element count of a fixed-size array.
    pub fn array_size(&self) -> Option<u64> {
        match &self.shape {
            Shape::Array { size, .. } => Some(*size),
            _ => None,
        }
    }

    /// Element type of a list or array.
    pub fn child(&self) -> Option<&LogicalType> {
        match &self.shape {
            Shape::List(child) | Shape::Array { child, .. } => Some(child),
            _ => None,
        }
    }

    /// Fields of a struct, or members of a union.
    pub fn fields(&self) -> &[StructField] {
        match &self.shape {
            Shape::Struct(fields) | Shape::Union(fields) => fields,
            _ => &[],
        }
    }
}

impl From<TypeId> for LogicalType {
    fn from(id: TypeId) -> Self {
        Self::scalar(id)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shape {
            Shape::None => write!(f, "{}", self.id),
            Shape::Decimal { precision, scale } => write!(f, "DECIMAL({precision}, {scale})"),
            Shape::List(child) => write!(f, "{child}[]"),
            Shape::Array { child, size } => write!(f, "{child}[{size}]"),
            Shape::Map { key, value } => write!(f, "MAP({key}, {value})"),
            Shape::Struct(fields) | Shape::Union(fields) => {
                write!(f, "{}(", self.id)?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", field.name, field.ty)?;
                }
                f.write_str(")")
            }
        }
    }
}
