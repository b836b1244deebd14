use std::fmt;

use crate::error::EngineStatus;
use crate::types::{LogicalType, TypeId};
use crate::value::{InternalId, Interval};

/// Opaque engine value handle.
///
/// A handle is owned by whoever received it from a `create_*` or accessor
/// call and must be passed to [`Engine::destroy`] exactly once.
/// Prefer [`OwnedValue`], which does that on drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RawValue(pub u64);

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type EngineResult<T> = Result<T, EngineStatus>;

/// Scalar payload as stored by the engine, one variant per scalar tag.
///
/// The variant returned by [`Engine::read_primitive`] always agrees with
/// the value's reported tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    /// Auto-increment int64.
    Serial(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Int128(i128),
    Float(f32),
    Double(f64),
    /// Decimal as canonical text, with declared precision and scale.
    Decimal { text: String, precision: u8, scale: u8 },
    String(String),
    /// Raw blob buffer as handed out by the engine.
    Blob(Vec<u8>),
    /// Canonical hyphenated UUID text.
    Uuid(String),
    /// Days since epoch.
    Date(i32),
    /// Microseconds since epoch.
    Timestamp(i64),
    /// Microseconds since epoch, UTC-normalized.
    TimestampTz(i64),
    TimestampMs(i64),
    TimestampNs(i64),
    TimestampSec(i64),
    Interval(Interval),
    InternalId(InternalId),
}

impl Primitive {
    pub fn type_id(&self) -> TypeId {
        match self {
            Primitive::Bool(_) => TypeId::Bool,
            Primitive::Int8(_) => TypeId::Int8,
            Primitive::Int16(_) => TypeId::Int16,
            Primitive::Int32(_) => TypeId::Int32,
            Primitive::Int64(_) => TypeId::Int64,
            Primitive::Serial(_) => TypeId::Serial,
            Primitive::UInt8(_) => TypeId::UInt8,
            Primitive::UInt16(_) => TypeId::UInt16,
            Primitive::UInt32(_) => TypeId::UInt32,
            Primitive::UInt64(_) => TypeId::UInt64,
            Primitive::Int128(_) => TypeId::Int128,
            Primitive::Float(_) => TypeId::Float,
            Primitive::Double(_) => TypeId::Double,
            Primitive::Decimal { .. } => TypeId::Decimal,
            Primitive::String(_) => TypeId::String,
            Primitive::Blob(_) => TypeId::Blob,
            Primitive::Uuid(_) => TypeId::Uuid,
            Primitive::Date(_) => TypeId::Date,
            Primitive::Timestamp(_) => TypeId::Timestamp,
            Primitive::TimestampTz(_) => TypeId::TimestampTz,
            Primitive::TimestampMs(_) => TypeId::TimestampMs,
            Primitive::TimestampNs(_) => TypeId::TimestampNs,
            Primitive::TimestampSec(_) => TypeId::TimestampSec,
            Primitive::Interval(_) => TypeId::Interval,
            Primitive::InternalId(_) => TypeId::InternalId,
        }
    }

    pub fn logical_type(&self) -> LogicalType {
        match self {
            Primitive::Decimal { precision, scale, .. } => LogicalType::decimal(*precision, *scale),
            other => LogicalType::scalar(other.type_id()),
        }
    }
}

/// Rows produced by [`Engine::execute`]. Every cell handle is owned by the caller.
#[derive(Debug, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

/// The embedded graph engine, as seen by the codec.
///
/// Opaque oracle: the codec never inspects engine memory, it only goes
/// through these calls. Accessors that return a [`RawValue`] hand out a
/// NEW handle owned by the caller; constructors copy their child values,
/// so the caller keeps ownership of the children it passed in.
pub trait Engine: Send + Sync {
    // ── lifecycle / type introspection ───────────────────────────

    /// Release one handle.
    fn destroy(&self, value: RawValue);

    fn is_null(&self, value: RawValue) -> EngineResult<bool>;

    /// Tag plus shape metadata of a value.
    fn logical_type(&self, value: RawValue) -> EngineResult<LogicalType>;

    // ── scalars ──────────────────────────────────────────────────

    /// Null value of the given type (`ANY` when unknown).
    fn create_null(&self, ty: LogicalType) -> EngineResult<RawValue>;

    fn create_primitive(&self, value: Primitive) -> EngineResult<RawValue>;

    fn read_primitive(&self, value: RawValue) -> EngineResult<Primitive>;

    // ── composite construction ───────────────────────────────────

    /// Fails if the elements do not share one logical type.
    fn create_list(&self, elements: &[RawValue]) -> EngineResult<RawValue>;

    /// Field order is taken as given.
    fn create_struct(&self, fields: &[(&str, RawValue)]) -> EngineResult<RawValue>;

    /// Fails if keys or values do not each share one logical type.
    fn create_map(&self, keys: &[RawValue], values: &[RawValue]) -> EngineResult<RawValue>;

    // ── list / array ─────────────────────────────────────────────

    fn list_size(&self, list: RawValue) -> EngineResult<u64>;

    fn list_element(&self, list: RawValue, index: u64) -> EngineResult<RawValue>;

    // ── struct / union (union active member sits at field 0) ─────

    fn struct_field_count(&self, value: RawValue) -> EngineResult<u64>;

    fn struct_field_name(&self, value: RawValue, index: u64) -> EngineResult<String>;

    fn struct_field_value(&self, value: RawValue, index: u64) -> EngineResult<RawValue>;

    // ── map ──────────────────────────────────────────────────────

    fn map_size(&self, map: RawValue) -> EngineResult<u64>;

    fn map_key(&self, map: RawValue, index: u64) -> EngineResult<RawValue>;

    fn map_value(&self, map: RawValue, index: u64) -> EngineResult<RawValue>;

    // ── node ─────────────────────────────────────────────────────

    fn node_id(&self, node: RawValue) -> EngineResult<RawValue>;

    fn node_label(&self, node: RawValue) -> EngineResult<RawValue>;

    fn node_property_count(&self, node: RawValue) -> EngineResult<u64>;

    fn node_property_name(&self, node: RawValue, index: u64) -> EngineResult<String>;

    fn node_property_value(&self, node: RawValue, index: u64) -> EngineResult<RawValue>;

    // ── relationship ─────────────────────────────────────────────

    fn rel_id(&self, rel: RawValue) -> EngineResult<RawValue>;

    fn rel_source_id(&self, rel: RawValue) -> EngineResult<RawValue>;

    fn rel_target_id(&self, rel: RawValue) -> EngineResult<RawValue>;

    fn rel_label(&self, rel: RawValue) -> EngineResult<RawValue>;

    fn rel_property_count(&self, rel: RawValue) -> EngineResult<u64>;

    fn rel_property_name(&self, rel: RawValue, index: u64) -> EngineResult<String>;

    fn rel_property_value(&self, rel: RawValue, index: u64) -> EngineResult<RawValue>;

    // ── recursive relationship ───────────────────────────────────

    /// Node list of a path, as an ordinary `LIST` value.
    fn recursive_rel_nodes(&self, path: RawValue) -> EngineResult<RawValue>;

    /// Relationship list of a path, as an ordinary `LIST` value.
    fn recursive_rel_rels(&self, path: RawValue) -> EngineResult<RawValue>;

    // ── execution ────────────────────────────────────────────────

    /// Run a statement with already-constructed parameter values.
    /// Parameters are copied; the caller keeps ownership of them.
    fn execute(&self, statement: &str, params: &[(&str, RawValue)]) -> EngineResult<ResultSet>;
}

/// Scoped owner of one engine handle. Destroys it on drop, on every path.
///
/// A decoded host value never keeps one of these alive: decode borrows
/// the top-level value and releases every child it acquires before returning.
pub struct OwnedValue<'e> {
    engine: &'e dyn Engine,
    raw: RawValue,
}

impl<'e> OwnedValue<'e> {
    /// Take ownership of a handle just returned by `engine`.
    pub fn adopt(engine: &'e dyn Engine, raw: RawValue) -> Self {
        Self { engine, raw }
    }

    /// Adopt the handle produced by an engine call, or pass its failure through.
    pub fn from_result(engine: &'e dyn Engine, result: EngineResult<RawValue>) -> EngineResult<Self> {
        result.map(|raw| Self::adopt(engine, raw))
    }

    pub fn engine(&self) -> &'e dyn Engine {
        self.engine
    }

    pub fn raw(&self) -> RawValue {
        self.raw
    }

    /// Give the handle up without destroying it. The caller becomes
    /// responsible for calling [`Engine::destroy`].
    pub fn into_raw(self) -> RawValue {
        let raw = self.raw;
        std::mem::forget(self);
        raw
    }

    pub fn is_null(&self) -> EngineResult<bool> {
        self.engine.is_null(self.raw)
    }

    pub fn logical_type(&self) -> EngineResult<LogicalType> {
        self.engine.logical_type(self.raw)
    }

    pub fn type_id(&self) -> EngineResult<TypeId> {
        self.logical_type().map(|t| t.id())
    }

    /// Adopt a child handle obtained through `f`.
    pub fn child(
        &self,
        f: impl FnOnce(&dyn Engine, RawValue) -> EngineResult<RawValue>,
    ) -> EngineResult<OwnedValue<'e>> {
        Self::from_result(self.engine, f(self.engine, self.raw))
    }
}

impl Drop for OwnedValue<'_> {
    fn drop(&mut self) {
        self.engine.destroy(self.raw);
    }
}

impl fmt::Debug for OwnedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedValue").field("raw", &self.raw).finish()
    }
}
