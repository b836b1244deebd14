use graphval_api::{
    EngineResult, EngineStatus, InternalId, LogicalType, Primitive, Shape, StructField, TypeId,
};

/// Node as stored by the memory engine.
#[derive(Debug, Clone, PartialEq)]
pub struct MemNode {
    pub id: InternalId,
    pub label: String,
    pub properties: Vec<(String, MemValue)>,
}

impl MemNode {
    pub fn new(id: InternalId, label: impl Into<String>) -> Self {
        Self { id, label: label.into(), properties: Vec::new() }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: MemValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }
}

/// Relationship as stored by the memory engine.
#[derive(Debug, Clone, PartialEq)]
pub struct MemRel {
    pub id: InternalId,
    pub source: InternalId,
    pub target: InternalId,
    pub label: String,
    pub properties: Vec<(String, MemValue)>,
}

impl MemRel {
    pub fn new(
        id: InternalId,
        source: InternalId,
        target: InternalId,
        label: impl Into<String>,
    ) -> Self {
        Self { id, source, target, label: label.into(), properties: Vec::new() }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: MemValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }
}

/// Value tree behind one handle.
///
/// Composite variants carry their full logical type so that the type of an
/// all-null or nested value survives copies.
#[derive(Debug, Clone, PartialEq)]
pub enum MemValue {
    Null(LogicalType),
    Primitive(Primitive),
    /// `LIST` or `ARRAY`, depending on `ty`.
    List { ty: LogicalType, items: Vec<MemValue> },
    Struct { ty: LogicalType, fields: Vec<(String, MemValue)> },
    Map { ty: LogicalType, entries: Vec<(MemValue, MemValue)> },
    /// Only the active member is stored.
    Union { ty: LogicalType, tag: String, member: Box<MemValue> },
    Node(MemNode),
    Rel(MemRel),
    RecursiveRel { nodes: Vec<MemNode>, rels: Vec<MemRel> },
}

impl MemValue {
    pub fn null() -> Self {
        MemValue::Null(LogicalType::any())
    }

    pub fn int64(v: i64) -> Self {
        MemValue::Primitive(Primitive::Int64(v))
    }

    pub fn string(v: impl Into<String>) -> Self {
        MemValue::Primitive(Primitive::String(v.into()))
    }

    pub fn logical_type(&self) -> LogicalType {
        match self {
            MemValue::Null(ty) => ty.clone(),
            MemValue::Primitive(p) => p.logical_type(),
            MemValue::List { ty, .. }
            | MemValue::Struct { ty, .. }
            | MemValue::Map { ty, .. }
            | MemValue::Union { ty, .. } => ty.clone(),
            MemValue::Node(_) => TypeId::Node.into(),
            MemValue::Rel(_) => TypeId::Rel.into(),
            MemValue::RecursiveRel { .. } => TypeId::RecursiveRel.into(),
        }
    }

    /// Variable-length list. All items must unify to one element type.
    pub fn list(items: Vec<MemValue>) -> EngineResult<Self> {
        let child = element_type(&items, "list")?;
        Ok(MemValue::List { ty: LogicalType::list(child), items })
    }

    /// Fixed-size array of `items.len()` elements.
    pub fn array(items: Vec<MemValue>) -> EngineResult<Self> {
        let child = element_type(&items, "array")?;
        let size = items.len() as u64;
        Ok(MemValue::List { ty: LogicalType::array(child, size), items })
    }

    /// Struct with fields in the given order.
    pub fn struct_of(fields: Vec<(String, MemValue)>) -> EngineResult<Self> {
        if fields.is_empty() {
            return Err(EngineStatus::new("cannot create struct with zero fields"));
        }
        let ty = LogicalType::struct_of(
            fields
                .iter()
                .map(|(name, v)| StructField::new(name.clone(), v.logical_type()))
                .collect(),
        );
        Ok(MemValue::Struct { ty, fields })
    }

    pub fn map(entries: Vec<(MemValue, MemValue)>) -> EngineResult<Self> {
        if entries.is_empty() {
            return Err(EngineStatus::new("cannot create map from zero entries"));
        }
        let keys: Vec<LogicalType> = entries.iter().map(|(k, _)| k.logical_type()).collect();
        let values: Vec<LogicalType> = entries.iter().map(|(_, v)| v.logical_type()).collect();
        let key = unify_all(&keys)
            .ok_or_else(|| EngineStatus::new("map keys must be of the same type"))?;
        let value = unify_all(&values)
            .ok_or_else(|| EngineStatus::new("map values must be of the same type"))?;
        Ok(MemValue::Map { ty: LogicalType::map(key, value), entries })
    }

    /// Union over `members` with `tag` active.
    pub fn union_of(members: Vec<StructField>, tag: &str, value: MemValue) -> EngineResult<Self> {
        let declared = members
            .iter()
            .find(|m| m.name == tag)
            .ok_or_else(|| EngineStatus::new(format!("union has no member '{tag}'")))?;
        if unify(&declared.ty, &value.logical_type()).is_none() {
            return Err(EngineStatus::new(format!(
                "union member '{tag}' is {}, got {}",
                declared.ty,
                value.logical_type()
            )));
        }
        Ok(MemValue::Union {
            ty: LogicalType::union_of(members),
            tag: tag.to_string(),
            member: Box::new(value),
        })
    }
}

impl From<Primitive> for MemValue {
    fn from(p: Primitive) -> Self {
        MemValue::Primitive(p)
    }
}

fn element_type(items: &[MemValue], what: &str) -> EngineResult<LogicalType> {
    if items.is_empty() {
        return Err(EngineStatus::new(format!("cannot create {what} from zero elements")));
    }
    let types: Vec<LogicalType> = items.iter().map(MemValue::logical_type).collect();
    unify_all(&types).ok_or_else(|| {
        EngineStatus::new(format!("{what} elements must be of the same type: {}", types_list(&types)))
    })
}

fn types_list(types: &[LogicalType]) -> String {
    let names: Vec<String> = types.iter().map(LogicalType::to_string).collect();
    names.join(", ")
}

fn unify_all(types: &[LogicalType]) -> Option<LogicalType> {
    let (first, rest) = types.split_first()?;
    rest.iter().try_fold(first.clone(), |acc, t| unify(&acc, t))
}

/// Common type of two values, if any.
///
/// `ANY` (the type of an untyped null) unifies with everything. Decimals
/// widen to hold both operands. Struct fields must agree in name and order.
pub fn unify(a: &LogicalType, b: &LogicalType) -> Option<LogicalType> {
    if a.id() == TypeId::Any {
        return Some(b.clone());
    }
    if b.id() == TypeId::Any || a == b {
        return Some(a.clone());
    }
    if a.id() != b.id() {
        return None;
    }
    match (a.shape(), b.shape()) {
        (
            Shape::Decimal { precision: p1, scale: s1 },
            Shape::Decimal { precision: p2, scale: s2 },
        ) => {
            let scale = (*s1).max(*s2);
            let integral = p1.saturating_sub(*s1).max(p2.saturating_sub(*s2));
            let precision = integral.saturating_add(scale).min(38);
            Some(LogicalType::decimal(precision, scale))
        }
        (Shape::List(x), Shape::List(y)) => unify(x, y).map(LogicalType::list),
        (Shape::Array { child: x, size: n }, Shape::Array { child: y, size: m }) if n == m => {
            unify(x, y).map(|c| LogicalType::array(c, *n))
        }
        (Shape::Struct(f), Shape::Struct(g)) if f.len() == g.len() => f
            .iter()
            .zip(g)
            .map(|(x, y)| {
                (x.name == y.name)
                    .then(|| unify(&x.ty, &y.ty))
                    .flatten()
                    .map(|ty| StructField::new(x.name.clone(), ty))
            })
            .collect::<Option<Vec<_>>>()
            .map(LogicalType::struct_of),
        (Shape::Map { key: k1, value: v1 }, Shape::Map { key: k2, value: v2 }) => {
            Some(LogicalType::map(unify(k1, k2)?, unify(v1, v2)?))
        }
        _ => None,
    }
}
