use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use graphval_api::{
    Engine, EngineResult, EngineStatus, LogicalType, Primitive, RawValue, ResultSet, TypeId,
};

mod value;

pub use value::{MemNode, MemRel, MemValue, unify};

// ═══════════════════════════════════════════════════════════════
//  MemoryEngineConfig
// ═══════════════════════════════════════════════════════════════

fn default_max_live_handles() -> usize {
    1_000_000
}

#[derive(Debug, serde::Deserialize)]
pub struct MemoryEngineConfig {
    /// Upper bound on simultaneously live handles. Creation past it fails,
    /// which turns a handle leak into a visible error.
    #[serde(default = "default_max_live_handles")]
    pub max_live_handles: usize,
}

impl Default for MemoryEngineConfig {
    fn default() -> Self {
        Self {
            max_live_handles: default_max_live_handles(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryEngine
// ═══════════════════════════════════════════════════════════════

struct Fixture {
    columns: Vec<String>,
    rows: Vec<Vec<MemValue>>,
}

/// In-process engine with an exact handle table.
///
/// Every handle lives in the table until destroyed, so tests can check that
/// a conversion released everything it acquired (`live_handles() == 0`).
/// Statements are fixtures registered up front, plus the echo form
/// `RETURN $a, $b` which returns the bound parameters as one row.
pub struct MemoryEngine {
    handles: Mutex<HashMap<u64, Arc<MemValue>>>,
    fixtures: Mutex<HashMap<String, Fixture>>,
    next_handle: AtomicU64,
    invalid_destroys: AtomicUsize,
    max_live_handles: usize,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::with_config(MemoryEngineConfig::default())
    }

    pub fn with_config(config: MemoryEngineConfig) -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            fixtures: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            invalid_destroys: AtomicUsize::new(0),
            max_live_handles: config.max_live_handles,
        }
    }

    /// Number of handles created and not yet destroyed.
    pub fn live_handles(&self) -> usize {
        self.handles.lock().len()
    }

    /// Destroy calls on unknown or already destroyed handles.
    pub fn invalid_destroys(&self) -> usize {
        self.invalid_destroys.load(Ordering::Relaxed)
    }

    /// Hand out a handle to `value`, as the engine does for a result cell.
    pub fn insert(&self, value: MemValue) -> EngineResult<RawValue> {
        let mut handles = self.handles.lock();
        if handles.len() >= self.max_live_handles {
            return Err(EngineStatus::new(format!(
                "handle table full ({} live handles)",
                handles.len()
            )));
        }
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        handles.insert(id, Arc::new(value));
        Ok(RawValue(id))
    }

    /// Snapshot of the value behind a handle.
    pub fn get(&self, value: RawValue) -> EngineResult<Arc<MemValue>> {
        self.handles
            .lock()
            .get(&value.0)
            .cloned()
            .ok_or_else(|| EngineStatus::new(format!("invalid handle {value}")))
    }

    /// Register the rows returned for `statement`.
    pub fn register(&self, statement: &str, columns: &[&str], rows: Vec<Vec<MemValue>>) {
        let fixture = Fixture {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        };
        self.fixtures.lock().insert(statement.trim().to_string(), fixture);
    }

    fn child(&self, value: MemValue) -> EngineResult<RawValue> {
        self.insert(value)
    }

    fn collect(&self, values: &[RawValue]) -> EngineResult<Vec<MemValue>> {
        values.iter().map(|v| self.get(*v).map(|m| (*m).clone())).collect()
    }

    fn node(&self, value: RawValue) -> EngineResult<MemNode> {
        match &*self.get(value)? {
            MemValue::Node(node) => Ok(node.clone()),
            other => Err(not_a("node", other)),
        }
    }

    fn rel(&self, value: RawValue) -> EngineResult<MemRel> {
        match &*self.get(value)? {
            MemValue::Rel(rel) => Ok(rel.clone()),
            other => Err(not_a("relationship", other)),
        }
    }

    /// `RETURN $a, $b` → one row of the bound parameters.
    fn echo(&self, statement: &str, params: &[(&str, RawValue)]) -> Option<EngineResult<ResultSet>> {
        let body = statement.trim().strip_prefix("RETURN ")?;
        let names: Vec<&str> = body.split(',').map(str::trim).collect();
        if !names.iter().all(|n| n.starts_with('$')) {
            return None;
        }
        let mut columns = Vec::with_capacity(names.len());
        let mut row = Vec::with_capacity(names.len());
        for name in names {
            let key = &name[1..];
            let Some((_, raw)) = params.iter().find(|(k, _)| *k == key) else {
                release(self, &row);
                return Some(Err(EngineStatus::new(format!("parameter {name} not found"))));
            };
            let copied = self.get(*raw).and_then(|v| self.insert((*v).clone()));
            match copied {
                Ok(handle) => row.push(handle),
                Err(e) => {
                    release(self, &row);
                    return Some(Err(e));
                }
            }
            columns.push(name.to_string());
        }
        Some(Ok(ResultSet { columns, rows: vec![row] }))
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn release(engine: &MemoryEngine, handles: &[RawValue]) {
    for h in handles {
        engine.destroy(*h);
    }
}

fn not_a(what: &str, value: &MemValue) -> EngineStatus {
    EngineStatus::new(format!("value of type {} is not a {what}", value.logical_type()))
}

fn out_of_range(index: u64, len: usize) -> EngineStatus {
    EngineStatus::new(format!("index {index} out of range for {len} elements"))
}

fn at<T: Clone>(items: &[T], index: u64) -> EngineResult<T> {
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or_else(|| out_of_range(index, items.len()))
}

fn check_primitive(value: &Primitive) -> EngineResult<()> {
    match value {
        Primitive::Uuid(text) if !is_uuid_text(text) => {
            Err(EngineStatus::new(format!("invalid UUID string: {text}")))
        }
        Primitive::Decimal { precision, scale, .. } if *precision > 38 || scale > precision => {
            Err(EngineStatus::new(format!(
                "decimal precision {precision} / scale {scale} out of range (max 38)"
            )))
        }
        _ => Ok(()),
    }
}

fn is_uuid_text(text: &str) -> bool {
    text.len() == 36
        && text.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

impl Engine for MemoryEngine {
    fn destroy(&self, value: RawValue) {
        if self.handles.lock().remove(&value.0).is_none() {
            self.invalid_destroys.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(handle = %value, "destroy of unknown or released handle");
        }
    }

    fn is_null(&self, value: RawValue) -> EngineResult<bool> {
        Ok(matches!(&*self.get(value)?, MemValue::Null(_)))
    }

    fn logical_type(&self, value: RawValue) -> EngineResult<LogicalType> {
        Ok(self.get(value)?.logical_type())
    }

    fn create_null(&self, ty: LogicalType) -> EngineResult<RawValue> {
        self.insert(MemValue::Null(ty))
    }

    fn create_primitive(&self, value: Primitive) -> EngineResult<RawValue> {
        check_primitive(&value)?;
        self.insert(MemValue::Primitive(value))
    }

    fn read_primitive(&self, value: RawValue) -> EngineResult<Primitive> {
        match &*self.get(value)? {
            MemValue::Primitive(p) => Ok(p.clone()),
            other => Err(not_a("scalar", other)),
        }
    }

    fn create_list(&self, elements: &[RawValue]) -> EngineResult<RawValue> {
        let items = self.collect(elements)?;
        let list = MemValue::list(items)?;
        self.insert(list)
    }

    fn create_struct(&self, fields: &[(&str, RawValue)]) -> EngineResult<RawValue> {
        let mut members = Vec::with_capacity(fields.len());
        for (name, raw) in fields {
            members.push((name.to_string(), (*self.get(*raw)?).clone()));
        }
        let value = MemValue::struct_of(members)?;
        self.insert(value)
    }

    fn create_map(&self, keys: &[RawValue], values: &[RawValue]) -> EngineResult<RawValue> {
        if keys.len() != values.len() {
            return Err(EngineStatus::new(format!(
                "map has {} keys but {} values",
                keys.len(),
                values.len()
            )));
        }
        let entries = self.collect(keys)?.into_iter().zip(self.collect(values)?).collect();
        let map = MemValue::map(entries)?;
        self.insert(map)
    }

    fn list_size(&self, list: RawValue) -> EngineResult<u64> {
        match &*self.get(list)? {
            MemValue::List { items, .. } => Ok(items.len() as u64),
            other => Err(not_a("list", other)),
        }
    }

    fn list_element(&self, list: RawValue, index: u64) -> EngineResult<RawValue> {
        let item = match &*self.get(list)? {
            MemValue::List { items, .. } => at(items, index)?,
            other => return Err(not_a("list", other)),
        };
        self.child(item)
    }

    fn struct_field_count(&self, value: RawValue) -> EngineResult<u64> {
        match &*self.get(value)? {
            MemValue::Struct { fields, .. } => Ok(fields.len() as u64),
            MemValue::Union { .. } => Ok(1),
            other => Err(not_a("struct", other)),
        }
    }

    fn struct_field_name(&self, value: RawValue, index: u64) -> EngineResult<String> {
        match &*self.get(value)? {
            MemValue::Struct { fields, .. } => at(fields, index).map(|(name, _)| name),
            MemValue::Union { tag, .. } => at(std::slice::from_ref(tag), index),
            other => Err(not_a("struct", other)),
        }
    }

    fn struct_field_value(&self, value: RawValue, index: u64) -> EngineResult<RawValue> {
        let field = match &*self.get(value)? {
            MemValue::Struct { fields, .. } => at(fields, index).map(|(_, v)| v)?,
            MemValue::Union { member, .. } => at(std::slice::from_ref(&**member), index)?,
            other => return Err(not_a("struct", other)),
        };
        self.child(field)
    }

    fn map_size(&self, map: RawValue) -> EngineResult<u64> {
        match &*self.get(map)? {
            MemValue::Map { entries, .. } => Ok(entries.len() as u64),
            other => Err(not_a("map", other)),
        }
    }

    fn map_key(&self, map: RawValue, index: u64) -> EngineResult<RawValue> {
        let key = match &*self.get(map)? {
            MemValue::Map { entries, .. } => at(entries, index)?.0,
            other => return Err(not_a("map", other)),
        };
        self.child(key)
    }

    fn map_value(&self, map: RawValue, index: u64) -> EngineResult<RawValue> {
        let value = match &*self.get(map)? {
            MemValue::Map { entries, .. } => at(entries, index)?.1,
            other => return Err(not_a("map", other)),
        };
        self.child(value)
    }

    fn node_id(&self, node: RawValue) -> EngineResult<RawValue> {
        let id = self.node(node)?.id;
        self.child(MemValue::Primitive(Primitive::InternalId(id)))
    }

    fn node_label(&self, node: RawValue) -> EngineResult<RawValue> {
        let label = self.node(node)?.label;
        self.child(MemValue::Primitive(Primitive::String(label)))
    }

    fn node_property_count(&self, node: RawValue) -> EngineResult<u64> {
        Ok(self.node(node)?.properties.len() as u64)
    }

    fn node_property_name(&self, node: RawValue, index: u64) -> EngineResult<String> {
        at(&self.node(node)?.properties, index).map(|(name, _)| name)
    }

    fn node_property_value(&self, node: RawValue, index: u64) -> EngineResult<RawValue> {
        let (_, value) = at(&self.node(node)?.properties, index)?;
        self.child(value)
    }

    fn rel_id(&self, rel: RawValue) -> EngineResult<RawValue> {
        let id = self.rel(rel)?.id;
        self.child(MemValue::Primitive(Primitive::InternalId(id)))
    }

    fn rel_source_id(&self, rel: RawValue) -> EngineResult<RawValue> {
        let id = self.rel(rel)?.source;
        self.child(MemValue::Primitive(Primitive::InternalId(id)))
    }

    fn rel_target_id(&self, rel: RawValue) -> EngineResult<RawValue> {
        let id = self.rel(rel)?.target;
        self.child(MemValue::Primitive(Primitive::InternalId(id)))
    }

    fn rel_label(&self, rel: RawValue) -> EngineResult<RawValue> {
        let label = self.rel(rel)?.label;
        self.child(MemValue::Primitive(Primitive::String(label)))
    }

    fn rel_property_count(&self, rel: RawValue) -> EngineResult<u64> {
        Ok(self.rel(rel)?.properties.len() as u64)
    }

    fn rel_property_name(&self, rel: RawValue, index: u64) -> EngineResult<String> {
        at(&self.rel(rel)?.properties, index).map(|(name, _)| name)
    }

    fn rel_property_value(&self, rel: RawValue, index: u64) -> EngineResult<RawValue> {
        let (_, value) = at(&self.rel(rel)?.properties, index)?;
        self.child(value)
    }

    fn recursive_rel_nodes(&self, path: RawValue) -> EngineResult<RawValue> {
        let nodes = match &*self.get(path)? {
            MemValue::RecursiveRel { nodes, .. } => nodes.clone(),
            other => return Err(not_a("recursive relationship", other)),
        };
        self.child(MemValue::List {
            ty: LogicalType::list(TypeId::Node.into()),
            items: nodes.into_iter().map(MemValue::Node).collect(),
        })
    }

    fn recursive_rel_rels(&self, path: RawValue) -> EngineResult<RawValue> {
        let rels = match &*self.get(path)? {
            MemValue::RecursiveRel { rels, .. } => rels.clone(),
            other => return Err(not_a("recursive relationship", other)),
        };
        self.child(MemValue::List {
            ty: LogicalType::list(TypeId::Rel.into()),
            items: rels.into_iter().map(MemValue::Rel).collect(),
        })
    }

    fn execute(&self, statement: &str, params: &[(&str, RawValue)]) -> EngineResult<ResultSet> {
        if let Some(result) = self.echo(statement, params) {
            return result;
        }
        let (columns, rows) = {
            let fixtures = self.fixtures.lock();
            let fixture = fixtures
                .get(statement.trim())
                .ok_or_else(|| EngineStatus::new(format!("unknown statement: {statement}")))?;
            (fixture.columns.clone(), fixture.rows.clone())
        };
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cells = Vec::with_capacity(row.len());
            for cell in row {
                match self.insert(cell) {
                    Ok(handle) => cells.push(handle),
                    Err(e) => {
                        release(self, &cells);
                        out.iter().for_each(|r: &Vec<RawValue>| release(self, r));
                        return Err(e);
                    }
                }
            }
            out.push(cells);
        }
        tracing::debug!(statement, rows = out.len(), "fixture executed");
        Ok(ResultSet { columns, rows: out })
    }
}
