use std::sync::Arc;

use graphval_api::{HostValue, OwnedValue, ResultSet};

use crate::Codec;
use crate::error::QueryError;
use crate::typed::Decode;

/// Rows of one executed statement.
///
/// Every cell handle is adopted up front, so rows that are never iterated
/// are still released when this is dropped.
pub struct QueryRows<'c, 'e> {
    codec: &'c Codec,
    columns: Arc<[String]>,
    rows: std::vec::IntoIter<Vec<OwnedValue<'e>>>,
}

impl<'c, 'e> QueryRows<'c, 'e> {
    pub(crate) fn new(codec: &'c Codec, engine: &'e dyn graphval_api::Engine, result: ResultSet) -> Self {
        let rows: Vec<Vec<OwnedValue<'e>>> = result
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(|raw| OwnedValue::adopt(engine, raw)).collect())
            .collect();
        Self {
            codec,
            columns: result.columns.into(),
            rows: rows.into_iter(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl<'c, 'e> Iterator for QueryRows<'c, 'e> {
    type Item = Row<'c, 'e>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|cells| Row {
            codec: self.codec,
            columns: Arc::clone(&self.columns),
            cells,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for QueryRows<'_, '_> {}

/// One result row. Owns its cell handles until dropped.
pub struct Row<'c, 'e> {
    codec: &'c Codec,
    columns: Arc<[String]>,
    cells: Vec<OwnedValue<'e>>,
}

impl<'e> Row<'_, 'e> {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw cell, for callers that walk the engine value themselves.
    pub fn cell(&self, index: usize) -> Result<&OwnedValue<'e>, QueryError> {
        self.cells.get(index).ok_or(QueryError::ColumnOutOfRange {
            index,
            count: self.cells.len(),
        })
    }

    fn column_name(&self, index: usize) -> &str {
        self.columns.get(index).map_or("?", String::as_str)
    }

    /// Cell decoded dynamically.
    pub fn value(&self, index: usize) -> Result<HostValue, QueryError> {
        let cell = self.cell(index)?;
        self.codec
            .decode_dynamic(cell)
            .map_err(|e| QueryError::from(e).with_context(format_args!("column '{}'", self.column_name(index))))
    }

    /// Cell decoded as `T`; fails on a tag outside `T::ACCEPTS`.
    pub fn get<T: Decode>(&self, index: usize) -> Result<T, QueryError> {
        let cell = self.cell(index)?;
        self.codec
            .decode_typed(cell)
            .map_err(|e| QueryError::from(e).with_context(format_args!("column '{}'", self.column_name(index))))
    }

    pub fn get_by_name<T: Decode>(&self, name: &str) -> Result<T, QueryError> {
        let index = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| QueryError::UnknownColumn(name.to_string()))?;
        self.get(index)
    }

    /// Every cell, in column order.
    pub fn to_vec(&self) -> Result<Vec<HostValue>, QueryError> {
        (0..self.cells.len()).map(|i| self.value(i)).collect()
    }

    /// Column name → value, in column order.
    pub fn to_pairs(&self) -> Result<Vec<(String, HostValue)>, QueryError> {
        (0..self.cells.len())
            .map(|i| Ok((self.column_name(i).to_string(), self.value(i)?)))
            .collect()
    }
}
