use crate::cell::{Cell, ZERO_TIME};
use crate::driver::Arg;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use time::PrimitiveDateTime;

/// One record in column order. Serializes as a JSON array of cells.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowData(Vec<Cell>);

impl RowData {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self(cells)
    }

    pub fn nulls(width: usize) -> Self {
        Self(vec![Cell::null(); width])
    }

    /// Cells as bind parameters, in column order.
    pub fn args(&self) -> Vec<Arg> {
        self.0.iter().map(Arg::from).collect()
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.0
    }

    /// Pairs cells with `columns` by position.
    pub fn to_map(&self, columns: &[String]) -> RowMap {
        columns
            .iter()
            .cloned()
            .zip(self.0.iter().cloned())
            .collect()
    }

    pub fn into_map(self, columns: &[String]) -> RowMap {
        columns.iter().cloned().zip(self.0).collect()
    }
}

impl Deref for RowData {
    type Target = [Cell];

    fn deref(&self) -> &[Cell] {
        &self.0
    }
}

impl DerefMut for RowData {
    fn deref_mut(&mut self) -> &mut [Cell] {
        &mut self.0
    }
}

impl From<Vec<Cell>> for RowData {
    fn from(cells: Vec<Cell>) -> Self {
        Self(cells)
    }
}

impl FromIterator<Cell> for RowData {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RowData {
    type Item = Cell;
    type IntoIter = std::vec::IntoIter<Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// One record keyed by column name, in column order.
///
/// Getters never fail: a missing column or unparsable text yields the zero
/// value (or the given default for the `_or` variants).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowMap(IndexMap<String, Cell>);

impl RowMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, cell: Cell) -> Option<Cell> {
        self.0.insert(column.into(), cell)
    }

    pub fn cell(&self, column: &str) -> Option<&Cell> {
        self.0.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_string(&self, column: &str) -> &str {
        self.cell(column).map(Cell::as_str).unwrap_or("")
    }

    /// `default` only when the column is missing; a NULL cell reads as "".
    pub fn get_string_or<'a>(&'a self, column: &str, default: &'a str) -> &'a str {
        self.cell(column).map(Cell::as_str).unwrap_or(default)
    }

    pub fn get_i64(&self, column: &str) -> i64 {
        self.get_i64_or(column, 0)
    }

    pub fn get_i64_or(&self, column: &str, default: i64) -> i64 {
        self.cell(column).map_or(default, |c| c.as_i64(default))
    }

    /// `None` when the column is NULL, missing or not an integer.
    pub fn get_opt_i64(&self, column: &str) -> Option<i64> {
        self.cell(column)?.parse()
    }

    pub fn get_u64(&self, column: &str) -> u64 {
        self.get_u64_or(column, 0)
    }

    pub fn get_u64_or(&self, column: &str, default: u64) -> u64 {
        self.cell(column).map_or(default, |c| c.as_u64(default))
    }

    pub fn get_f64(&self, column: &str) -> f64 {
        self.cell(column).map_or(0.0, |c| c.as_f64(0.0))
    }

    pub fn get_bool(&self, column: &str) -> bool {
        self.cell(column).is_some_and(Cell::as_bool)
    }

    pub fn get_time(&self, column: &str) -> PrimitiveDateTime {
        self.cell(column).map_or(ZERO_TIME, Cell::as_time)
    }
}

impl FromIterator<(String, Cell)> for RowMap {
    fn from_iter<I: IntoIterator<Item = (String, Cell)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RowMap {
    type Item = (String, Cell);
    type IntoIter = indexmap::map::IntoIter<String, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

pub type ResultData = Vec<RowData>;

/// Rows together with the column names they are aligned to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResultData {
    pub columns: Vec<String>,
    #[serde(rename = "rows")]
    pub data: ResultData,
}

impl NamedResultData {
    pub fn new(columns: Vec<String>, data: ResultData) -> Self {
        Self { columns, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RowMap> + '_ {
        self.data.iter().map(|row| row.to_map(&self.columns))
    }

    /// Every row carries exactly one cell per column.
    pub fn is_aligned(&self) -> bool {
        self.data.iter().all(|row| row.len() == self.columns.len())
    }
}
