//! In-memory tabular model shared by every pipeline stage.
//!
//! A [`Table`] is an ordered list of named [`Column`]s, each holding values of
//! a single [`ColumnKind`]. Absent cells are `None`. The row count is stored
//! on the table itself so that a projection onto zero columns keeps it.

pub mod inference;

use crate::error::{Result, ShiftError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Layout used when rendering dates as text (CSV cells, previews).
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Text,
    Boolean,
    Date,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "Numeric",
            Self::Text => "Text",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
        }
    }
}

/// Values of one column. `None` marks an absent cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Boolean(Vec<Option<bool>>),
    Date(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Text(_) => ColumnKind::Text,
            Self::Boolean(_) => ColumnKind::Boolean,
            Self::Date(_) => ColumnKind::Date,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Boolean(v) => v.len(),
            Self::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_absent(&self, row: usize) -> bool {
        match self {
            Self::Numeric(v) => v.get(row).is_some_and(Option::is_none),
            Self::Text(v) => v.get(row).is_some_and(Option::is_none),
            Self::Boolean(v) => v.get(row).is_some_and(Option::is_none),
            Self::Date(v) => v.get(row).is_some_and(Option::is_none),
        }
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_absent(row)).count()
    }

    /// Builds a new column from the given row indices, in that order.
    pub fn take(&self, rows: &[usize]) -> Self {
        fn pick<T: Clone>(values: &[Option<T>], rows: &[usize]) -> Vec<Option<T>> {
            rows.iter()
                .map(|&row| values.get(row).cloned().flatten())
                .collect()
        }

        match self {
            Self::Numeric(v) => Self::Numeric(pick(v, rows)),
            Self::Text(v) => Self::Text(pick(v, rows)),
            Self::Boolean(v) => Self::Boolean(pick(v, rows)),
            Self::Date(v) => Self::Date(pick(v, rows)),
        }
    }

    /// Renders a cell for previews and CSV output. Absent cells render empty.
    pub fn render(&self, row: usize) -> String {
        match self {
            Self::Numeric(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(format_number)
                .unwrap_or_default(),
            Self::Text(v) => v.get(row).cloned().flatten().unwrap_or_default(),
            Self::Boolean(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|b| b.to_string())
                .unwrap_or_default(),
            Self::Date(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }
}

/// Shortest decimal form that parses back to the same `f64`.
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ColumnData {
        &mut self.data
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered, uniquely named columns sharing one row count.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    /// Builds a table, taking the row count from the first column.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftError::InvalidTable`] if column lengths differ or a
    /// name is repeated.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map_or(0, Column::len);
        Self::with_height(columns, height)
    }

    /// Builds a table with an explicit row count, which must match every
    /// column. Needed for zero-column tables that still have rows.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftError::InvalidTable`] on a length mismatch or a
    /// repeated column name.
    pub fn with_height(columns: Vec<Column>, height: usize) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if column.len() != height {
                return Err(ShiftError::InvalidTable(format!(
                    "column '{}' has {} rows, expected {height}",
                    column.name(),
                    column.len()
                )));
            }
            if !seen.insert(column.name()) {
                return Err(ShiftError::InvalidTable(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }
        Ok(Self { columns, height })
    }

    /// A table with no columns and `height` rows of width zero.
    pub fn empty(height: usize) -> Self {
        Self {
            columns: Vec::new(),
            height,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_owned()).collect()
    }

    pub fn kinds(&self) -> Vec<(String, ColumnKind)> {
        self.columns
            .iter()
            .map(|c| (c.name().to_owned(), c.kind()))
            .collect()
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Keeps only the given rows, in the given order.
    pub(crate) fn retain_rows(&mut self, rows: &[usize]) {
        for column in &mut self.columns {
            column.data = column.data.take(rows);
        }
        self.height = rows.len();
    }

    /// Clones the columns matching `predicate`, keeping their order.
    pub fn filter_columns(&self, predicate: impl Fn(&Column) -> bool) -> Self {
        Self {
            columns: self.columns.iter().filter(|c| predicate(c)).cloned().collect(),
            height: self.height,
        }
    }

    /// First `n` rows of the table (the preview shown after each step).
    pub fn head(&self, n: usize) -> Self {
        let rows: Vec<usize> = (0..n.min(self.height)).collect();
        let mut head = self.clone();
        head.retain_rows(&rows);
        head
    }

    /// Cells of one row rendered as text, in column order.
    pub fn render_row(&self, row: usize) -> Vec<String> {
        self.columns.iter().map(|c| c.data.render(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Result<Table> {
        Table::new(vec![
            Column::new("id", ColumnData::Numeric(vec![Some(1.0), None, Some(2.5)])),
            Column::new(
                "name",
                ColumnData::Text(vec![Some("a".to_owned()), Some("b".to_owned()), None]),
            ),
        ])
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::new("a", ColumnData::Numeric(vec![Some(1.0)])),
            Column::new("b", ColumnData::Boolean(vec![Some(true), Some(false)])),
        ]);
        assert!(matches!(result, Err(ShiftError::InvalidTable(_))));
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let result = Table::new(vec![
            Column::new("a", ColumnData::Numeric(vec![Some(1.0)])),
            Column::new("a", ColumnData::Numeric(vec![Some(2.0)])),
        ]);
        assert!(matches!(result, Err(ShiftError::InvalidTable(_))));
    }

    #[test]
    fn test_head_limits_rows() -> Result<()> {
        let table = sample()?;
        let head = table.head(2);
        assert_eq!(head.height(), 2);
        assert_eq!(head.width(), 2);
        assert_eq!(table.head(10).height(), 3);
        Ok(())
    }

    #[test]
    fn test_render_row_leaves_absent_cells_empty() -> Result<()> {
        let table = sample()?;
        assert_eq!(table.render_row(1), vec![String::new(), "b".to_owned()]);
        assert_eq!(table.render_row(2), vec!["2.5".to_owned(), String::new()]);
        Ok(())
    }

    #[test]
    fn test_integral_numbers_render_without_fraction() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-0.25), "-0.25");
    }

    #[test]
    fn test_empty_table_keeps_height() {
        let table = Table::empty(4);
        assert_eq!(table.height(), 4);
        assert_eq!(table.width(), 0);
        assert_eq!(table.head(5).height(), 4);
    }
}
