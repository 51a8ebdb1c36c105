use crate::error::{Result, ShiftError};
use crate::table::{Column, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Columns to keep after cleaning. Defaults to every column in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSelection {
    #[default]
    All,
    Columns(Vec<String>),
}

impl ColumnSelection {
    /// Checks the selection against `table` without consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftError::UnknownColumn`] if a named column is missing.
    pub fn check(&self, table: &Table) -> Result<()> {
        match self {
            Self::All => Ok(()),
            Self::Columns(names) => check_names(table, names),
        }
    }

    /// # Errors
    ///
    /// Returns [`ShiftError::UnknownColumn`] if a named column is missing.
    pub fn apply(&self, table: Table) -> Result<Table> {
        match self {
            Self::All => Ok(table),
            Self::Columns(names) => project(table, names),
        }
    }
}

/// Keeps exactly the named columns in the given order. Repeated names are
/// taken once. An empty list leaves a zero-column table with every row.
///
/// # Errors
///
/// Returns [`ShiftError::UnknownColumn`] for a name the table does not have.
pub fn project<S: AsRef<str>>(table: Table, names: &[S]) -> Result<Table> {
    check_names(&table, names)?;

    let height = table.height();
    let mut pool: HashMap<String, Column> = table
        .into_columns()
        .into_iter()
        .map(|c| (c.name().to_owned(), c))
        .collect();
    let columns = names
        .iter()
        .filter_map(|name| pool.remove(name.as_ref()))
        .collect();

    Table::with_height(columns, height)
}

fn check_names<S: AsRef<str>>(table: &Table, names: &[S]) -> Result<()> {
    match names
        .iter()
        .map(AsRef::as_ref)
        .find(|name| table.column(name).is_none())
    {
        Some(missing) => Err(ShiftError::UnknownColumn(missing.to_owned())),
        None => Ok(()),
    }
}
