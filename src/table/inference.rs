//! Column-kind inference.
//!
//! Decoders hand over raw cells; this module decides each column's
//! [`ColumnKind`] and converts the cells into typed [`ColumnData`]. The rules
//! do not depend on which decoder produced the cells:
//!
//! 1. **Numeric** if every present cell is a number or text that parses as one.
//!    A column with no present cells is numeric (all absent).
//! 2. **Boolean** if every present cell is a boolean or `true`/`false`.
//! 3. **Date** if every present cell is a date-time or an ISO-style date text.
//! 4. **Text** otherwise.

use super::{Column, ColumnData, ColumnKind, format_number};
use chrono::{NaiveDate, NaiveDateTime};

/// A decoded cell before its column's kind is known.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Missing,
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Text(String),
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: [&str; 1] = ["%Y-%m-%d"];

pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// Each `as_*` returns `None` when the cell cannot belong to that kind and
// `Some(None)` for an absent cell.

fn as_number(cell: &RawCell) -> Option<Option<f64>> {
    match cell {
        RawCell::Missing => Some(None),
        RawCell::Number(v) => Some(Some(*v)),
        RawCell::Text(s) => parse_number(s).map(Some),
        RawCell::Bool(_) | RawCell::Date(_) => None,
    }
}

fn as_bool(cell: &RawCell) -> Option<Option<bool>> {
    match cell {
        RawCell::Missing => Some(None),
        RawCell::Bool(b) => Some(Some(*b)),
        RawCell::Text(s) => parse_bool(s).map(Some),
        RawCell::Number(_) | RawCell::Date(_) => None,
    }
}

fn as_date(cell: &RawCell) -> Option<Option<NaiveDateTime>> {
    match cell {
        RawCell::Missing => Some(None),
        RawCell::Date(d) => Some(Some(*d)),
        RawCell::Text(s) => parse_date(s).map(Some),
        RawCell::Number(_) | RawCell::Bool(_) => None,
    }
}

fn as_text(cell: &RawCell) -> Option<String> {
    match cell {
        RawCell::Missing => None,
        RawCell::Number(v) => Some(format_number(*v)),
        RawCell::Bool(b) => Some(b.to_string()),
        RawCell::Date(d) => Some(d.format(super::DATE_FORMAT).to_string()),
        RawCell::Text(s) => Some(s.clone()),
    }
}

/// Decides the kind of a column from its raw cells.
pub fn classify(cells: &[RawCell]) -> ColumnKind {
    if cells.iter().all(|c| as_number(c).is_some()) {
        ColumnKind::Numeric
    } else if cells.iter().all(|c| as_bool(c).is_some()) {
        ColumnKind::Boolean
    } else if cells.iter().all(|c| as_date(c).is_some()) {
        ColumnKind::Date
    } else {
        ColumnKind::Text
    }
}

/// Converts raw cells into typed column data of the classified kind.
pub fn into_column_data(cells: &[RawCell]) -> ColumnData {
    // Every cell converts once the kind is known, so nothing is filtered out
    match classify(cells) {
        ColumnKind::Numeric => ColumnData::Numeric(cells.iter().filter_map(as_number).collect()),
        ColumnKind::Boolean => ColumnData::Boolean(cells.iter().filter_map(as_bool).collect()),
        ColumnKind::Date => ColumnData::Date(cells.iter().filter_map(as_date).collect()),
        ColumnKind::Text => ColumnData::Text(cells.iter().map(as_text).collect()),
    }
}

pub fn build_column(name: impl Into<String>, cells: &[RawCell]) -> Column {
    let column = Column::new(name, into_column_data(cells));
    tracing::debug!(column = column.name(), kind = %column.kind(), "inferred column kind");
    column
}

/// Makes header names usable as unique column names: blanks become
/// `Unnamed: <index>` and repeats get a `.1`, `.2`, ... suffix.
pub fn normalize_headers(raw: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for (idx, header) in raw.iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header.clone()
        };
        let mut candidate = base.clone();
        let mut suffix = 1;
        while names.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(candidate);
    }
    names
}
