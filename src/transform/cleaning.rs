use crate::table::{ColumnData, Table};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The two independent cleaning toggles offered per file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningOptions {
    pub remove_duplicates: bool,
    pub fill_missing_with_mean: bool,
}

impl CleaningOptions {
    pub fn is_noop(&self) -> bool {
        !self.remove_duplicates && !self.fill_missing_with_mean
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub duplicates_removed: usize,
    pub cells_filled: usize,
}

impl CleaningReport {
    /// Success messages for the toggles that ran.
    pub fn messages(&self, options: &CleaningOptions) -> Vec<String> {
        let mut messages = Vec::new();
        if options.remove_duplicates {
            messages.push(format!(
                "Duplicates removed ({} rows dropped)",
                self.duplicates_removed
            ));
        }
        if options.fill_missing_with_mean {
            messages.push(format!(
                "Missing values filled with column mean ({} cells)",
                self.cells_filled
            ));
        }
        messages
    }
}

/// Runs the selected operations. Duplicates go first so the means used for
/// filling are computed on the deduplicated rows.
pub fn apply_cleaning(table: Table, options: &CleaningOptions) -> (Table, CleaningReport) {
    let mut table = table;
    let mut report = CleaningReport::default();

    if options.remove_duplicates {
        report.duplicates_removed = dedup_rows(&mut table);
    }
    if options.fill_missing_with_mean {
        report.cells_filled = fill_numeric_gaps(&mut table);
    }

    tracing::info!(
        duplicates_removed = report.duplicates_removed,
        cells_filled = report.cells_filled,
        "Cleaning applied"
    );
    (table, report)
}

/// Drops every row equal to an earlier one, keeping first occurrences in order.
pub fn remove_duplicates(table: Table) -> Table {
    let mut table = table;
    dedup_rows(&mut table);
    table
}

/// Replaces absent cells of numeric columns with the mean of the present
/// values of the same column. Columns without any present value are kept.
pub fn fill_missing_with_mean(table: Table) -> Table {
    let mut table = table;
    fill_numeric_gaps(&mut table);
    table
}

#[derive(PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Absent,
    Number(u64),
    Text(&'a str),
    Bool(bool),
    Date(NaiveDateTime),
}

fn number_key(value: f64) -> u64 {
    // -0.0 and 0.0 compare equal as values
    if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

fn cell_key(data: &ColumnData, row: usize) -> CellKey<'_> {
    let key = match data {
        ColumnData::Numeric(v) => v
            .get(row)
            .copied()
            .flatten()
            .map(|x| CellKey::Number(number_key(x))),
        ColumnData::Text(v) => v.get(row).and_then(Option::as_deref).map(CellKey::Text),
        ColumnData::Boolean(v) => v.get(row).copied().flatten().map(CellKey::Bool),
        ColumnData::Date(v) => v.get(row).copied().flatten().map(CellKey::Date),
    };
    key.unwrap_or(CellKey::Absent)
}

fn first_occurrences(table: &Table) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(table.height());
    (0..table.height())
        .filter(|&row| {
            let key: Vec<CellKey<'_>> = table
                .columns()
                .iter()
                .map(|c| cell_key(c.data(), row))
                .collect();
            seen.insert(key)
        })
        .collect()
}

fn dedup_rows(table: &mut Table) -> usize {
    let keep = first_occurrences(table);
    let removed = table.height() - keep.len();
    if removed > 0 {
        table.retain_rows(&keep);
    }
    removed
}

fn fill_numeric_gaps(table: &mut Table) -> usize {
    let mut filled = 0;
    for column in table.columns_mut() {
        let ColumnData::Numeric(values) = column.data_mut() else {
            continue;
        };
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() || present.len() == values.len() {
            continue;
        }

        let mean = present.iter().sum::<f64>() / present.len() as f64;
        for value in values.iter_mut().filter(|v| v.is_none()) {
            *value = Some(mean);
            filled += 1;
        }
    }
    filled
}
