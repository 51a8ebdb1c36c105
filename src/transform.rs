//! Table-to-table stages of the per-file pipeline.
//!
//! - [`cleaning`]: duplicate removal and mean imputation of numeric columns
//! - [`projection`]: restricting a table to a chosen, ordered column subset
//! - [`aggregate`]: the numeric-only view that feeds the bar chart
//!
//! Every stage takes a [`Table`](crate::table::Table) by value and returns
//! the new state, so each can be tested on its own.

pub mod aggregate;
pub mod cleaning;
pub mod projection;

pub use aggregate::{BarChart, ChartSeries, bar_chart, numeric_view};
pub use cleaning::{
    CleaningOptions, CleaningReport, apply_cleaning, fill_missing_with_mean, remove_duplicates,
};
pub use projection::{ColumnSelection, project};
