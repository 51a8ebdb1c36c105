use crate::table::{ColumnData, ColumnKind, Table};
use serde::{Deserialize, Serialize};

/// The numeric columns of `table`, in their original order.
pub fn numeric_view(table: &Table) -> Table {
    table.filter_columns(|c| c.kind() == ColumnKind::Numeric)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Bar chart data: one bar group per row, one series per numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    /// Row index labels for the x axis
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// Builds chart data from the numeric view. `None` means there is nothing
/// to draw.
pub fn bar_chart(table: &Table) -> Option<BarChart> {
    let view = numeric_view(table);
    if view.width() == 0 {
        tracing::debug!("No numeric columns to chart");
        return None;
    }

    let series = view
        .into_columns()
        .into_iter()
        .filter_map(|column| match column.data() {
            ColumnData::Numeric(values) => Some(ChartSeries {
                name: column.name().to_owned(),
                values: values.clone(),
            }),
            _ => None,
        })
        .collect();

    Some(BarChart {
        labels: (0..table.height()).map(|row| row.to_string()).collect(),
        series,
    })
}
