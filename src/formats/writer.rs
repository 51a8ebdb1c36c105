use super::{ExportArtifact, FileFormat};
use crate::error::{Result, ShiftError};
use crate::table::{Column, ColumnData, Table};
use rust_xlsxwriter::{Format, Workbook};

/// Worksheet limits of the OOXML format (header row included).
pub const XLSX_MAX_ROWS: usize = 1_048_576;
pub const XLSX_MAX_COLUMNS: usize = 16_384;

const XLSX_DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// CSV field delimiter
    pub delimiter: u8,
    /// Name of the single worksheet written to XLSX output
    pub sheet_name: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            sheet_name: "Sheet1".to_owned(),
        }
    }
}

/// Encodes a table with default options.
///
/// # Errors
///
/// Returns [`ShiftError::Encode`] if the target cannot represent the table.
pub fn encode(table: &Table, format: FileFormat) -> Result<Vec<u8>> {
    encode_with(table, format, &WriteOptions::default())
}

/// # Errors
///
/// Returns [`ShiftError::Encode`] if the target cannot represent the table.
pub fn encode_with(table: &Table, format: FileFormat, options: &WriteOptions) -> Result<Vec<u8>> {
    let bytes = match format {
        FileFormat::Csv => write_csv(table, options),
        FileFormat::Xlsx => write_xlsx(table, options),
    }?;
    tracing::info!(
        format = %format,
        rows = table.height(),
        columns = table.width(),
        bytes = bytes.len(),
        "Encoded table"
    );
    Ok(bytes)
}

/// Converts a table into a downloadable artifact for a user-named target.
///
/// The target is resolved before anything is encoded, so an unknown target
/// produces no bytes at all.
///
/// # Errors
///
/// Returns [`ShiftError::UnsupportedFormat`] for an unknown target and
/// [`ShiftError::Encode`] if encoding fails.
pub fn export(
    table: &Table,
    original_name: &str,
    target: &str,
    options: &WriteOptions,
) -> Result<ExportArtifact> {
    let format: FileFormat = target.parse()?;
    let bytes = encode_with(table, format, options)?;
    Ok(ExportArtifact::new(original_name, format, bytes))
}

fn csv_error(err: impl std::fmt::Display) -> ShiftError {
    ShiftError::Encode(err.to_string())
}

fn write_csv(table: &Table, options: &WriteOptions) -> Result<Vec<u8>> {
    // Rows of width zero have nothing to write: a bare header line
    if table.width() == 0 {
        return Ok(b"\n".to_vec());
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(Vec::new());

    writer
        .write_record(table.columns().iter().map(Column::name))
        .map_err(csv_error)?;
    for row in 0..table.height() {
        writer
            .write_record(table.render_row(row))
            .map_err(csv_error)?;
    }

    writer.into_inner().map_err(csv_error)
}

fn cell_row(row: usize) -> Result<u32> {
    u32::try_from(row + 1).map_err(|_| ShiftError::Encode(format!("row {row} is out of range")))
}

fn write_xlsx(table: &Table, options: &WriteOptions) -> Result<Vec<u8>> {
    if table.height() + 1 > XLSX_MAX_ROWS {
        return Err(ShiftError::Encode(format!(
            "{} rows exceed the worksheet limit of {}",
            table.height(),
            XLSX_MAX_ROWS - 1
        )));
    }
    if table.width() > XLSX_MAX_COLUMNS {
        return Err(ShiftError::Encode(format!(
            "{} columns exceed the worksheet limit of {XLSX_MAX_COLUMNS}",
            table.width()
        )));
    }

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(XLSX_DATE_FORMAT);

    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(options.sheet_name.as_str())?;

        for (idx, column) in table.columns().iter().enumerate() {
            let col = u16::try_from(idx)
                .map_err(|_| ShiftError::Encode(format!("column {idx} is out of range")))?;
            worksheet.write_string(0, col, column.name())?;

            match column.data() {
                ColumnData::Numeric(values) => {
                    for (row, value) in values.iter().enumerate() {
                        let Some(value) = value else { continue };
                        if !value.is_finite() {
                            return Err(ShiftError::Encode(format!(
                                "column '{}' holds {value} in row {row}, which a worksheet cannot store",
                                column.name()
                            )));
                        }
                        worksheet.write_number(cell_row(row)?, col, *value)?;
                    }
                }
                ColumnData::Text(values) => {
                    for (row, value) in values.iter().enumerate() {
                        if let Some(value) = value {
                            worksheet.write_string(cell_row(row)?, col, value.as_str())?;
                        }
                    }
                }
                ColumnData::Boolean(values) => {
                    for (row, value) in values.iter().enumerate() {
                        if let Some(value) = value {
                            worksheet.write_boolean(cell_row(row)?, col, *value)?;
                        }
                    }
                }
                ColumnData::Date(values) => {
                    for (row, value) in values.iter().enumerate() {
                        if let Some(value) = value {
                            worksheet.write_datetime_with_format(
                                cell_row(row)?,
                                col,
                                value,
                                &date_format,
                            )?;
                        }
                    }
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::decode;
    use crate::table::ColumnKind;
    use chrono::NaiveDate;

    fn mixed_table() -> Result<Table> {
        let day = |d| {
            NaiveDate::from_ymd_opt(2024, 3, d)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        };
        Table::new(vec![
            Column::new("id", ColumnData::Numeric(vec![Some(1.0), Some(2.5), None])),
            Column::new(
                "name",
                ColumnData::Text(vec![Some("a, b".to_owned()), None, Some("c".to_owned())]),
            ),
            Column::new("ok", ColumnData::Boolean(vec![Some(true), Some(false), None])),
            Column::new("when", ColumnData::Date(vec![day(1), None, day(3)])),
        ])
    }

    #[test]
    fn test_csv_layout() -> Result<()> {
        let bytes = encode(&mixed_table()?, FileFormat::Csv)?;
        let text = String::from_utf8(bytes).map_err(|e| ShiftError::Other(e.to_string()))?;
        assert_eq!(
            text,
            "id,name,ok,when\n1,\"a, b\",true,2024-03-01 00:00:00\n2.5,,false,\n,c,,2024-03-03 00:00:00\n"
        );
        Ok(())
    }

    #[test]
    fn test_csv_round_trip() -> Result<()> {
        let table = mixed_table()?;
        let decoded = decode(&encode(&table, FileFormat::Csv)?, FileFormat::Csv)?;
        assert_eq!(decoded, table);
        Ok(())
    }

    #[test]
    fn test_zero_column_csv_is_an_empty_header_line() -> Result<()> {
        assert_eq!(encode(&Table::empty(3), FileFormat::Csv)?, b"\n".to_vec());
        Ok(())
    }

    #[test]
    fn test_zero_row_csv_is_header_only() -> Result<()> {
        let table = Table::new(vec![
            Column::new("a", ColumnData::Numeric(Vec::new())),
            Column::new("b", ColumnData::Text(Vec::new())),
        ])?;
        assert_eq!(encode(&table, FileFormat::Csv)?, b"a,b\n".to_vec());
        Ok(())
    }

    #[test]
    fn test_xlsx_round_trip_keeps_kinds() -> Result<()> {
        let table = mixed_table()?;
        let bytes = encode(&table, FileFormat::Xlsx)?;
        let decoded = decode(&bytes, FileFormat::Xlsx)?;

        assert_eq!(decoded.height(), 3);
        assert_eq!(
            decoded.kinds(),
            vec![
                ("id".to_owned(), ColumnKind::Numeric),
                ("name".to_owned(), ColumnKind::Text),
                ("ok".to_owned(), ColumnKind::Boolean),
                ("when".to_owned(), ColumnKind::Date),
            ]
        );
        assert_eq!(decoded, table);
        Ok(())
    }

    #[test]
    fn test_empty_tables_encode_to_valid_workbooks() -> Result<()> {
        let bytes = encode(&Table::empty(2), FileFormat::Xlsx)?;
        assert!(bytes.starts_with(b"PK"));
        assert_eq!(decode(&bytes, FileFormat::Xlsx)?.width(), 0);

        let header_only = Table::new(vec![Column::new("a", ColumnData::Numeric(Vec::new()))])?;
        let decoded = decode(&encode(&header_only, FileFormat::Xlsx)?, FileFormat::Xlsx)?;
        assert_eq!(decoded.column_names(), vec!["a"]);
        assert_eq!(decoded.height(), 0);
        Ok(())
    }

    #[test]
    fn test_xlsx_rejects_non_finite_numbers() -> Result<()> {
        let table = Table::new(vec![Column::new(
            "ratio",
            ColumnData::Numeric(vec![Some(f64::INFINITY)]),
        )])?;
        assert!(matches!(
            encode(&table, FileFormat::Xlsx),
            Err(ShiftError::Encode(_))
        ));
        Ok(())
    }

    #[test]
    fn test_export_rejects_unknown_target_before_encoding() -> Result<()> {
        let result = export(&mixed_table()?, "data.csv", "parquet", &WriteOptions::default());
        assert!(matches!(result, Err(ShiftError::UnsupportedFormat(_))));
        Ok(())
    }

    #[test]
    fn test_export_names_artifact() -> Result<()> {
        let artifact = export(&mixed_table()?, "data.csv", "Excel", &WriteOptions::default())?;
        assert_eq!(artifact.file_name, "data.xlsx");
        assert_eq!(artifact.content_type, crate::formats::XLSX_CONTENT_TYPE);
        Ok(())
    }
}
