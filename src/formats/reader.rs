use super::{FileFormat, UploadedFile};
use crate::error::{Result, ShiftError};
use crate::table::Table;
use crate::table::inference::{RawCell, build_column, normalize_headers};
use calamine::{Data, DataType as _, Reader, Xlsx};
use std::io::Cursor;

/// Cell contents treated as missing, in addition to blank cells.
pub const DEFAULT_MISSING_MARKERS: [&str; 10] = [
    "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>",
];

#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Cell texts that decode to an absent cell (compared exactly)
    pub missing_markers: Vec<String>,
    /// CSV field delimiter
    pub delimiter: u8,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            missing_markers: DEFAULT_MISSING_MARKERS
                .iter()
                .map(|m| (*m).to_owned())
                .collect(),
            delimiter: b',',
        }
    }
}

impl ReadOptions {
    fn text_cell(&self, text: &str) -> RawCell {
        // Exact matches only: a whitespace-only cell is data
        if text.is_empty() || self.missing_markers.iter().any(|m| m == text) {
            RawCell::Missing
        } else {
            RawCell::Text(text.to_owned())
        }
    }
}

/// Decodes bytes of a known format with default options.
///
/// # Errors
///
/// Returns [`ShiftError::Decode`] if the bytes are not valid for `format`.
pub fn decode(bytes: &[u8], format: FileFormat) -> Result<Table> {
    decode_with(bytes, format, &ReadOptions::default())
}

/// # Errors
///
/// Returns [`ShiftError::Decode`] if the bytes are not valid for `format`.
pub fn decode_with(bytes: &[u8], format: FileFormat, options: &ReadOptions) -> Result<Table> {
    let table = match format {
        FileFormat::Csv => read_csv(bytes, options),
        FileFormat::Xlsx => read_xlsx(bytes, options),
    }?;
    tracing::info!(
        format = %format,
        rows = table.height(),
        columns = table.width(),
        "Decoded table"
    );
    Ok(table)
}

/// Decodes an upload, deriving the format from its name.
///
/// # Errors
///
/// Returns [`ShiftError::UnsupportedFormat`] for an unrecognised extension
/// and [`ShiftError::Decode`] for malformed content.
pub fn decode_file(file: &UploadedFile, options: &ReadOptions) -> Result<Table> {
    let format = file.format()?;
    decode_with(file.bytes(), format, options)
}

fn read_csv(bytes: &[u8], options: &ReadOptions) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    if headers.is_empty() {
        return Err(ShiftError::Decode("no columns to parse from file".to_owned()));
    }
    let width = headers.len();

    let mut cells: Vec<Vec<RawCell>> = vec![Vec::new(); width];
    let mut height = 0;
    for record in reader.records() {
        let record = record?;
        if record.len() > width {
            let line = record.position().map_or(height + 2, |p| p.line() as usize);
            return Err(ShiftError::Decode(format!(
                "expected {width} fields in line {line}, saw {}",
                record.len()
            )));
        }
        // Short rows are padded with absent cells
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(
                record
                    .get(idx)
                    .map_or(RawCell::Missing, |field| options.text_cell(field)),
            );
        }
        height += 1;
    }

    assemble(&headers, &cells, height)
}

fn read_xlsx(bytes: &[u8], options: &ReadOptions) -> Result<Table> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ShiftError::Decode("workbook has no worksheets".to_owned()))??;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Table::empty(0));
    };
    let headers: Vec<String> = header_row.iter().map(header_text).collect();
    let width = headers.len();

    let mut cells: Vec<Vec<RawCell>> = vec![Vec::new(); width];
    let mut height = 0;
    for row in rows {
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(
                row.get(idx)
                    .map_or(RawCell::Missing, |cell| xlsx_cell(cell, options)),
            );
        }
        height += 1;
    }

    assemble(&headers, &cells, height)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(v) => crate::table::format_number(*v),
        other => other.to_string(),
    }
}

fn xlsx_cell(cell: &Data, options: &ReadOptions) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Missing,
        Data::Int(v) => RawCell::Number(*v as f64),
        Data::Float(v) if v.is_nan() => RawCell::Missing,
        Data::Float(v) => RawCell::Number(*v),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::String(s) => options.text_cell(s),
        other => other
            .as_datetime()
            .map_or_else(|| options.text_cell(&other.to_string()), RawCell::Date),
    }
}

fn assemble(headers: &[String], cells: &[Vec<RawCell>], height: usize) -> Result<Table> {
    let names = normalize_headers(headers);
    let columns = names
        .iter()
        .zip(cells)
        .map(|(name, column_cells)| build_column(name.as_str(), column_cells))
        .collect();
    Table::with_height(columns, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnData, ColumnKind};

    #[test]
    fn test_csv_kinds_and_missing_cells() -> Result<()> {
        let csv = b"id,name,active\n1,alice,true\n,bob,false\n3,NA,\n";
        let table = decode(csv, FileFormat::Csv)?;

        assert_eq!(table.height(), 3);
        assert_eq!(
            table.kinds(),
            vec![
                ("id".to_owned(), ColumnKind::Numeric),
                ("name".to_owned(), ColumnKind::Text),
                ("active".to_owned(), ColumnKind::Boolean),
            ]
        );
        assert_eq!(
            table.column("id").map(|c| c.data().clone()),
            Some(ColumnData::Numeric(vec![Some(1.0), None, Some(3.0)]))
        );
        assert_eq!(table.column("name").map(|c| c.data().null_count()), Some(1));
        Ok(())
    }

    #[test]
    fn test_csv_short_rows_are_padded() -> Result<()> {
        let table = decode(b"a,b,c\n1,2\n", FileFormat::Csv)?;
        assert_eq!(table.height(), 1);
        assert_eq!(table.column("c").map(|c| c.data().null_count()), Some(1));
        Ok(())
    }

    #[test]
    fn test_whitespace_cells_are_kept_as_text() -> Result<()> {
        let table = decode(b"a,b\n1, \n2,x\n", FileFormat::Csv)?;
        assert_eq!(
            table.column("b").map(|c| c.data().clone()),
            Some(ColumnData::Text(vec![Some(" ".to_owned()), Some("x".to_owned())]))
        );
        assert_eq!(table.column("a").map(|c| c.kind()), Some(ColumnKind::Numeric));
        Ok(())
    }

    #[test]
    fn test_csv_long_rows_fail() {
        let result = decode(b"a,b\n1,2,3\n", FileFormat::Csv);
        assert!(matches!(result, Err(ShiftError::Decode(_))));
    }

    #[test]
    fn test_csv_without_header_fails() {
        assert!(matches!(
            decode(b"", FileFormat::Csv),
            Err(ShiftError::Decode(_))
        ));
    }

    #[test]
    fn test_csv_invalid_utf8_fails() {
        let result = decode(b"name\n\xff\xfe\n", FileFormat::Csv);
        assert!(matches!(result, Err(ShiftError::Decode(_))));
    }

    #[test]
    fn test_csv_header_only() -> Result<()> {
        let table = decode(b"a,b\n", FileFormat::Csv)?;
        assert_eq!(table.height(), 0);
        assert_eq!(table.column_names(), vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_custom_delimiter_and_markers() -> Result<()> {
        let options = ReadOptions {
            missing_markers: vec!["-".to_owned()],
            delimiter: b';',
        };
        let table = decode_with(b"x;y\n-;NA\n2;b\n", FileFormat::Csv, &options)?;
        assert_eq!(table.column("x").map(|c| c.kind()), Some(ColumnKind::Numeric));
        // "NA" is ordinary text once the marker list is replaced
        assert_eq!(
            table.column("y").map(|c| c.data().clone()),
            Some(ColumnData::Text(vec![Some("NA".to_owned()), Some("b".to_owned())]))
        );
        Ok(())
    }

    #[test]
    fn test_garbage_xlsx_fails_to_decode() {
        let result = decode(b"this is not a zip archive", FileFormat::Xlsx);
        assert!(matches!(result, Err(ShiftError::Decode(_))));
    }

    #[test]
    fn test_decode_file_checks_extension() {
        let file = UploadedFile::new("data.json", b"{}".to_vec());
        assert!(matches!(
            decode_file(&file, &ReadOptions::default()),
            Err(ShiftError::UnsupportedFormat(_))
        ));
    }
}
