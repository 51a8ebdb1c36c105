//! Supported file formats, uploaded payloads and export artifacts.
//!
//! The format tag of an upload is derived from its file name extension
//! (case-insensitive). Conversion targets are named by the user, either by
//! extension (`csv`, `xlsx`) or by the label shown in the UI (`CSV`, `Excel`).

pub mod reader;
pub mod writer;

pub use reader::{ReadOptions, decode, decode_with};
pub use writer::{WriteOptions, encode, encode_with};

use crate::error::{Result, ResultExt as _, ShiftError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// Canonical extension, including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => ".csv",
            Self::Xlsx => ".xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => CSV_CONTENT_TYPE,
            Self::Xlsx => XLSX_CONTENT_TYPE,
        }
    }

    /// Label used by the conversion choice in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Xlsx => "Excel",
        }
    }

    /// Infers the format tag from a file name.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftError::UnsupportedFormat`] for any extension other
    /// than `.csv` or `.xlsx`.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "" => Err(ShiftError::UnsupportedFormat(format!(
                "'{name}' has no file extension"
            ))),
            _ => Err(ShiftError::UnsupportedFormat(format!(".{ext}"))),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for FileFormat {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            _ => Err(ShiftError::UnsupportedFormat(format!("'{s}'"))),
        }
    }
}

/// A file handed over by the upload collaborator. Never mutated.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a file from disk, keeping only its file name.
    ///
    /// # Errors
    ///
    /// Returns an error naming the path if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }

    /// # Errors
    ///
    /// See [`FileFormat::from_file_name`].
    pub fn format(&self) -> Result<FileFormat> {
        FileFormat::from_file_name(&self.name)
    }
}

/// Output of one conversion action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn new(original_name: &str, format: FileFormat, bytes: Vec<u8>) -> Self {
        Self {
            file_name: converted_file_name(original_name, format),
            content_type: format.content_type(),
            bytes,
        }
    }
}

/// Replaces the final extension of `name` with the target's extension.
pub fn converted_file_name(name: &str, format: FileFormat) -> String {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => name.get(..idx).unwrap_or(name),
        _ => name,
    };
    format!("{stem}{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_file_name_ignores_case() -> Result<()> {
        assert_eq!(FileFormat::from_file_name("sales.CSV")?, FileFormat::Csv);
        assert_eq!(FileFormat::from_file_name("q1.report.xlsx")?, FileFormat::Xlsx);
        Ok(())
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        assert!(matches!(
            FileFormat::from_file_name("notes.txt"),
            Err(ShiftError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            FileFormat::from_file_name("README"),
            Err(ShiftError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_target_names() -> Result<()> {
        assert_eq!("CSV".parse::<FileFormat>()?, FileFormat::Csv);
        assert_eq!("Excel".parse::<FileFormat>()?, FileFormat::Xlsx);
        assert_eq!(".xlsx".parse::<FileFormat>()?, FileFormat::Xlsx);
        assert!("parquet".parse::<FileFormat>().is_err());
        Ok(())
    }

    #[test]
    fn test_converted_file_name_replaces_only_last_extension() {
        assert_eq!(
            converted_file_name("data.csv.backup.csv", FileFormat::Xlsx),
            "data.csv.backup.xlsx"
        );
        assert_eq!(converted_file_name("data", FileFormat::Csv), "data.csv");
        assert_eq!(converted_file_name(".hidden", FileFormat::Csv), ".hidden.csv");
    }

    #[test]
    fn test_artifact_content_type() {
        let artifact = ExportArtifact::new("report.csv", FileFormat::Xlsx, vec![1, 2]);
        assert_eq!(artifact.file_name, "report.xlsx");
        assert_eq!(artifact.content_type, XLSX_CONTENT_TYPE);
    }

    #[test]
    fn test_size_kb() {
        let file = UploadedFile::new("a.csv", vec![0; 2048]);
        assert_eq!(file.size(), 2048);
        assert!((file.size_kb() - 2.0).abs() < f64::EPSILON);
    }
}
