use crate::error::{Result, ShiftError};
use crate::formats::reader::DEFAULT_MISSING_MARKERS;
use crate::formats::{ReadOptions, WriteOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Characters a worksheet name may not contain.
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
const MAX_SHEET_NAME_LEN: usize = 31;

/// Runtime settings. Read once at startup and never written back, so every
/// invocation starts from the same state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Rows shown in the preview after each step
    pub preview_rows: usize,
    /// Cell texts treated as absent when decoding
    pub missing_markers: Vec<String>,
    pub csv_delimiter: char,
    /// Worksheet name used for XLSX output
    pub sheet_name: String,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Directory for daily log files. Console only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            missing_markers: DEFAULT_MISSING_MARKERS.map(str::to_owned).to_vec(),
            csv_delimiter: ',',
            sheet_name: "Sheet1".to_owned(),
            log_level: "info".to_owned(),
            log_dir: None,
        }
    }
}

/// Location of the optional settings file: `<config dir>/datashift/settings.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("datashift").join("settings.json"))
}

impl Settings {
    /// Loads settings from a JSON file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftError::Config`] if the file cannot be read, is not
    /// valid JSON, or holds invalid values.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShiftError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Loads `path` when given, otherwise the default settings file if one
    /// exists, otherwise the built-in defaults.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::load`].
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// # Errors
    ///
    /// Returns [`ShiftError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if !self.csv_delimiter.is_ascii() || self.csv_delimiter == '"' {
            return Err(ShiftError::Config(format!(
                "csv_delimiter must be a single ASCII character other than '\"', got {:?}",
                self.csv_delimiter
            )));
        }
        if self.sheet_name.is_empty() || self.sheet_name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(ShiftError::Config(format!(
                "sheet_name must be 1 to {MAX_SHEET_NAME_LEN} characters"
            )));
        }
        if let Some(c) = self.sheet_name.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
            return Err(ShiftError::Config(format!(
                "sheet_name may not contain '{c}'"
            )));
        }
        Ok(())
    }

    fn delimiter(&self) -> u8 {
        u8::try_from(self.csv_delimiter).unwrap_or(b',')
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            missing_markers: self.missing_markers.clone(),
            delimiter: self.delimiter(),
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            delimiter: self.delimiter(),
            sheet_name: self.sheet_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_json(content: &str) -> anyhow::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(content.as_bytes())?;
        Ok(file)
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.preview_rows, 5);
        assert_eq!(settings.sheet_name, "Sheet1");
        assert!(settings.missing_markers.iter().any(|m| m == "NA"));
        assert_eq!(settings.read_options().delimiter, b',');
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() -> anyhow::Result<()> {
        let file = write_json(r#"{ "preview_rows": 10, "csv_delimiter": ";" }"#)?;
        let settings = Settings::load(file.path())?;
        assert_eq!(settings.preview_rows, 10);
        assert_eq!(settings.write_options().delimiter, b';');
        assert_eq!(settings.log_level, "info");
        Ok(())
    }

    #[test]
    fn test_invalid_json_is_a_config_error() -> anyhow::Result<()> {
        let file = write_json("{ not json")?;
        assert!(matches!(
            Settings::load(file.path()),
            Err(ShiftError::Config(_))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let result = Settings::load(Path::new("/definitely/not/here/settings.json"));
        assert!(matches!(result, Err(ShiftError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_sheet_names() {
        let mut settings = Settings::default();
        settings.sheet_name = "a/b".to_owned();
        assert!(settings.validate().is_err());
        settings.sheet_name = "x".repeat(32);
        assert!(settings.validate().is_err());
        settings.sheet_name = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        let settings = Settings {
            csv_delimiter: 'é',
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ShiftError::Config(_))));
    }
}
