//! Centralized error handling for datashift.
//!
//! Every stage of the per-file pipeline reports failures through a single
//! [`ShiftError`] enum, so a host UI can show one message scoped to the
//! offending file and carry on with the rest of the batch.
//!
//! ## Error Categories
//!
//! ```
//! use datashift::error::ShiftError;
//!
//! fn describe(err: &ShiftError) -> &'static str {
//!     match err {
//!         ShiftError::UnsupportedFormat(_) => "please upload a CSV or XLSX file",
//!         ShiftError::Decode(_) => "the file content is malformed",
//!         ShiftError::UnknownColumn(_) => "the selection names a missing column",
//!         ShiftError::Encode(_) => "the table cannot be written in that format",
//!         _ => "processing stopped",
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`ShiftError`]:
//!
//! ```no_run
//! use datashift::error::ResultExt as _;
//!
//! fn load_settings() -> datashift::error::Result<String> {
//!     let raw = std::fs::read_to_string("datashift.json")
//!         .context("Failed to read settings")?;
//!     Ok(raw)
//! }
//! ```
//!
//! ## Host Integration
//!
//! UI hosts usually want plain strings, so `From<ShiftError> for String` is
//! provided and `?` works inside functions returning `Result<T, String>`.

use std::fmt;

/// Main error type for datashift operations.
#[derive(Debug)]
pub enum ShiftError {
    /// File extension or requested target is not CSV/XLSX
    UnsupportedFormat(String),

    /// Bytes are not valid for the declared format
    Decode(String),

    /// Column selection references a column the table does not have
    UnknownColumn(String),

    /// The target format cannot represent the table
    Encode(String),

    /// Columns of unequal length or with clashing names
    InvalidTable(String),

    /// An action was issued in a pipeline stage that does not accept it
    InvalidTransition { stage: String, action: String },

    /// A previous stage failed; the file's pipeline accepts no more actions
    Halted(String),

    /// I/O errors (reading uploads, writing artifacts)
    Io(std::io::Error),

    /// Configuration errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for ShiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(what) => write!(
                f,
                "Unsupported file format: {what}. Please upload a CSV or Excel (.xlsx) file"
            ),
            Self::Decode(msg) => write!(f, "Failed to decode file: {msg}"),
            Self::UnknownColumn(name) => write!(f, "Unknown column: {name}"),
            Self::Encode(msg) => write!(f, "Failed to encode table: {msg}"),
            Self::InvalidTable(msg) => write!(f, "Invalid table: {msg}"),
            Self::InvalidTransition { stage, action } => {
                write!(f, "Cannot {action} while the file is {stage}")
            }
            Self::Halted(reason) => write!(f, "Processing halted after an earlier error: {reason}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ShiftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ShiftError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ShiftError {
    fn from(err: csv::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<calamine::XlsxError> for ShiftError {
    fn from(err: calamine::XlsxError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ShiftError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Encode(err.to_string())
    }
}

impl From<serde_json::Error> for ShiftError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

// Host UIs surface errors as plain strings
impl From<ShiftError> for String {
    fn from(err: ShiftError) -> Self {
        err.to_string()
    }
}

/// Result type alias for datashift operations.
pub type Result<T> = std::result::Result<T, ShiftError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ShiftError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: ShiftError = e.into();
            ShiftError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: ShiftError = e.into();
            ShiftError::Other(format!("{}: {}", f(), err))
        })
    }
}
