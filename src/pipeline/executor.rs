//! Runs one file through its stages.

use super::state::{Action, Stage};
use crate::config::Settings;
use crate::error::{Result, ShiftError};
use crate::formats::reader::decode_file;
use crate::formats::writer::export;
use crate::formats::{ExportArtifact, ReadOptions, UploadedFile, WriteOptions};
use crate::table::Table;
use crate::transform::{BarChart, CleaningReport, apply_cleaning, bar_chart};
use serde::Serialize;

/// Name and size of an upload, shown before any processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size_bytes: usize,
    pub size_kb: f64,
}

impl FileInfo {
    pub fn summary(&self) -> String {
        format!("{} ({:.2} KB)", self.name, self.size_kb)
    }
}

/// What a successful step produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Decoded { preview: Table },
    Cleaned { report: CleaningReport, preview: Table },
    Projected { preview: Table },
    /// `None` when the table has no numeric column to chart
    Visualized(Option<BarChart>),
    Converted(ExportArtifact),
    Finished,
}

/// Processing state of a single uploaded file.
#[derive(Debug)]
pub struct FilePipeline {
    file: UploadedFile,
    read_options: ReadOptions,
    write_options: WriteOptions,
    preview_rows: usize,
    stage: Stage,
    table: Option<Table>,
    failure: Option<String>,
}

impl FilePipeline {
    pub fn new(file: UploadedFile, settings: &Settings) -> Self {
        tracing::debug!(file = %file.name(), bytes = file.size(), "File received");
        Self {
            file,
            read_options: settings.read_options(),
            write_options: settings.write_options(),
            preview_rows: settings.preview_rows,
            stage: Stage::Received,
            table: None,
            failure: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            name: self.file.name().to_owned(),
            size_bytes: self.file.size(),
            size_kb: self.file.size_kb(),
        }
    }

    /// Current working table, once decoded.
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// First rows of the current table.
    pub fn preview(&self) -> Option<Table> {
        self.table.as_ref().map(|t| t.head(self.preview_rows))
    }

    /// Message of the error that stopped this file, if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Runs one action.
    ///
    /// An action that is not allowed in the current stage fails with
    /// [`ShiftError::InvalidTransition`] and changes nothing. An action that
    /// fails while running moves the pipeline to [`Stage::Failed`], after
    /// which every action fails with [`ShiftError::Halted`].
    ///
    /// # Errors
    ///
    /// Returns the error of the failed stage, or one of the above.
    pub fn apply(&mut self, action: Action) -> Result<StepOutput> {
        if let Some(reason) = &self.failure {
            return Err(ShiftError::Halted(reason.clone()));
        }
        let Some(next) = self.stage.next(&action) else {
            return Err(ShiftError::InvalidTransition {
                stage: self.stage.to_string(),
                action: action.name().to_owned(),
            });
        };

        match self.run(action) {
            Ok(output) => {
                tracing::info!(
                    file = %self.file.name(),
                    from = %self.stage,
                    to = %next,
                    "Stage complete"
                );
                self.stage = next;
                Ok(output)
            }
            Err(err) => {
                tracing::warn!(
                    file = %self.file.name(),
                    stage = %self.stage,
                    error = %err,
                    "Stage failed"
                );
                self.stage = Stage::Failed;
                self.failure = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn run(&mut self, action: Action) -> Result<StepOutput> {
        match action {
            Action::Decode => {
                let table = decode_file(&self.file, &self.read_options)?;
                let preview = table.head(self.preview_rows);
                self.table = Some(table);
                Ok(StepOutput::Decoded { preview })
            }
            Action::Clean(options) => {
                let (table, report) = apply_cleaning(self.take_table()?, &options);
                let preview = table.head(self.preview_rows);
                self.table = Some(table);
                Ok(StepOutput::Cleaned { report, preview })
            }
            Action::Select(selection) => {
                // Validate first so a bad selection keeps the current table
                selection.check(self.current()?)?;
                let table = selection.apply(self.take_table()?)?;
                let preview = table.head(self.preview_rows);
                self.table = Some(table);
                Ok(StepOutput::Projected { preview })
            }
            Action::Visualize => Ok(StepOutput::Visualized(bar_chart(self.current()?))),
            Action::Convert(target) => {
                let artifact = export(
                    self.current()?,
                    self.file.name(),
                    &target,
                    &self.write_options,
                )?;
                Ok(StepOutput::Converted(artifact))
            }
            Action::Finish => Ok(StepOutput::Finished),
        }
    }

    fn current(&self) -> Result<&Table> {
        self.table
            .as_ref()
            .ok_or_else(|| ShiftError::Other("no table has been decoded".to_owned()))
    }

    fn take_table(&mut self) -> Result<Table> {
        self.table
            .take()
            .ok_or_else(|| ShiftError::Other("no table has been decoded".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::unwrap_used,
        clippy::panic,
        clippy::expect_used,
        clippy::indexing_slicing
    )]
    use super::*;
    use crate::formats::XLSX_CONTENT_TYPE;
    use crate::transform::{CleaningOptions, ColumnSelection};

    fn pipeline(name: &str, content: &str) -> FilePipeline {
        FilePipeline::new(
            UploadedFile::new(name, content.as_bytes().to_vec()),
            &Settings::default(),
        )
    }

    fn select(names: &[&str]) -> Action {
        Action::Select(ColumnSelection::Columns(
            names.iter().map(|n| (*n).to_owned()).collect(),
        ))
    }

    #[test]
    fn test_full_run() -> Result<()> {
        let mut p = pipeline("people.csv", "id,name\n1,a\n1,a\n,\n");
        p.apply(Action::Decode)?;

        let StepOutput::Cleaned { report, preview } = p.apply(Action::Clean(CleaningOptions {
            remove_duplicates: true,
            fill_missing_with_mean: true,
        }))?
        else {
            panic!("expected cleaning output");
        };
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(preview.height(), 2);

        p.apply(select(&["id"]))?;
        assert!(matches!(p.apply(Action::Visualize)?, StepOutput::Visualized(Some(_))));

        let StepOutput::Converted(artifact) = p.apply(Action::Convert("excel".to_owned()))? else {
            panic!("expected artifact");
        };
        assert_eq!(artifact.file_name, "people.xlsx");
        assert_eq!(artifact.content_type, XLSX_CONTENT_TYPE);

        let StepOutput::Converted(artifact) = p.apply(Action::Convert("csv".to_owned()))? else {
            panic!("expected artifact");
        };
        assert_eq!(artifact.bytes, b"id\n1\n1\n".to_vec());

        p.apply(Action::Finish)?;
        assert_eq!(p.stage(), Stage::Done);
        Ok(())
    }

    #[test]
    fn test_invalid_transition_keeps_stage() {
        let mut p = pipeline("a.csv", "x\n1\n");
        let result = p.apply(Action::Convert("csv".to_owned()));
        assert!(matches!(result, Err(ShiftError::InvalidTransition { .. })));
        assert_eq!(p.stage(), Stage::Received);
        assert!(p.failure().is_none());
    }

    #[test]
    fn test_failure_halts_the_file() {
        let mut p = pipeline("notes.txt", "hello");
        assert!(matches!(
            p.apply(Action::Decode),
            Err(ShiftError::UnsupportedFormat(_))
        ));
        assert_eq!(p.stage(), Stage::Failed);
        assert!(matches!(p.apply(Action::Decode), Err(ShiftError::Halted(_))));
        assert!(matches!(p.apply(Action::Finish), Err(ShiftError::Halted(_))));
    }

    #[test]
    fn test_unknown_column_fails_the_file() -> Result<()> {
        let mut p = pipeline("a.csv", "x,y\n1,2\n");
        p.apply(Action::Decode)?;
        assert!(matches!(
            p.apply(select(&["z"])),
            Err(ShiftError::UnknownColumn(_))
        ));
        assert_eq!(p.stage(), Stage::Failed);
        assert_eq!(p.table().map(Table::column_names), Some(vec!["x".to_owned(), "y".to_owned()]));
        assert_eq!(p.preview().map(|t| t.height()), Some(1));
        Ok(())
    }

    #[test]
    fn test_unsupported_target_produces_nothing() -> Result<()> {
        let mut p = pipeline("a.csv", "x\n1\n");
        p.apply(Action::Decode)?;
        p.apply(Action::Select(ColumnSelection::All))?;
        assert!(matches!(
            p.apply(Action::Convert("parquet".to_owned())),
            Err(ShiftError::UnsupportedFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn test_preview_is_limited() -> Result<()> {
        let rows: String = (0..20).map(|i| format!("{i}\n")).collect();
        let mut p = pipeline("n.csv", &format!("n\n{rows}"));
        assert!(p.preview().is_none());

        let StepOutput::Decoded { preview } = p.apply(Action::Decode)? else {
            panic!("expected decode output");
        };
        assert_eq!(preview.height(), 5);
        assert_eq!(p.table().map(Table::height), Some(20));
        Ok(())
    }

    #[test]
    fn test_info_reports_size() {
        let p = pipeline("data.csv", &"a".repeat(2048));
        let info = p.info();
        assert_eq!(info.size_bytes, 2048);
        assert_eq!(info.summary(), "data.csv (2.00 KB)");
    }
}
