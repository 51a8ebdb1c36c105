//! Non-interactive driver: applies one plan to every file of a batch.

use super::executor::{FileInfo, FilePipeline, StepOutput};
use super::state::{Action, Stage};
use crate::config::Settings;
use crate::error::Result;
use crate::formats::{ExportArtifact, UploadedFile};
use crate::table::Table;
use crate::transform::{BarChart, CleaningOptions, CleaningReport, ColumnSelection};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// The choices a user would otherwise make per file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchPlan {
    pub cleaning: CleaningOptions,
    pub selection: ColumnSelection,
    pub visualize: bool,
    /// Conversion targets, each producing one artifact
    pub targets: Vec<String>,
}

/// Outcome for a single file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub info: FileInfo,
    /// Last stage reached
    pub stage: Stage,
    /// Preview of the table as it was when processing stopped
    pub preview: Option<Table>,
    pub cleaning: Option<CleaningReport>,
    pub chart: Option<BarChart>,
    pub artifacts: Vec<ExportArtifact>,
    pub error: Option<String>,
}

impl FileReport {
    fn new(info: FileInfo) -> Self {
        Self {
            info,
            stage: Stage::Received,
            preview: None,
            cleaning: None,
            chart: None,
            artifacts: Vec::new(),
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One report per file, in upload order
    pub files: Vec<FileReport>,
    pub duration: Duration,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.files.iter().all(FileReport::succeeded)
    }

    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| !f.succeeded()).count()
    }

    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "All files processed successfully ({} files, {:.2}s)",
                self.files.len(),
                self.duration.as_secs_f64()
            )
        } else {
            format!(
                "{} of {} files failed ({:.2}s)",
                self.failed_count(),
                self.files.len(),
                self.duration.as_secs_f64()
            )
        }
    }
}

/// Processes files one at a time in upload order. A failing file is
/// recorded in its report and the batch moves on.
pub fn run_batch(files: Vec<UploadedFile>, plan: &BatchPlan, settings: &Settings) -> BatchReport {
    let start = Instant::now();
    let files: Vec<FileReport> = files
        .into_iter()
        .map(|file| run_file(file, plan, settings))
        .collect();

    let report = BatchReport {
        files,
        duration: start.elapsed(),
    };
    tracing::info!(
        files = report.files.len(),
        failed = report.failed_count(),
        "Batch finished"
    );
    report
}

fn run_file(file: UploadedFile, plan: &BatchPlan, settings: &Settings) -> FileReport {
    let mut pipeline = FilePipeline::new(file, settings);
    let mut report = FileReport::new(pipeline.info());

    if let Err(err) = drive(&mut pipeline, plan, &mut report) {
        tracing::warn!(file = %report.info.name, error = %err, "File failed");
        report.error = Some(err.to_string());
    }
    report.stage = pipeline.stage();
    report.preview = pipeline.preview();
    report
}

fn drive(pipeline: &mut FilePipeline, plan: &BatchPlan, report: &mut FileReport) -> Result<()> {
    pipeline.apply(Action::Decode)?;

    if !plan.cleaning.is_noop()
        && let StepOutput::Cleaned { report: cleaning, .. } =
            pipeline.apply(Action::Clean(plan.cleaning))?
    {
        report.cleaning = Some(cleaning);
    }

    pipeline.apply(Action::Select(plan.selection.clone()))?;

    if plan.visualize
        && let StepOutput::Visualized(chart) = pipeline.apply(Action::Visualize)?
    {
        report.chart = chart;
    }

    for target in &plan.targets {
        if let StepOutput::Converted(artifact) = pipeline.apply(Action::Convert(target.clone()))? {
            report.artifacts.push(artifact);
        }
    }

    pipeline.apply(Action::Finish)?;
    Ok(())
}
