//! Per-file processing as an explicit state machine.
//!
//! Every uploaded file gets its own [`FilePipeline`]. A host (the CLI, or any
//! interactive front end) drives it with discrete [`Action`]s, and each action
//! runs exactly one stage to completion:
//!
//! ```text
//! Received -> Decoded -> (Cleaned)* -> Projected -> (Visualized | Converted)* -> Done
//! ```
//!
//! A failed stage moves the pipeline to [`Stage::Failed`] and every later
//! action is refused. Pipelines share nothing, so one bad file never affects
//! another in the same batch.
//!
//! # Example
//!
//! ```no_run
//! use datashift::config::Settings;
//! use datashift::formats::UploadedFile;
//! use datashift::pipeline::{Action, FilePipeline};
//! use datashift::transform::{CleaningOptions, ColumnSelection};
//!
//! let file = UploadedFile::new("sales.csv", b"id,amount\n1,10\n1,10\n2,\n".to_vec());
//! let mut pipeline = FilePipeline::new(file, &Settings::default());
//!
//! pipeline.apply(Action::Decode)?;
//! pipeline.apply(Action::Clean(CleaningOptions {
//!     remove_duplicates: true,
//!     fill_missing_with_mean: true,
//! }))?;
//! pipeline.apply(Action::Select(ColumnSelection::All))?;
//! pipeline.apply(Action::Convert("xlsx".to_owned()))?;
//! pipeline.apply(Action::Finish)?;
//! # Ok::<(), datashift::error::ShiftError>(())
//! ```

pub mod batch;
pub mod executor;
pub mod state;

pub use batch::{BatchPlan, BatchReport, FileReport, run_batch};
pub use executor::{FileInfo, FilePipeline, StepOutput};
pub use state::{Action, Stage};
