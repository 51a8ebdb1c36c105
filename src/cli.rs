use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use datashift::config::Settings;
use datashift::formats::UploadedFile;
use datashift::pipeline::{Action, BatchPlan, FilePipeline, FileReport, run_batch};
use datashift::table::Table;
use datashift::transform::{CleaningOptions, ColumnSelection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "datashift",
    version,
    about = "Clean, trim and convert CSV and Excel files"
)]
pub struct Cli {
    /// Path to a JSON settings file
    #[arg(long, global = true, env = "DATASHIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write daily rotated log files to this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show size, column kinds and a preview of each file
    Inspect {
        /// CSV or XLSX files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Clean, project and convert each file
    Convert(ConvertArgs),
}

#[derive(Args)]
pub struct ConvertArgs {
    /// CSV or XLSX files, processed in the given order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Target formats (csv, xlsx or excel)
    #[arg(long = "to", required = true, value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Remove duplicate rows
    #[arg(long)]
    pub dedup: bool,

    /// Fill missing numeric values with the column mean
    #[arg(long)]
    pub fill_mean: bool,

    /// Keep only these columns, in this order. Defaults to all columns.
    #[arg(long, value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// Print bar chart data of the numeric columns as JSON
    #[arg(long)]
    pub chart: bool,

    /// Directory for converted files
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,
}

impl ConvertArgs {
    fn plan(&self) -> BatchPlan {
        BatchPlan {
            cleaning: CleaningOptions {
                remove_duplicates: self.dedup,
                fill_missing_with_mean: self.fill_mean,
            },
            selection: self
                .columns
                .clone()
                .map_or(ColumnSelection::All, ColumnSelection::Columns),
            visualize: self.chart,
            targets: self.targets.clone(),
        }
    }
}

/// Runs a command. Returns `false` if any file failed.
pub fn run_command(command: &Commands, settings: &Settings) -> Result<bool> {
    match command {
        Commands::Inspect { files } => Ok(handle_inspect(files, settings)),
        Commands::Convert(args) => handle_convert(args, settings),
    }
}

/// Reads every path, reporting unreadable ones instead of stopping.
fn read_uploads(paths: &[PathBuf]) -> (Vec<UploadedFile>, usize) {
    let mut failed = 0;
    let uploads = paths
        .iter()
        .filter_map(|path| match UploadedFile::from_path(path) {
            Ok(file) => Some(file),
            Err(err) => {
                println!("{}: {err}", path.display());
                failed += 1;
                None
            }
        })
        .collect();
    (uploads, failed)
}

fn handle_inspect(paths: &[PathBuf], settings: &Settings) -> bool {
    let (uploads, mut failed) = read_uploads(paths);

    for file in uploads {
        let mut pipeline = FilePipeline::new(file, settings);
        println!("{}", pipeline.info().summary());

        if let Err(err) = pipeline.apply(Action::Decode) {
            println!("  Error: {err}");
            failed += 1;
            continue;
        }
        if let Some(table) = pipeline.table() {
            println!("  {} rows", table.height());
            for (name, kind) in table.kinds() {
                println!("  {name}: {kind}");
            }
        }
        if let Some(preview) = pipeline.preview() {
            println!("{}", render_table(&preview));
        }
    }
    failed == 0
}

/// Output paths already taken in this run. Inputs are claimed up front so
/// that no artifact ever replaces a file being converted.
struct OutputPaths {
    claimed: HashSet<PathBuf>,
}

impl OutputPaths {
    fn new(inputs: &[PathBuf]) -> Self {
        Self {
            claimed: inputs.iter().map(|p| resolved(p)).collect(),
        }
    }

    /// `false` if `path` is an input or was already written in this run.
    fn claim(&mut self, path: &Path) -> bool {
        self.claimed.insert(resolved(path))
    }
}

fn resolved(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn handle_convert(args: &ConvertArgs, settings: &Settings) -> Result<bool> {
    std::fs::create_dir_all(&args.out_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            args.out_dir.display()
        )
    })?;
    let out_dir = resolved(&args.out_dir);

    let plan = args.plan();
    let (uploads, unreadable) = read_uploads(&args.files);
    let report = run_batch(uploads, &plan, settings);

    let mut outputs = OutputPaths::new(&args.files);
    let mut all_written = true;
    for file in &report.files {
        all_written &= print_file_report(file, &plan, &out_dir, &mut outputs)?;
    }

    println!("{}", report.summary());
    Ok(unreadable == 0 && report.all_succeeded() && all_written)
}

/// Prints one file's outcome and writes its artifacts. Returns `false` if
/// an artifact was skipped because its path is already taken.
fn print_file_report(
    file: &FileReport,
    plan: &BatchPlan,
    out_dir: &Path,
    outputs: &mut OutputPaths,
) -> Result<bool> {
    println!("{}", file.info.summary());

    if let Some(cleaning) = &file.cleaning {
        for message in cleaning.messages(&plan.cleaning) {
            println!("  {message}");
        }
    }
    if let Some(preview) = &file.preview {
        println!("{}", render_table(preview));
    }
    if plan.visualize {
        match &file.chart {
            Some(chart) => println!("{}", serde_json::to_string_pretty(chart)?),
            None if file.succeeded() => println!("  No numeric columns to chart"),
            None => {}
        }
    }

    let mut all_written = true;
    for artifact in &file.artifacts {
        let path = out_dir.join(&artifact.file_name);
        if !outputs.claim(&path) {
            tracing::warn!(path = %path.display(), "Refusing to overwrite");
            println!(
                "  Error: {} is an input or another file's output, not written",
                path.display()
            );
            all_written = false;
            continue;
        }
        std::fs::write(&path, &artifact.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  Wrote {} ({})", path.display(), artifact.content_type);
    }
    if let Some(error) = &file.error {
        println!("  Error: {error}");
    }
    Ok(all_written)
}

/// Plain-text grid: a header line followed by one line per row.
pub fn render_table(table: &Table) -> String {
    let rows: Vec<Vec<String>> = std::iter::once(table.column_names())
        .chain((0..table.height()).map(|row| table.render_row(row)))
        .collect();

    let mut widths = vec![0; table.width()];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect();
            format!("  {}", cells.join(" | ").trim_end())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
