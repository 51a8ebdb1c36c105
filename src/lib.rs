//! # Datashift - CSV and Excel Cleaning Pipeline
//!
//! Datashift takes uploaded CSV or XLSX files through a fixed sequence of
//! steps: decode into a typed [`table::Table`], optionally clean it, pick the
//! columns to keep, chart the numeric ones, and convert the result to CSV or
//! XLSX.
//!
//! ## Quick Start
//!
//! ```no_run
//! use datashift::formats::{FileFormat, decode, encode};
//! use datashift::transform::{fill_missing_with_mean, project, remove_duplicates};
//!
//! let table = decode(b"id,name\n1,a\n1,a\n,\n", FileFormat::Csv)?;
//! let table = fill_missing_with_mean(remove_duplicates(table));
//! let table = project(table, &["id"])?;
//! let xlsx = encode(&table, FileFormat::Xlsx)?;
//! # Ok::<(), datashift::error::ShiftError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`table`]: Tabular model and column-kind inference
//! - [`formats`]: Format detection, decoding and encoding
//! - [`transform`]: Cleaning, column projection and chart aggregation
//! - [`pipeline`]: Per-file state machine and batch driver
//! - [`config`]: Read-only settings
//! - [`error`]: Error types and handling utilities
//! - [`logging`]: Tracing subscriber setup
//!
//! Each stage takes a table and returns a new one, so stages can be used and
//! tested on their own without going through a [`pipeline::FilePipeline`].

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod formats;
pub mod logging;
pub mod pipeline;
pub mod table;
pub mod transform;
