//! Structured progress events emitted by the pipeline.
//!
//! One event per attempt, file, and table outcome, so observers other
//! than the console (tests, metrics glue) can follow a run without
//! scraping log output.

use crate::domain::entities::{FetchStatus, TableRef};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    RunStarted {
        table_count: usize,
    },
    TableStarted {
        table: TableRef,
        position: usize,
        total: usize,
    },
    /// One failed try inside the retry loop.
    AttemptFailed {
        label: String,
        attempt: u32,
        max_attempts: u32,
        error: String,
    },
    FileSaved {
        table: String,
        index: usize,
        rows: u64,
        path: PathBuf,
    },
    FileSkipped {
        table: String,
        index: usize,
        error: String,
    },
    TableFinished {
        table: TableRef,
        status: FetchStatus,
    },
}
