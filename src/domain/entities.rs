//! # Domain Entities
//!
//! The "Nouns" of the fetch pipeline: table identities, remote file
//! descriptors, decoded table data, and per-table outcomes. `serde`
//! derives let outcomes flow straight into the JSON run report.

use crate::domain::errors::{FetchError, Result};
use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identity of one shared dataset: the `share.schema.table` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub share: String,
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(share: impl Into<String>, schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            share: share.into(),
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.share, self.schema, self.name)
    }
}

/// One physical remote partition of a table.
///
/// The URL is typically a time-limited signed URL, so a descriptor is
/// only valid within the run that listed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub url: String,
    pub size: u64,
}

/// How a table is fetched and persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    /// Load the whole table into memory, save one Parquet snapshot.
    WholeTable,
    /// Stream file by file into part CSVs, then concatenate.
    PerFile,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::WholeTable => write!(f, "whole-table"),
            FetchMode::PerFile => write!(f, "per-file"),
        }
    }
}

/// A fully decoded in-memory table: Arrow schema plus record batches.
#[derive(Debug, Clone)]
pub struct TableData {
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

impl TableData {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// Decodes a columnar binary (Parquet) buffer into record batches.
    pub fn from_parquet_bytes(data: Bytes) -> Result<Self> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(data)
            .map_err(|e| FetchError::Decode(format!("unreadable parquet: {e}")))?;
        let schema = builder.schema().clone();
        let reader = builder
            .build()
            .map_err(|e| FetchError::Decode(format!("parquet reader: {e}")))?;
        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| FetchError::Decode(format!("parquet batch: {e}")))?;
        Ok(Self { schema, batches })
    }

    pub fn num_rows(&self) -> u64 {
        self.batches.iter().map(|b| b.num_rows() as u64).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }
}

/// Terminal state of one table's processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchStatus {
    Success,
    /// The remote listing succeeded but yielded no rows or no usable files.
    EmptyResult,
    Failed,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStatus::Success => write!(f, "SUCCESS"),
            FetchStatus::EmptyResult => write!(f, "EMPTY"),
            FetchStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// The "Report Card" for one table: created once when the table's
/// processing completes and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub table: TableRef,
    pub status: FetchStatus,
    /// Rows persisted locally, when known.
    pub rows: Option<u64>,
    pub columns: Vec<String>,
    pub error: Option<String>,
    /// Local files written for this table, in write order.
    pub output_paths: Vec<PathBuf>,
}

impl FetchOutcome {
    pub fn success(table: TableRef, rows: u64, columns: Vec<String>, output_paths: Vec<PathBuf>) -> Self {
        Self {
            table,
            status: FetchStatus::Success,
            rows: Some(rows),
            columns,
            error: None,
            output_paths,
        }
    }

    pub fn empty(table: TableRef) -> Self {
        Self {
            table,
            status: FetchStatus::EmptyResult,
            rows: Some(0),
            columns: Vec::new(),
            error: None,
            output_paths: Vec::new(),
        }
    }

    pub fn failure(table: TableRef, error: String) -> Self {
        Self {
            table,
            status: FetchStatus::Failed,
            rows: None,
            columns: Vec::new(),
            error: Some(error),
            output_paths: Vec::new(),
        }
    }
}

/// All outcomes of one run, in catalog-listing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcomes: Vec<FetchOutcome>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: FetchOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == FetchStatus::Success)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == FetchStatus::Failed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_display() {
        let t = TableRef::new("payments_prod", "tables", "payments_item_summary");
        assert_eq!(t.to_string(), "payments_prod.tables.payments_item_summary");
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        summary.record(FetchOutcome::success(
            TableRef::new("s", "sc", "a"),
            100,
            vec!["c1".into()],
            vec![PathBuf::from("a.parquet")],
        ));
        summary.record(FetchOutcome::failure(
            TableRef::new("s", "sc", "b"),
            "HTTP 401".into(),
        ));
        summary.record(FetchOutcome::empty(TableRef::new("s", "sc", "c")));

        assert_eq!(summary.attempted(), 3);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
    }

    #[test]
    fn test_outcome_serializes_status_tag() {
        let outcome = FetchOutcome::failure(TableRef::new("s", "sc", "t"), "boom".into());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["table"]["name"], "t");
    }
}
