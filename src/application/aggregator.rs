//! Combines the part CSVs of one table into a single logical view.
//!
//! The view is lazy: building it only reads the first header, previews
//! read just enough rows, and the full read happens when the combined
//! file is written.

use crate::domain::errors::{FetchError, Result};
use chrono::Local;
use log::info;
use std::path::{Path, PathBuf};

/// Lazy handle over the part CSVs written for one table during this run.
pub struct LazyTable {
    table_name: String,
    dest_dir: PathBuf,
    parts: Vec<PathBuf>,
    columns: Vec<String>,
}

/// Builds the lazy view over `parts`, the part files this run actually
/// produced, in part-index order. Stale parts left on disk by earlier
/// runs are never picked up. Returns `Ok(None)` when no file survived
/// processing; a part whose header cannot be read is an error.
pub fn aggregate(parts: &[PathBuf], dest_dir: &Path, table_name: &str) -> Result<Option<LazyTable>> {
    if parts.is_empty() {
        return Ok(None);
    }
    let mut parts = parts.to_vec();
    parts.sort();

    let columns = read_header(&parts[0])?;
    Ok(Some(LazyTable {
        table_name: table_name.to_string(),
        dest_dir: dest_dir.to_path_buf(),
        parts,
        columns,
    }))
}

fn read_header(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?;
    Ok(headers.iter().map(|h| h.to_string()).collect())
}

impl LazyTable {
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Reads at most `limit` data rows across the parts, stopping as soon
    /// as the bound is reached; later parts stay untouched.
    pub fn preview(&self, limit: usize) -> Result<Vec<Vec<String>>> {
        let mut rows = Vec::new();
        for part in &self.parts {
            if rows.len() >= limit {
                break;
            }
            let mut reader = csv::Reader::from_path(part)?;
            for record in reader.records() {
                let record = record?;
                rows.push(record.iter().map(|v| v.to_string()).collect());
                if rows.len() >= limit {
                    break;
                }
            }
        }
        Ok(rows)
    }

    /// Serializes the logical view into one combined CSV. This is the
    /// point where every part actually gets read, streaming part by part
    /// with the header written once. Returns the path and total row count.
    pub fn write_combined(&self) -> Result<(PathBuf, u64)> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .dest_dir
            .join(format!("{}_combined_{}.csv", self.table_name, timestamp));

        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(&self.columns)?;

        let mut rows: u64 = 0;
        for part in &self.parts {
            let mut reader = csv::Reader::from_path(part)?;
            let headers = reader.headers()?.clone();
            if headers.len() != self.columns.len() {
                return Err(FetchError::Aggregation(format!(
                    "part {} has {} columns, expected {}",
                    part.display(),
                    headers.len(),
                    self.columns.len()
                )));
            }
            for record in reader.records() {
                wtr.write_record(&record?)?;
                rows += 1;
            }
        }
        wtr.flush()?;
        info!(
            "combined {} parts into {} ({} rows)",
            self.parts.len(),
            path.display(),
            rows
        );
        Ok((path, rows))
    }
}
