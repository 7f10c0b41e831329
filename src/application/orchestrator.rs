//! The core application logic that drives one fetch run.
//!
//! This module coordinates the catalog port, the retrying fetcher, the
//! streaming file processor, and the aggregator:
//! `ListTables → [Sample] → [EstimateSizes → Confirm] →
//! ForEachTable{ Fetch → Process → Aggregate → Record }`.
//!
//! Tables are processed strictly one after another, in catalog-listing
//! order. A table's failure is recorded and the loop moves on; only a
//! failure to list the catalog at all aborts the run.

use crate::application::aggregator::aggregate;
use crate::application::estimator::{estimate_table_size, format_bytes};
use crate::application::file_processor::process_file;
use crate::application::retry::{fetch_with_retry, RetryPolicy};
use crate::config::AppConfig;
use crate::domain::entities::{FetchMode, FetchOutcome, RunSummary, TableData, TableRef};
use crate::domain::errors::{FetchError, Result};
use crate::domain::events::FetchEvent;
use crate::ports::catalog_port::CatalogPort;
use crate::ports::event_port::EventSink;
use crate::ports::prompt_port::OperatorPrompt;
use chrono::Local;
use log::{error, info, warn};
use parquet::arrow::ArrowWriter;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

/// Subdirectory of the output dir holding per-file CSV exports.
pub const CSV_EXPORT_SUBDIR: &str = "delta_sharing_exports_csv";

/// Orchestrates the end-to-end fetch of every shared table.
pub struct FetchOrchestrator {
    catalog: Arc<dyn CatalogPort>,
    events: Arc<dyn EventSink>,
    prompt: Arc<dyn OperatorPrompt>,
    config: AppConfig,
}

impl FetchOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        events: Arc<dyn EventSink>,
        prompt: Arc<dyn OperatorPrompt>,
        config: AppConfig,
    ) -> Self {
        Self {
            catalog,
            events,
            prompt,
            config,
        }
    }

    /// Entry point for a full run. Returns the summary of every table's
    /// outcome; `Err` only when the catalog itself is unreachable or the
    /// output directory cannot be created.
    pub fn run(&self) -> Result<RunSummary> {
        let tables = self.catalog.list_all_tables()?;
        self.events.emit(&FetchEvent::RunStarted {
            table_count: tables.len(),
        });
        info!("Found {} tables to fetch", tables.len());
        for t in &tables {
            info!("  - {t}");
        }

        let mut summary = RunSummary::default();
        if tables.is_empty() {
            warn!("No tables available from the sharing endpoint.");
            return Ok(summary);
        }

        fs::create_dir_all(&self.config.fetch.output_dir)?;

        if self.config.fetch.sample_first() {
            self.fetch_sample(&tables[0]);
        }

        if self.config.fetch.preflight() && !self.confirm_estimates(&tables) {
            info!("Aborting full fetch per operator choice.");
            return Ok(summary);
        }

        let mode = self.config.fetch.mode();
        info!("Fetching {} tables in {mode} mode", tables.len());

        for (i, table) in tables.iter().enumerate() {
            self.events.emit(&FetchEvent::TableStarted {
                table: table.clone(),
                position: i + 1,
                total: tables.len(),
            });
            info!("[{}/{}] Processing {table}", i + 1, tables.len());

            let outcome = match self.fetch_table(table, mode) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Table {table} failed: {e}");
                    FetchOutcome::failure(table.clone(), e.to_string())
                }
            };
            self.events.emit(&FetchEvent::TableFinished {
                table: table.clone(),
                status: outcome.status,
            });
            summary.record(outcome);

            if i + 1 < tables.len() {
                std::thread::sleep(self.config.fetch.table_pause());
            }
        }

        Ok(summary)
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.fetch.max_retries(),
            base_delay: self.config.fetch.retry_delay(),
        }
    }

    fn fetch_table(&self, table: &TableRef, mode: FetchMode) -> Result<FetchOutcome> {
        match mode {
            FetchMode::WholeTable => self.fetch_whole_table(table),
            FetchMode::PerFile => self.fetch_per_file(table),
        }
    }

    /// Whole-table mode: one retry-wrapped synchronous load, then a
    /// timestamped Parquet snapshot.
    fn fetch_whole_table(&self, table: &TableRef) -> Result<FetchOutcome> {
        let policy = self.retry_policy();
        let label = format!("load {table}");
        let data = fetch_with_retry(&label, &policy, self.events.as_ref(), || {
            self.catalog.load_table(table)
        })?;

        if data.is_empty() {
            warn!("Fetched empty table: {table}");
            return Ok(FetchOutcome::empty(table.clone()));
        }

        let path = self.write_snapshot(&table.name, &data)?;
        info!(
            "Saved {table} ({} rows, {} columns) -> {}",
            data.num_rows(),
            data.num_columns(),
            path.display()
        );
        Ok(FetchOutcome::success(
            table.clone(),
            data.num_rows(),
            data.column_names(),
            vec![path],
        ))
    }

    /// Per-file mode: retry-wrapped listing + streaming conversion of
    /// each partition, then lazy aggregation into one combined CSV.
    /// Individual file failures are swallowed inside the processor.
    fn fetch_per_file(&self, table: &TableRef) -> Result<FetchOutcome> {
        let dest_dir = PathBuf::from(&self.config.fetch.output_dir)
            .join(CSV_EXPORT_SUBDIR)
            .join(&table.name);
        fs::create_dir_all(&dest_dir)?;

        let policy = self.retry_policy();
        let label = format!("process files of {table}");
        let saved = fetch_with_retry(&label, &policy, self.events.as_ref(), || {
            let files = self.catalog.list_files_in_table(table)?;
            info!("Found {} files for {table}", files.len());
            let mut saved = Vec::new();
            for (i, file) in files.iter().enumerate() {
                if let Some(part) = process_file(
                    self.catalog.as_ref(),
                    file,
                    &table.name,
                    &dest_dir,
                    i + 1,
                    self.events.as_ref(),
                ) {
                    saved.push(part);
                }
            }
            Ok(saved)
        })?;

        // Only the files written during this run feed the combined
        // output; stale parts from earlier runs do not count.
        let part_paths: Vec<PathBuf> = saved.into_iter().map(|(path, _)| path).collect();
        let Some(lazy) = aggregate(&part_paths, &dest_dir, &table.name)? else {
            warn!("No files were successfully processed for {table}");
            return Ok(FetchOutcome::empty(table.clone()));
        };

        let columns = lazy.columns().to_vec();
        match lazy.preview(self.config.fetch.preview_rows()) {
            Ok(preview) => {
                info!("Sample rows for {table}:");
                for row in preview {
                    info!("  {row:?}");
                }
            }
            Err(e) => warn!("Preview failed for {table}: {e}"),
        }
        let (combined, rows) = lazy.write_combined()?;

        let mut output_paths = part_paths;
        output_paths.push(combined);
        Ok(FetchOutcome::success(
            table.clone(),
            rows,
            columns,
            output_paths,
        ))
    }

    /// Writes one decoded table as `<output_dir>/<prefix><name>_<ts>.parquet`.
    fn write_snapshot_with_prefix(
        &self,
        prefix: &str,
        name: &str,
        data: &TableData,
    ) -> Result<PathBuf> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = PathBuf::from(&self.config.fetch.output_dir)
            .join(format!("{prefix}{name}_{timestamp}.parquet"));

        let file = File::create(&path)?;
        let mut writer = ArrowWriter::try_new(file, data.schema.clone(), None)
            .map_err(|e| FetchError::Snapshot(e.to_string()))?;
        for batch in &data.batches {
            writer
                .write(batch)
                .map_err(|e| FetchError::Snapshot(e.to_string()))?;
        }
        writer
            .close()
            .map_err(|e| FetchError::Snapshot(e.to_string()))?;
        Ok(path)
    }

    fn write_snapshot(&self, name: &str, data: &TableData) -> Result<PathBuf> {
        self.write_snapshot_with_prefix("", name, data)
    }

    /// Single-table test fetch before committing to the full run. Its
    /// output survives even when the operator later declines pre-flight.
    fn fetch_sample(&self, table: &TableRef) {
        info!("Testing single table fetch with {table}");
        let policy = self.retry_policy();
        let result = fetch_with_retry(
            &format!("sample {table}"),
            &policy,
            self.events.as_ref(),
            || self.catalog.load_table(table),
        )
        .and_then(|data| {
            let path = self.write_snapshot_with_prefix("sample_", &table.name, &data)?;
            info!(
                "Sample saved -> {} (shape: {} x {}, columns: {:?})",
                path.display(),
                data.num_rows(),
                data.num_columns(),
                data.column_names()
            );
            Ok(())
        });
        if let Err(e) = result {
            warn!("Single table test failed for {table}: {e}");
        }
    }

    /// Pre-flight estimation: per-table and total remote sizes, then an
    /// explicit yes/no from the operator. Estimation failures contribute
    /// zero and never block the prompt.
    fn confirm_estimates(&self, tables: &[TableRef]) -> bool {
        info!("Estimating remote sizes (no data download)...");
        let mut total: u64 = 0;
        for table in tables {
            let size = estimate_table_size(self.catalog.as_ref(), table);
            total += size;
            info!("  - {table}: {}", format_bytes(size));
        }
        info!("Estimated total size: {}", format_bytes(total));

        self.prompt.confirm(&format!(
            "Proceed with full fetch of {} tables (~{})? [y/N]: ",
            tables.len(),
            format_bytes(total)
        ))
    }
}
