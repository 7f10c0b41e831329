//! Final run reporting: a console summary the operator can triage from
//! without re-running verbosely, plus a timestamped JSON report on disk.
//!
//! The reporter is a pure read of the [`RunSummary`]; it has no side
//! effects beyond output.

use crate::domain::entities::{FetchStatus, RunSummary};
use crate::domain::errors::{FetchError, Result};
use crate::domain::events::FetchEvent;
use crate::ports::event_port::EventSink;
use log::{info, warn};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Maximum length of an error message in reports.
const ERROR_PREVIEW_LEN: usize = 100;

/// Console subscriber for the pipeline's event stream, backed by `log`.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &FetchEvent) {
        match event {
            FetchEvent::RunStarted { table_count } => {
                info!("Run started: {table_count} tables listed");
            }
            FetchEvent::TableStarted {
                table,
                position,
                total,
            } => {
                info!("[{position}/{total}] {table}");
            }
            FetchEvent::AttemptFailed {
                label,
                attempt,
                max_attempts,
                error,
            } => {
                warn!(
                    "{label}: attempt {attempt}/{max_attempts} failed: {}",
                    truncate(error, ERROR_PREVIEW_LEN)
                );
            }
            FetchEvent::FileSaved {
                table,
                index,
                rows,
                path,
            } => {
                info!("{table}: file {index} saved ({rows} rows) -> {}", path.display());
            }
            FetchEvent::FileSkipped { table, index, error } => {
                warn!(
                    "{table}: file {index} skipped: {}",
                    truncate(error, ERROR_PREVIEW_LEN)
                );
            }
            FetchEvent::TableFinished { table, status } => {
                info!("{table}: {status}");
            }
        }
    }
}

pub struct RunReporter;

impl RunReporter {
    /// Prints the final summary: counts, per-failure errors (truncated),
    /// and a short shape/columns preview for each success.
    pub fn print_summary(summary: &RunSummary) {
        println!();
        println!("==== Fetch Summary ====");
        println!("  Attempted: {}", summary.attempted());
        println!("  Succeeded: {}", summary.succeeded());
        println!("  Failed:    {}", summary.failed());

        let failures: Vec<_> = summary
            .outcomes
            .iter()
            .filter(|o| o.status == FetchStatus::Failed)
            .collect();
        if !failures.is_empty() {
            println!();
            println!("Failed tables:");
            for outcome in failures {
                let error = outcome.error.as_deref().unwrap_or("unknown error");
                println!("  - {}: {}", outcome.table, truncate(error, ERROR_PREVIEW_LEN));
            }
        }

        let successes: Vec<_> = summary
            .outcomes
            .iter()
            .filter(|o| o.status == FetchStatus::Success)
            .collect();
        if !successes.is_empty() {
            println!();
            println!("Data preview:");
            for outcome in successes {
                println!(
                    "  {} (shape: {} x {})",
                    outcome.table,
                    outcome.rows.unwrap_or(0),
                    outcome.columns.len()
                );
                println!("    Columns: {:?}", outcome.columns);
            }
        }
        println!("=======================");
    }

    /// Writes `report_<timestamp>.json` next to the fetched data, with
    /// the same summary plus full per-table details.
    pub fn write_json_report(summary: &RunSummary, output_dir: &Path) -> Result<PathBuf> {
        let report = json!({
            "summary": {
                "attempted": summary.attempted(),
                "succeeded": summary.succeeded(),
                "failed": summary.failed(),
            },
            "details": summary.outcomes,
        });

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = output_dir.join(format!("report_{timestamp}.json"));

        std::fs::create_dir_all(output_dir)?;
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, &report)
            .map_err(|e| FetchError::Snapshot(e.to_string()))?;
        Ok(path)
    }
}

/// Clips a message to `max_len` characters for display, marking the cut.
pub fn truncate(message: &str, max_len: usize) -> String {
    match message.char_indices().nth(max_len) {
        None => message.to_string(),
        Some((cut, _)) => format!("{}...", &message[..cut]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{FetchOutcome, TableRef};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 100), "short");
        let long = "x".repeat(150);
        let clipped = truncate(&long, 100);
        assert_eq!(clipped.len(), 103);
        assert!(clipped.ends_with("..."));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        // 100 chars but 200 bytes: must pass through untouched.
        let wide = "é".repeat(100);
        assert_eq!(truncate(&wide, 100), wide);

        let long = "é".repeat(150);
        let clipped = truncate(&long, 100);
        assert!(clipped.ends_with("..."));
        assert_eq!(clipped.chars().count(), 103);
    }

    #[test]
    fn test_json_report_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut summary = RunSummary::default();
        summary.record(FetchOutcome::success(
            TableRef::new("s", "sc", "a"),
            100,
            vec!["c1".into(), "c2".into()],
            vec![],
        ));
        summary.record(FetchOutcome::failure(
            TableRef::new("s", "sc", "b"),
            "HTTP 401".into(),
        ));

        let path = RunReporter::write_json_report(&summary, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("report_") && name.ends_with(".json"));

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["summary"]["attempted"], 2);
        assert_eq!(parsed["summary"]["succeeded"], 1);
        assert_eq!(parsed["summary"]["failed"], 1);
        assert_eq!(parsed["details"][1]["error"], "HTTP 401");
    }
}
