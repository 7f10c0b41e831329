//! Streaming file processor: one remote Parquet partition in, one local
//! part CSV out.
//!
//! Files are handled strictly one at a time. The downloaded buffer and
//! the decoded batches drop before the next file starts, so peak memory
//! is bounded by a single file's decoded size regardless of table size.

use crate::domain::entities::{FileDescriptor, TableData};
use crate::domain::errors::Result;
use crate::domain::events::FetchEvent;
use crate::ports::catalog_port::CatalogPort;
use crate::ports::event_port::EventSink;
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pause after each file, smoothing burst load on the remote service.
const INTER_FILE_PAUSE: Duration = Duration::from_millis(200);

/// Downloads, decodes, and persists one remote file as
/// `<dest_dir>/<table>_part_<index:02>.csv`.
///
/// `index` is the file's 1-based position in the remote listing, so part
/// names keep the listing order even when earlier files failed. Any
/// failure is logged and reported as `None`: one bad partition never
/// aborts its table.
pub fn process_file(
    catalog: &dyn CatalogPort,
    file: &FileDescriptor,
    table_name: &str,
    dest_dir: &Path,
    index: usize,
    events: &dyn EventSink,
) -> Option<(PathBuf, u64)> {
    let path = dest_dir.join(format!("{table_name}_part_{index:02}.csv"));

    let result = (|| -> Result<u64> {
        let payload = catalog.fetch_file(file)?;
        let data = TableData::from_parquet_bytes(payload)?;
        write_csv(&data, &path)
    })();

    let saved = match result {
        Ok(rows) => {
            info!(
                "saved {} ({} rows) for table {}",
                path.display(),
                rows,
                table_name
            );
            events.emit(&FetchEvent::FileSaved {
                table: table_name.to_string(),
                index,
                rows,
                path: path.clone(),
            });
            Some((path, rows))
        }
        Err(e) => {
            error!("file {index} of table {table_name} failed, skipping: {e}");
            events.emit(&FetchEvent::FileSkipped {
                table: table_name.to_string(),
                index,
                error: e.to_string(),
            });
            None
        }
    };

    std::thread::sleep(INTER_FILE_PAUSE);
    saved
}

/// Writes decoded table data to a row-oriented CSV file, header first.
/// Returns the number of data rows written.
pub fn write_csv(data: &TableData, path: &Path) -> Result<u64> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(data.column_names())?;

    let options = FormatOptions::default();
    let mut rows: u64 = 0;
    for batch in &data.batches {
        let formatters = batch
            .columns()
            .iter()
            .map(|c| ArrayFormatter::try_new(c.as_ref(), &options))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| crate::domain::errors::FetchError::Decode(e.to_string()))?;

        for row in 0..batch.num_rows() {
            let record: Vec<String> = formatters.iter().map(|f| f.value(row).to_string()).collect();
            wtr.write_record(&record)?;
            rows += 1;
        }
    }
    wtr.flush()?;
    Ok(rows)
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_parquet_bytes;
    use super::*;
    use crate::domain::entities::{TableData, TableRef};
    use crate::domain::errors::{ErrorKind, FetchError, Result};
    use crate::ports::event_port::NullSink;
    use bytes::Bytes;

    struct FileCatalog {
        good: Bytes,
        failing_url: String,
    }

    impl crate::ports::catalog_port::CatalogPort for FileCatalog {
        fn list_all_tables(&self) -> Result<Vec<TableRef>> {
            Ok(vec![])
        }
        fn list_files_in_table(&self, _table: &TableRef) -> Result<Vec<crate::domain::entities::FileDescriptor>> {
            Ok(vec![])
        }
        fn fetch_file(&self, file: &FileDescriptor) -> Result<Bytes> {
            if file.url == self.failing_url {
                Err(FetchError::catalog(ErrorKind::NotFound, "signed URL expired"))
            } else {
                Ok(self.good.clone())
            }
        }
        fn load_table(&self, _table: &TableRef) -> Result<TableData> {
            unreachable!()
        }
    }

    #[test]
    fn test_process_file_writes_part_csv() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FileCatalog {
            good: sample_parquet_bytes(&[1, 2, 3]),
            failing_url: String::new(),
        };
        let file = FileDescriptor {
            url: "https://example/part-0".into(),
            size: 10,
        };

        let (path, rows) =
            process_file(&catalog, &file, "orders", dir.path(), 1, &NullSink).unwrap();
        assert_eq!(rows, 3);
        assert!(path.ends_with("orders_part_01.csv"));

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("id,label"));
        assert_eq!(lines.next(), Some("1,row-1"));
    }

    #[test]
    fn test_failed_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FileCatalog {
            good: sample_parquet_bytes(&[1]),
            failing_url: "https://example/expired".into(),
        };
        let file = FileDescriptor {
            url: "https://example/expired".into(),
            size: 10,
        };

        let saved = process_file(&catalog, &file, "orders", dir.path(), 2, &NullSink);
        assert!(saved.is_none());
        assert!(!dir.path().join("orders_part_02.csv").exists());
    }

    #[test]
    fn test_malformed_payload_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FileCatalog {
            good: Bytes::from_static(b"this is not parquet"),
            failing_url: String::new(),
        };
        let file = FileDescriptor {
            url: "https://example/garbage".into(),
            size: 19,
        };

        let saved = process_file(&catalog, &file, "orders", dir.path(), 1, &NullSink);
        assert!(saved.is_none());
    }

    #[test]
    fn test_mixed_files_produce_parts_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FileCatalog {
            good: sample_parquet_bytes(&[7]),
            failing_url: "https://example/f2".into(),
        };
        let files = [
            FileDescriptor { url: "https://example/f1".into(), size: 1 },
            FileDescriptor { url: "https://example/f2".into(), size: 1 },
            FileDescriptor { url: "https://example/f3".into(), size: 1 },
        ];

        let saved: Vec<_> = files
            .iter()
            .enumerate()
            .filter_map(|(i, f)| process_file(&catalog, f, "orders", dir.path(), i + 1, &NullSink))
            .collect();

        assert_eq!(saved.len(), 2);
        assert!(saved[0].0.ends_with("orders_part_01.csv"));
        assert!(saved[1].0.ends_with("orders_part_03.csv"));
        assert!(!dir.path().join("orders_part_02.csv").exists());
    }
}
