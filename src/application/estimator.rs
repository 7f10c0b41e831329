//! Pre-flight size estimation: sums remote file sizes without
//! downloading anything, so the operator can approve a large transfer
//! before it starts.

use crate::domain::entities::TableRef;
use crate::ports::catalog_port::CatalogPort;
use log::debug;

/// Estimated remote size of one table, in bytes.
///
/// Resolves the triple against the catalog listing (linear scan; table
/// counts are tens, not millions) and sums the file sizes. Estimation is
/// best-effort by policy: a missing table or any remote failure yields 0
/// rather than aborting the run, understating the total at worst.
pub fn estimate_table_size(catalog: &dyn CatalogPort, table: &TableRef) -> u64 {
    let listed = match catalog.list_all_tables() {
        Ok(tables) => tables,
        Err(e) => {
            debug!("size estimation for {table}: listing failed ({e}), assuming 0");
            return 0;
        }
    };
    if !listed.iter().any(|t| t == table) {
        debug!("size estimation for {table}: not in catalog, assuming 0");
        return 0;
    }
    match catalog.list_files_in_table(table) {
        Ok(files) => files.iter().map(|f| f.size).sum(),
        Err(e) => {
            debug!("size estimation for {table}: file listing failed ({e}), assuming 0");
            0
        }
    }
}

/// Human-readable rendering of a byte count, e.g. `3.25 MB`.
pub fn format_bytes(num_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = num_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{FileDescriptor, TableData};
    use crate::domain::errors::{ErrorKind, FetchError, Result};
    use bytes::Bytes;

    struct StaticCatalog {
        tables: Vec<TableRef>,
        files: Vec<FileDescriptor>,
        fail_file_listing: bool,
    }

    impl CatalogPort for StaticCatalog {
        fn list_all_tables(&self) -> Result<Vec<TableRef>> {
            Ok(self.tables.clone())
        }
        fn list_files_in_table(&self, _table: &TableRef) -> Result<Vec<FileDescriptor>> {
            if self.fail_file_listing {
                Err(FetchError::catalog(ErrorKind::Network, "timed out"))
            } else {
                Ok(self.files.clone())
            }
        }
        fn fetch_file(&self, _file: &FileDescriptor) -> Result<Bytes> {
            unreachable!("estimation never downloads")
        }
        fn load_table(&self, _table: &TableRef) -> Result<TableData> {
            unreachable!("estimation never downloads")
        }
    }

    fn table() -> TableRef {
        TableRef::new("share", "schema", "orders")
    }

    #[test]
    fn test_sums_file_sizes() {
        let catalog = StaticCatalog {
            tables: vec![table()],
            files: vec![
                FileDescriptor { url: "https://example/a".into(), size: 1000 },
                FileDescriptor { url: "https://example/b".into(), size: 24 },
            ],
            fail_file_listing: false,
        };
        assert_eq!(estimate_table_size(&catalog, &table()), 1024);
    }

    #[test]
    fn test_unknown_table_is_zero() {
        let catalog = StaticCatalog {
            tables: vec![TableRef::new("share", "schema", "other")],
            files: vec![],
            fail_file_listing: false,
        };
        assert_eq!(estimate_table_size(&catalog, &table()), 0);
    }

    #[test]
    fn test_listing_failure_is_zero() {
        let catalog = StaticCatalog {
            tables: vec![table()],
            files: vec![],
            fail_file_listing: true,
        };
        assert_eq!(estimate_table_size(&catalog, &table()), 0);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1023), "1023.00 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
