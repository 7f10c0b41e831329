//! # Catalog Port
//!
//! The contract for the remote data-sharing catalog. The pipeline never
//! talks to the network directly; it asks this port to enumerate tables,
//! enumerate the physical files behind a table, and hand back bytes.
//!
//! Any struct implementing `CatalogPort` can drive the orchestrator: the
//! REST adapter in production, a mock in tests.

use crate::domain::entities::{FileDescriptor, TableData, TableRef};
use crate::domain::errors::Result;
use bytes::Bytes;

pub trait CatalogPort: Send + Sync {
    /// Enumerates every `(share, schema, table)` triple visible to the
    /// credential profile, in provider order.
    fn list_all_tables(&self) -> Result<Vec<TableRef>>;

    /// Enumerates the remote file descriptors backing one table, in
    /// provider order. URLs are time-limited signed URLs.
    fn list_files_in_table(&self, table: &TableRef) -> Result<Vec<FileDescriptor>>;

    /// Downloads one remote file into memory.
    fn fetch_file(&self, file: &FileDescriptor) -> Result<Bytes>;

    /// Loads a whole table into memory in one synchronous call.
    fn load_table(&self, table: &TableRef) -> Result<TableData>;
}
