//! Table writers

use crate::normalize::NormalizedTable;
use std::path::Path;

pub mod csv;

pub use self::csv::{read_table, CsvTableSink};

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write or read error
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Durable persistence of a normalized table
pub trait TableSink: Send + Sync {
    /// Write `table` to `path`, replacing any existing file
    fn save(&self, table: &NormalizedTable, path: &Path) -> OutputResult<()>;
}
