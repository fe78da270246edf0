//! CSV table sink

use crate::normalize::{Cell, NormalizedTable};
use csv::{ReaderBuilder, Writer};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult, TableSink};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Writes tables as UTF-8 CSV: header row, then one line per row
#[derive(Debug, Clone, Copy)]
pub struct CsvTableSink {
    buffer_size: usize,
}

impl Default for CsvTableSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvTableSink {
    /// Create a sink with the default buffer size
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// Create a sink with a custom write buffer size in bytes
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self { buffer_size }
    }
}

impl TableSink for CsvTableSink {
    fn save(&self, table: &NormalizedTable, path: &Path) -> OutputResult<()> {
        debug!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    OutputError::IoError(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        // File::create truncates: every run replaces the previous output
        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;
        let mut writer = Writer::from_writer(BufWriter::with_capacity(self.buffer_size, file));

        writer
            .write_record(table.columns())
            .map_err(|e| OutputError::CsvError(format!("Failed to write header: {}", e)))?;

        for row in table.rows() {
            writer
                .write_record(row.iter().map(Cell::to_string))
                .map_err(|e| OutputError::CsvError(format!("Failed to write row: {}", e)))?;
        }

        writer
            .flush()
            .map_err(|e| OutputError::IoError(format!("Failed to flush: {}", e)))?;

        let buf_writer = writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {}", e)))?;
        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {}", e)))?;
        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;

        info!("Data saved successfully to {} ({} rows)", path.display(), table.len());
        Ok(())
    }
}

/// Read a CSV written by [`CsvTableSink`] back into a table.
///
/// Cells come back as text; empty fields come back as nulls.
pub fn read_table<P: AsRef<Path>>(path: P) -> OutputResult<NormalizedTable> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| OutputError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| OutputError::CsvError(format!("Failed to read header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| OutputError::CsvError(format!("Failed to read row: {}", e)))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Null
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    NormalizedTable::from_rows(columns, rows).map_err(|e| OutputError::CsvError(e.to_string()))
}
