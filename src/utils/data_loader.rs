//! Data loading utilities

use crate::error::{ListingsError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

/// Number of rows polars samples to infer the CSV schema
const INFER_SCHEMA_LENGTH: usize = 1000;

const SEPARATOR: u8 = b',';

/// CSV loader for listing sources
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self
    }

    /// Load a CSV file with a header row.
    ///
    /// Empty fields become nulls. Any failure to open or parse the file is
    /// reported as [`ListingsError::SourceUnavailable`].
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let start = Instant::now();

        let file = File::open(path).map_err(|e| ListingsError::source_unavailable(&display, e))?;

        let parse_opts = CsvParseOptions::default().with_separator(SEPARATOR);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_LENGTH))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| ListingsError::source_unavailable(&display, e))?;

        tracing::info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded listings source"
        );

        Ok(df)
    }

    /// Get file info without loading the full data
    pub fn get_file_info(&self, path: impl AsRef<Path>) -> Result<FileInfo> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let metadata =
            std::fs::metadata(path).map_err(|e| ListingsError::source_unavailable(&display, e))?;

        let file = File::open(path).map_err(|e| ListingsError::source_unavailable(&display, e))?;
        let mut lines = BufReader::new(file).lines();

        let header = lines
            .next()
            .transpose()
            .map_err(|e| ListingsError::source_unavailable(&display, e))?
            .unwrap_or_default();

        let separator = SEPARATOR as char;
        let columns: Vec<String> = header
            .split(separator)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Counts physical lines; quoted fields with embedded newlines inflate it.
        let n_rows = lines.count();

        Ok(FileInfo {
            path: display,
            file_size: metadata.len(),
            n_rows,
            columns,
        })
    }
}

/// File information gathered from a quick scan
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: String,
    pub file_size: u64,
    pub n_rows: usize,
    pub columns: Vec<String>,
}

/// Writes normalized frames back to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(|e| ListingsError::DataError(e.to_string()))
    }
}
