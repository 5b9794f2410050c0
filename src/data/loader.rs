//! CSV Data Loader Module
//! Handles CSV loading using Polars and the sample-data fallback.

use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::processor::DataProcessor;
use super::record::PatientTable;
use super::sample::{generate_sample_table, SampleSettings};

#[derive(Error, Debug)]
pub enum DataFormatError {
    #[error("No data supplied")]
    Empty,
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Failed to generate sample data: {0}")]
    Sample(#[from] rand::distr::weighted::Error),
    #[error("Missing required column '{column}'")]
    MissingColumn { column: String },
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the current table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Upload,
    Sample { rows: usize, seed: u64 },
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Upload => write!(f, "uploaded data"),
            DataSource::Sample { rows, seed } => {
                write!(f, "sample dataset ({} rows, seed {})", rows, seed)
            }
        }
    }
}

/// Holds the table for one analysis session. Every successful load replaces
/// the previous table.
#[derive(Default)]
pub struct DataLoader {
    table: Option<PatientTable>,
    source: Option<DataSource>,
}

impl DataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw CSV bytes (an upload) into a cleaned table.
    pub fn load_bytes(&mut self, bytes: Vec<u8>) -> Result<&PatientTable, DataFormatError> {
        let table = parse_csv(bytes)?;
        Ok(self.replace(table, DataSource::Upload))
    }

    /// Load a CSV file from disk.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&PatientTable, DataFormatError> {
        let bytes = std::fs::read(file_path).map_err(|source| DataFormatError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        let table = parse_csv(bytes)?;
        Ok(self.replace(table, DataSource::File(file_path.to_path_buf())))
    }

    /// Replace the current table with the generated sample dataset.
    pub fn load_sample(&mut self, settings: &SampleSettings) -> Result<&PatientTable, DataFormatError> {
        let table = generate_sample_table(settings)?;
        Ok(self.replace(
            table,
            DataSource::Sample {
                rows: settings.rows,
                seed: settings.seed,
            },
        ))
    }

    /// Load the given file, or fall back to sample data when none is given.
    pub fn load_or_sample(
        &mut self,
        file_path: Option<&Path>,
        settings: &SampleSettings,
    ) -> Result<&PatientTable, DataFormatError> {
        match file_path {
            Some(path) => self.load_csv(path),
            None => self.load_sample(settings),
        }
    }

    /// Get list of column names of the loaded table.
    pub fn columns(&self) -> Vec<String> {
        self.table
            .as_ref()
            .map(|t| t.columns().to_vec())
            .unwrap_or_default()
    }

    pub fn row_count(&self) -> usize {
        self.table.as_ref().map(|t| t.len()).unwrap_or(0)
    }

    pub fn table(&self) -> Option<&PatientTable> {
        self.table.as_ref()
    }

    pub fn source(&self) -> Option<&DataSource> {
        self.source.as_ref()
    }

    /// Drop the current table, ending the session.
    pub fn clear(&mut self) {
        self.table = None;
        self.source = None;
    }

    fn replace(&mut self, table: PatientTable, source: DataSource) -> &PatientTable {
        log::info!(
            "Loaded {} rows, {} columns from {}",
            table.len(),
            table.columns().len(),
            source
        );
        self.source = Some(source);
        self.table.insert(table)
    }
}

/// Parse CSV bytes into a cleaned table. Every column is read as text and
/// coerced afterwards so that bad cells become missing values instead of
/// failing the whole file.
pub fn parse_csv(bytes: Vec<u8>) -> Result<PatientTable, DataFormatError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(DataFormatError::Empty);
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    DataProcessor::clean(&df)
}
