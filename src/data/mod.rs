//! Data module - CSV loading, cleaning and filtering

mod filter;
mod loader;
mod processor;
mod record;
mod sample;

pub use filter::RecordFilter;
pub use loader::{parse_csv, DataFormatError, DataLoader, DataSource};
pub use processor::{normalize_column_name, DataProcessor, REQUIRED_COLUMNS};
pub use record::{PatientRecord, PatientTable, UNKNOWN};
pub use sample::{generate_sample_table, SampleSettings};
