//! Health Dash - Hospital patient records analysis
//!
//! Loads a CSV of patient records (or a generated sample dataset), cleans it
//! into a typed table and computes the aggregates behind the dashboard
//! charts: outcomes by age, admissions over time and satisfaction by
//! department.

pub mod charts;
pub mod config;
pub mod data;
pub mod stats;

pub use config::{AnalysisSettings, SettingsError};
pub use data::{DataFormatError, DataLoader, PatientRecord, PatientTable, RecordFilter};
pub use stats::{HealthAnalyzer, Period};
