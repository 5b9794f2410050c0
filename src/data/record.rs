//! Patient Record Module
//! Typed rows and the immutable table the analyzer reads from.

use chrono::NaiveDate;
use serde::Serialize;

use super::filter::RecordFilter;

/// Label used when a categorical value is missing.
pub const UNKNOWN: &str = "Unknown";

/// One cleaned row of the patient records file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    pub patient_id: Option<String>,
    pub age: Option<i64>,
    pub admission_date: Option<NaiveDate>,
    pub discharge_date: Option<NaiveDate>,
    pub outcome: Option<String>,
    pub gender: String,
    pub department: String,
    pub satisfaction_score: Option<f64>,
    pub diagnosis: Option<String>,
}

impl Default for PatientRecord {
    fn default() -> Self {
        Self {
            patient_id: None,
            age: None,
            admission_date: None,
            discharge_date: None,
            outcome: None,
            gender: UNKNOWN.to_string(),
            department: UNKNOWN.to_string(),
            satisfaction_score: None,
            diagnosis: None,
        }
    }
}

impl PatientRecord {
    /// Days between admission and discharge, when both dates are known.
    pub fn length_of_stay(&self) -> Option<i64> {
        match (self.admission_date, self.discharge_date) {
            (Some(admitted), Some(discharged)) => Some((discharged - admitted).num_days()),
            _ => None,
        }
    }
}

/// Loaded patient table. Never mutated after construction; a new load
/// replaces it wholesale.
#[derive(Debug, Clone, Default)]
pub struct PatientTable {
    records: Vec<PatientRecord>,
    columns: Vec<String>,
}

impl PatientTable {
    pub fn new(records: Vec<PatientRecord>, columns: Vec<String>) -> Self {
        Self { records, columns }
    }

    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    /// Normalized column names of the source file.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatientRecord> {
        self.records.iter()
    }

    /// Sorted distinct departments.
    pub fn departments(&self) -> Vec<String> {
        Self::distinct(self.records.iter().map(|r| r.department.as_str()))
    }

    /// Sorted distinct genders.
    pub fn genders(&self) -> Vec<String> {
        Self::distinct(self.records.iter().map(|r| r.gender.as_str()))
    }

    /// Smallest and largest known age.
    pub fn age_bounds(&self) -> Option<(i64, i64)> {
        let mut ages = self.records.iter().filter_map(|r| r.age);
        let first = ages.next()?;
        Some(ages.fold((first, first), |(lo, hi), a| (lo.min(a), hi.max(a))))
    }

    /// New table holding only the rows the filter accepts.
    pub fn filtered(&self, filter: &RecordFilter) -> PatientTable {
        let records = self
            .records
            .iter()
            .filter(|r| filter.accepts(r))
            .cloned()
            .collect();
        PatientTable::new(records, self.columns.clone())
    }

    fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut out: Vec<String> = values.map(str::to_string).collect();
        out.sort();
        out.dedup();
        out
    }
}

impl<'a> IntoIterator for &'a PatientTable {
    type Item = &'a PatientRecord;
    type IntoIter = std::slice::Iter<'a, PatientRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
