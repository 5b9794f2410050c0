//! Record filters applied before analysis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::record::PatientRecord;

/// Row filter. Every empty field means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    /// Inclusive age range. Rows without an age never match a range.
    pub age_range: Option<(i64, i64)>,
    pub genders: BTreeSet<String>,
    pub departments: BTreeSet<String>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.age_range.is_none() && self.genders.is_empty() && self.departments.is_empty()
    }

    pub fn accepts(&self, record: &PatientRecord) -> bool {
        if let Some((min, max)) = self.age_range {
            match record.age {
                Some(age) if age >= min && age <= max => {}
                _ => return false,
            }
        }
        if !self.genders.is_empty() && !self.genders.contains(&record.gender) {
            return false;
        }
        if !self.departments.is_empty() && !self.departments.contains(&record.department) {
            return false;
        }
        true
    }
}
