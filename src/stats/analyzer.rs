//! Health Analyzer Module
//! Read-only aggregations over one loaded patient table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::period::Period;
use crate::data::{PatientRecord, PatientTable, UNKNOWN};

/// Default width of an age bucket in years.
pub const DEFAULT_AGE_BIN_WIDTH: u32 = 10;

/// Age range `[start, start + width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgeBucket {
    pub start: i64,
    pub width: u32,
}

impl AgeBucket {
    pub fn containing(age: i64, width: u32) -> Self {
        let width = width.max(1);
        Self {
            start: age.saturating_sub(age.rem_euclid(i64::from(width))),
            width,
        }
    }

    pub fn end(&self) -> i64 {
        self.start.saturating_add(i64::from(self.width) - 1)
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 1 {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end())
        }
    }
}

/// Outcome counts per age bucket.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutcomeByAge {
    buckets: BTreeMap<AgeBucket, BTreeMap<String, usize>>,
}

impl OutcomeByAge {
    pub fn iter(&self) -> impl Iterator<Item = (&AgeBucket, &BTreeMap<String, usize>)> {
        self.buckets.iter()
    }

    /// Counts for the bucket with the given label, e.g. `"20-29"`.
    pub fn bucket(&self, label: &str) -> Option<&BTreeMap<String, usize>> {
        self.buckets
            .iter()
            .find(|(bucket, _)| bucket.to_string() == label)
            .map(|(_, counts)| counts)
    }

    pub fn total(&self) -> usize {
        self.buckets.values().flat_map(|c| c.values()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sorted distinct outcome labels across all buckets.
    pub fn outcomes(&self) -> Vec<String> {
        let mut outcomes: Vec<String> = self
            .buckets
            .values()
            .flat_map(|c| c.keys().cloned())
            .collect();
        outcomes.sort();
        outcomes.dedup();
        outcomes
    }

    /// Long format view: one row per (bucket, outcome).
    pub fn rows(&self) -> Vec<OutcomeCount> {
        self.buckets
            .iter()
            .flat_map(|(bucket, counts)| {
                counts.iter().map(move |(outcome, &count)| OutcomeCount {
                    age_bucket: bucket.to_string(),
                    bucket_start: bucket.start,
                    outcome: outcome.clone(),
                    count,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeCount {
    pub age_bucket: String,
    pub bucket_start: i64,
    pub outcome: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdmissionCount {
    pub period_start: NaiveDate,
    pub count: usize,
}

/// Satisfaction statistics of one department.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentSatisfaction {
    pub department: String,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; absent below two scores.
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeShare {
    pub outcome: String,
    pub count: usize,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedOutcome {
    pub group: String,
    pub outcome: String,
    pub count: usize,
    /// Fraction of the group's rows with this outcome.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupValue {
    pub group: String,
    /// Rows that contributed to the value.
    pub rows: usize,
    pub value: f64,
}

/// Column used to group rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Department,
    Gender,
    Outcome,
    AgeBucket,
}

/// Numeric value averaged per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Age,
    Satisfaction,
    LengthOfStay,
}

impl Measure {
    fn value(self, record: &PatientRecord) -> Option<f64> {
        match self {
            Measure::Age => record.age.map(|a| a as f64),
            Measure::Satisfaction => record.satisfaction_score,
            Measure::LengthOfStay => record.length_of_stay().map(|d| d as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Count,
    Mean(Measure),
}

/// Read-only analysis view over one patient table.
///
/// Every query is a pure function of the table and the analyzer settings.
#[derive(Debug, Clone, Copy)]
pub struct HealthAnalyzer<'a> {
    table: &'a PatientTable,
    age_bin_width: u32,
    period: Period,
}

impl<'a> HealthAnalyzer<'a> {
    pub fn new(table: &'a PatientTable) -> Self {
        Self {
            table,
            age_bin_width: DEFAULT_AGE_BIN_WIDTH,
            period: Period::default(),
        }
    }

    /// Set the age bucket width. Zero is treated as one.
    pub fn with_age_bin_width(mut self, width: u32) -> Self {
        self.age_bin_width = width.max(1);
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn table(&self) -> &'a PatientTable {
        self.table
    }

    pub fn age_bin_width(&self) -> u32 {
        self.age_bin_width
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Count outcomes within each age bucket. Rows without age or outcome
    /// are skipped.
    pub fn outcome_by_age(&self) -> OutcomeByAge {
        let mut buckets: BTreeMap<AgeBucket, BTreeMap<String, usize>> = BTreeMap::new();
        for record in self.table {
            if let (Some(age), Some(outcome)) = (record.age, record.outcome.as_ref()) {
                let bucket = AgeBucket::containing(age, self.age_bin_width);
                *buckets
                    .entry(bucket)
                    .or_default()
                    .entry(outcome.clone())
                    .or_default() += 1;
            }
        }
        OutcomeByAge { buckets }
    }

    /// Admissions per calendar period, oldest first. Periods without
    /// admissions are absent.
    pub fn admissions_over_time(&self) -> Vec<AdmissionCount> {
        let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for date in self.table.iter().filter_map(|r| r.admission_date) {
            *counts.entry(self.period.truncate(date)).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(period_start, count)| AdmissionCount {
                period_start,
                count,
            })
            .collect()
    }

    /// Mean satisfaction score per department. Departments without any
    /// score are omitted.
    pub fn average_satisfaction_by_department(&self) -> BTreeMap<String, f64> {
        self.scores_by_department()
            .into_iter()
            .map(|(department, scores)| (department.to_string(), bounded_mean(&scores)))
            .collect()
    }

    /// Per-department satisfaction statistics, best mean first.
    pub fn satisfaction_summary(&self) -> Vec<DepartmentSatisfaction> {
        let mut summary: Vec<DepartmentSatisfaction> = self
            .scores_by_department()
            .into_iter()
            .map(|(department, scores)| DepartmentSatisfaction {
                department: department.to_string(),
                count: scores.len(),
                mean: bounded_mean(&scores),
                min: Statistics::min(scores.iter()),
                max: Statistics::max(scores.iter()),
                std_dev: (scores.len() > 1).then(|| Statistics::std_dev(scores.iter())),
            })
            .collect();
        summary.sort_by(|a, b| descending(a.mean, b.mean).then_with(|| a.department.cmp(&b.department)));
        summary
    }

    /// Count and share of each outcome, most frequent first. Rows without
    /// an outcome are counted under `Unknown`, so shares cover every row.
    pub fn summarize_outcomes(&self) -> Vec<OutcomeShare> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in self.table {
            *counts.entry(record.outcome.as_deref().unwrap_or(UNKNOWN)).or_default() += 1;
        }
        let total: usize = counts.values().sum();

        let mut shares: Vec<OutcomeShare> = counts
            .into_iter()
            .map(|(outcome, count)| OutcomeShare {
                outcome: outcome.to_string(),
                count,
                share: count as f64 / total as f64,
            })
            .collect();
        shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.outcome.cmp(&b.outcome)));
        shares
    }

    /// Outcome counts and within-group shares, grouped by `key`.
    pub fn outcomes_by(&self, key: GroupKey) -> Vec<GroupedOutcome> {
        let mut groups: BTreeMap<(i64, String), BTreeMap<&str, usize>> = BTreeMap::new();
        for record in self.table {
            let (Some(group), Some(outcome)) = (self.group_of(record, key), record.outcome.as_deref())
            else {
                continue;
            };
            *groups.entry(group).or_default().entry(outcome).or_default() += 1;
        }

        groups
            .into_iter()
            .flat_map(|((_, group), counts)| {
                let total: usize = counts.values().sum();
                counts.into_iter().map(move |(outcome, count)| GroupedOutcome {
                    group: group.clone(),
                    outcome: outcome.to_string(),
                    count,
                    share: count as f64 / total as f64,
                })
            })
            .collect()
    }

    /// Generic group-by. Results are sorted by value descending, then group
    /// name; groups with nothing to aggregate are omitted.
    pub fn aggregate_by(&self, key: GroupKey, aggregation: Aggregation) -> Vec<GroupValue> {
        let mut groups: BTreeMap<(i64, String), Vec<f64>> = BTreeMap::new();
        for record in self.table {
            let Some(group) = self.group_of(record, key) else {
                continue;
            };
            let value = match aggregation {
                Aggregation::Count => Some(1.0),
                Aggregation::Mean(measure) => measure.value(record),
            };
            if let Some(value) = value {
                groups.entry(group).or_default().push(value);
            }
        }

        let mut values: Vec<GroupValue> = groups
            .into_iter()
            .map(|((_, group), values)| GroupValue {
                group,
                rows: values.len(),
                value: match aggregation {
                    Aggregation::Count => values.len() as f64,
                    Aggregation::Mean(_) => Statistics::mean(values.iter()),
                },
            })
            .collect();
        values.sort_by(|a, b| descending(a.value, b.value).then_with(|| a.group.cmp(&b.group)));
        values
    }

    fn scores_by_department(&self) -> BTreeMap<&'a str, Vec<f64>> {
        let mut scores: BTreeMap<&'a str, Vec<f64>> = BTreeMap::new();
        for record in self.table.records() {
            if let Some(score) = record.satisfaction_score {
                scores.entry(record.department.as_str()).or_default().push(score);
            }
        }
        scores
    }

    /// Group label plus a sort rank so age buckets order numerically.
    fn group_of(&self, record: &PatientRecord, key: GroupKey) -> Option<(i64, String)> {
        match key {
            GroupKey::Department => Some((0, record.department.clone())),
            GroupKey::Gender => Some((0, record.gender.clone())),
            GroupKey::Outcome => record.outcome.clone().map(|o| (0, o)),
            GroupKey::AgeBucket => record.age.map(|age| {
                let bucket = AgeBucket::containing(age, self.age_bin_width);
                (bucket.start, bucket.to_string())
            }),
        }
    }
}

/// Mean of a non-empty group, kept inside the group's `[min, max]` against
/// rounding in the running mean.
fn bounded_mean(values: &[f64]) -> f64 {
    let mean = Statistics::mean(values.iter());
    mean.clamp(Statistics::min(values.iter()), Statistics::max(values.iter()))
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
