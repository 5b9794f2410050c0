//! Stats module - Aggregations over patient records

mod analyzer;
mod period;

pub use analyzer::{
    AdmissionCount, AgeBucket, Aggregation, DepartmentSatisfaction, GroupKey, GroupValue,
    GroupedOutcome, HealthAnalyzer, Measure, OutcomeByAge, OutcomeCount, OutcomeShare,
    DEFAULT_AGE_BIN_WIDTH,
};
pub use period::{ParsePeriodError, Period};
