//! Data Processor Module
//! Turns a raw text DataFrame into typed patient records (column resolution,
//! value coercion, duplicate removal).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashSet;

use super::loader::DataFormatError;
use super::record::{PatientRecord, PatientTable, UNKNOWN};

/// Columns every input file must provide, after alias resolution.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "age",
    "admission_date",
    "outcome",
    "department",
    "satisfaction_score",
];

/// Accepted spellings for each canonical column, in priority order.
const COLUMN_ALIASES: [(&str, &[&str]); 9] = [
    ("patient_id", &["patient_id"]),
    ("age", &["age"]),
    ("admission_date", &["admission_date", "admit_date", "date_admitted"]),
    ("discharge_date", &["discharge_date", "date_discharged"]),
    ("outcome", &["outcome"]),
    ("gender", &["gender"]),
    ("department", &["department"]),
    (
        "satisfaction_score",
        &["satisfaction_score", "satisfaction", "satisfaction_rating"],
    ),
    ("diagnosis", &["diagnosis"]),
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Cell contents treated as missing.
const MISSING_MARKERS: [&str; 5] = ["na", "n/a", "nan", "null", "none"];

/// Header name normalization: trimmed, lower-case.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Handles cleaning and type coercion of loaded data.
pub struct DataProcessor;

impl DataProcessor {
    /// Find the source header for a canonical column name.
    pub fn resolve_column<'a>(headers: &'a [String], canonical: &str) -> Option<&'a str> {
        let aliases = COLUMN_ALIASES
            .iter()
            .find(|(name, _)| *name == canonical)
            .map(|(_, aliases)| *aliases)?;

        aliases.iter().find_map(|alias| {
            headers
                .iter()
                .find(|h| normalize_column_name(h) == *alias)
                .map(String::as_str)
        })
    }

    /// Convert a text DataFrame into a cleaned `PatientTable`.
    pub fn clean(df: &DataFrame) -> Result<PatientTable, DataFormatError> {
        let headers: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for required in REQUIRED_COLUMNS {
            if Self::resolve_column(&headers, required).is_none() {
                return Err(DataFormatError::MissingColumn {
                    column: required.to_string(),
                });
            }
        }

        let height = df.height();
        let text = |canonical: &str| -> Result<Vec<Option<String>>, DataFormatError> {
            match Self::resolve_column(&headers, canonical) {
                Some(header) => Ok(Self::text_values(df, header)?),
                None => Ok(vec![None; height]),
            }
        };

        let patient_ids = text("patient_id")?;
        let ages = text("age")?;
        let admissions = text("admission_date")?;
        let discharges = text("discharge_date")?;
        let outcomes = text("outcome")?;
        let genders = text("gender")?;
        let departments = text("department")?;
        let scores = text("satisfaction_score")?;
        let diagnoses = text("diagnosis")?;

        let mut coerced = 0usize;
        let mut coerce = |raw: &Option<String>, parsed: bool| {
            if raw.is_some() && !parsed {
                coerced += 1;
            }
        };

        let mut records = Vec::with_capacity(height);
        for i in 0..height {
            let age = ages[i].as_deref().and_then(parse_age);
            coerce(&ages[i], age.is_some());
            let admission_date = admissions[i].as_deref().and_then(parse_date);
            coerce(&admissions[i], admission_date.is_some());
            let discharge_date = discharges[i].as_deref().and_then(parse_date);
            coerce(&discharges[i], discharge_date.is_some());
            let satisfaction_score = scores[i].as_deref().and_then(parse_score);
            coerce(&scores[i], satisfaction_score.is_some());

            records.push(PatientRecord {
                patient_id: patient_ids[i].clone(),
                age,
                admission_date,
                discharge_date,
                outcome: outcomes[i].as_deref().map(normalize_outcome),
                gender: genders[i].clone().unwrap_or_else(|| UNKNOWN.to_string()),
                department: departments[i].clone().unwrap_or_else(|| UNKNOWN.to_string()),
                satisfaction_score,
                diagnosis: diagnoses[i].clone(),
            });
        }

        if coerced > 0 {
            log::debug!("{} malformed values treated as missing", coerced);
        }

        let has_patient_id = Self::resolve_column(&headers, "patient_id").is_some();
        let before = records.len();
        let records = Self::drop_duplicates(records, has_patient_id);
        if records.len() < before {
            log::debug!("Dropped {} duplicate rows", before - records.len());
        }

        let columns = headers.iter().map(|h| normalize_column_name(h)).collect();
        Ok(PatientTable::new(records, columns))
    }

    /// Keep the first of each duplicate. With a patient id, duplicates are
    /// rows sharing (patient_id, admission_date); otherwise identical rows.
    pub fn drop_duplicates(records: Vec<PatientRecord>, by_patient_id: bool) -> Vec<PatientRecord> {
        if by_patient_id {
            let mut seen = HashSet::new();
            records
                .into_iter()
                .filter(|r| seen.insert((r.patient_id.clone(), r.admission_date)))
                .collect()
        } else {
            let mut seen = HashSet::new();
            records
                .into_iter()
                .filter(|r| seen.insert(row_key(r)))
                .collect()
        }
    }

    fn text_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
        let column = df.column(name)?.cast(&DataType::String)?;
        let values = column
            .str()?
            .into_iter()
            .map(|v| {
                v.map(str::trim)
                    .filter(|s| !is_missing(s))
                    .map(str::to_string)
            })
            .collect();
        Ok(values)
    }
}

type RowKey = (
    Option<String>,
    Option<i64>,
    Option<NaiveDate>,
    Option<NaiveDate>,
    Option<String>,
    String,
    String,
    Option<u64>,
    Option<String>,
);

fn row_key(r: &PatientRecord) -> RowKey {
    (
        r.patient_id.clone(),
        r.age,
        r.admission_date,
        r.discharge_date,
        r.outcome.clone(),
        r.gender.clone(),
        r.department.clone(),
        r.satisfaction_score.map(f64::to_bits),
        r.diagnosis.clone(),
    )
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || MISSING_MARKERS.iter().any(|m| value.eq_ignore_ascii_case(m))
}

/// Largest age accepted from input. Anything outside `0..=MAX_AGE` is
/// treated as missing.
pub const MAX_AGE: f64 = 150.0;

/// Largest score magnitude accepted from input; larger scores are missing.
pub const MAX_SCORE: f64 = 1_000_000.0;

/// Numeric age; fractional values are floored.
pub fn parse_age(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| (0.0..=MAX_AGE).contains(v))
        .map(|v| v.floor() as i64)
}

pub fn parse_score(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.abs() <= MAX_SCORE)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

pub fn normalize_outcome(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: Vec<(&str, Vec<Option<&str>>)>) -> DataFrame {
        let columns = columns
            .into_iter()
            .map(|(name, values)| Column::new(name.into(), values))
            .collect();
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn parses_common_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 7);
        assert_eq!(parse_date("2021-03-07"), expected);
        assert_eq!(parse_date("2021/03/07"), expected);
        assert_eq!(parse_date("03/07/2021"), expected);
        assert_eq!(parse_date("2021-03-07 14:30:00"), expected);
        assert_eq!(parse_date("2021-03-07T14:30:00"), expected);
        assert_eq!(parse_date("2021-03-07T14:30:00+02:00"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(parse_age("25"), Some(25));
        assert_eq!(parse_age(" 25.0 "), Some(25));
        assert_eq!(parse_age("25.9"), Some(25));
        assert_eq!(parse_age("old"), None);
        assert_eq!(parse_age("1e30"), None);
        assert_eq!(parse_age("-1e30"), None);
        assert_eq!(parse_age("-1"), None);
        assert_eq!(parse_age("inf"), None);
        assert_eq!(parse_age("150"), Some(150));
        assert_eq!(parse_age("151"), None);
        assert_eq!(parse_score("4.5"), Some(4.5));
        assert_eq!(parse_score("NaN"), None);
        assert_eq!(parse_score("five"), None);
        assert_eq!(parse_score("-3"), Some(-3.0));
        assert_eq!(parse_score("1e6"), Some(1e6));
        assert_eq!(parse_score("1e308"), None);
        assert_eq!(parse_score("-1e308"), None);
        assert_eq!(parse_score("inf"), None);
    }

    #[test]
    fn resolves_aliases_case_insensitively() {
        let headers = vec![
            " Admit_Date ".to_string(),
            "SATISFACTION".to_string(),
            "Age".to_string(),
        ];
        assert_eq!(
            DataProcessor::resolve_column(&headers, "admission_date"),
            Some(" Admit_Date ")
        );
        assert_eq!(
            DataProcessor::resolve_column(&headers, "satisfaction_score"),
            Some("SATISFACTION")
        );
        assert_eq!(DataProcessor::resolve_column(&headers, "age"), Some("Age"));
        assert_eq!(DataProcessor::resolve_column(&headers, "outcome"), None);
    }

    #[test]
    fn clean_reports_first_missing_column() {
        let df = frame(vec![
            ("age", vec![Some("30")]),
            ("admission_date", vec![Some("2021-01-01")]),
            ("outcome", vec![Some("discharge")]),
            ("satisfaction_score", vec![Some("4")]),
        ]);
        match DataProcessor::clean(&df) {
            Err(DataFormatError::MissingColumn { column }) => assert_eq!(column, "department"),
            other => panic!("expected missing department, got {other:?}"),
        }
    }

    #[test]
    fn clean_coerces_and_fills_defaults() {
        let df = frame(vec![
            ("Age", vec![Some("30"), Some("n/a")]),
            ("Admission_Date", vec![Some("2021-01-05"), Some("bad date")]),
            ("Outcome", vec![Some("  Discharge "), None]),
            ("Department", vec![None, Some("Oncology")]),
            ("Satisfaction", vec![Some("4"), Some("great")]),
        ]);
        let table = DataProcessor::clean(&df).unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.records()[0];
        assert_eq!(first.age, Some(30));
        assert_eq!(first.admission_date, NaiveDate::from_ymd_opt(2021, 1, 5));
        assert_eq!(first.outcome.as_deref(), Some("discharge"));
        assert_eq!(first.department, UNKNOWN);
        assert_eq!(first.gender, UNKNOWN);
        assert_eq!(first.satisfaction_score, Some(4.0));

        let second = &table.records()[1];
        assert_eq!(second.age, None);
        assert_eq!(second.admission_date, None);
        assert_eq!(second.outcome, None);
        assert_eq!(second.satisfaction_score, None);
        assert_eq!(table.columns()[1], "admission_date");
    }

    #[test]
    fn duplicates_by_patient_and_admission() {
        let row = |id: &str, day: u32, dept: &str| PatientRecord {
            patient_id: Some(id.to_string()),
            admission_date: NaiveDate::from_ymd_opt(2022, 5, day),
            department: dept.to_string(),
            ..Default::default()
        };
        let records = vec![
            row("P1", 1, "ER"),
            row("P1", 1, "ICU"),
            row("P1", 2, "ER"),
            row("P2", 1, "ER"),
        ];
        let kept = DataProcessor::drop_duplicates(records, true);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].department, "ER");
    }

    #[test]
    fn duplicates_without_patient_id_need_identical_rows() {
        let row = |score: f64| PatientRecord {
            satisfaction_score: Some(score),
            ..Default::default()
        };
        let kept = DataProcessor::drop_duplicates(vec![row(4.0), row(4.0), row(3.0)], false);
        assert_eq!(kept.len(), 2);
    }
}
