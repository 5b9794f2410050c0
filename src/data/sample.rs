//! Built-in sample dataset, used when no file is supplied.

use chrono::{Days, NaiveDate};
use rand::distr::weighted::{Error as WeightError, WeightedIndex};
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::record::{PatientRecord, PatientTable};

const OUTCOMES: [(&str, f64); 3] = [("discharge", 0.85), ("dama", 0.10), ("death", 0.05)];
const GENDERS: [(&str, f64); 3] = [("Male", 0.48), ("Female", 0.50), ("Other", 0.02)];
const DEPARTMENTS: [&str; 5] = ["Cardiology", "Oncology", "Emergency", "Pediatrics", "General"];
const DIAGNOSES: [&str; 5] = ["Flu", "COVID-19", "Fracture", "Cancer", "Infection"];

/// Admission dates are spread over this many days from 2020-01-01.
const ADMISSION_SPAN_DAYS: u64 = 1000;
const MAX_STAY_DAYS: u64 = 30;

const SAMPLE_COLUMNS: [&str; 9] = [
    "patient_id",
    "admission_date",
    "discharge_date",
    "outcome",
    "age",
    "gender",
    "department",
    "satisfaction_score",
    "diagnosis",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleSettings {
    pub rows: usize,
    pub seed: u64,
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self { rows: 500, seed: 42 }
    }
}

/// Generate a deterministic synthetic table for the given seed.
pub fn generate_sample_table(settings: &SampleSettings) -> Result<PatientTable, WeightError> {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();

    let outcome_dist = weighted(&OUTCOMES)?;
    let gender_dist = weighted(&GENDERS)?;

    let records = (0..settings.rows)
        .map(|i| {
            let admission = start + Days::new(rng.random_range(0..ADMISSION_SPAN_DAYS));
            let discharge = admission + Days::new(rng.random_range(0..MAX_STAY_DAYS));
            PatientRecord {
                patient_id: Some(format!("P{:05}", i)),
                age: Some(rng.random_range(0..100)),
                admission_date: Some(admission),
                discharge_date: Some(discharge),
                outcome: Some(OUTCOMES[outcome_dist.sample(&mut rng)].0.to_string()),
                gender: GENDERS[gender_dist.sample(&mut rng)].0.to_string(),
                department: pick(&DEPARTMENTS, &mut rng),
                satisfaction_score: Some(rng.random_range(1..=5) as f64),
                diagnosis: Some(pick(&DIAGNOSES, &mut rng)),
            }
        })
        .collect();

    Ok(PatientTable::new(
        records,
        SAMPLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
    ))
}

fn weighted(choices: &[(&str, f64)]) -> Result<WeightedIndex<f64>, WeightError> {
    WeightedIndex::new(choices.iter().map(|(_, w)| *w))
}

fn pick(choices: &[&str], rng: &mut StdRng) -> String {
    choices.choose(rng).copied().unwrap_or_default().to_string()
}
