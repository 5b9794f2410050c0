//! Analysis settings, loadable from a JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::charts::ChartSettings;
use crate::data::{RecordFilter, SampleSettings};
use crate::stats::{Period, DEFAULT_AGE_BIN_WIDTH};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Age bin width must be at least 1")]
    ZeroBinWidth,
    #[error("Age range {min}..={max} is empty")]
    EmptyAgeRange { min: i64, max: i64 },
}

/// User settings for analysis. Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub age_bin_width: u32,
    pub period: Period,
    pub filter: RecordFilter,
    pub sample: SampleSettings,
    pub chart: ChartSettings,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            age_bin_width: DEFAULT_AGE_BIN_WIDTH,
            period: Period::default(),
            filter: RecordFilter::default(),
            sample: SampleSettings::default(),
            chart: ChartSettings::default(),
        }
    }
}

impl AnalysisSettings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.age_bin_width == 0 {
            return Err(SettingsError::ZeroBinWidth);
        }
        if let Some((min, max)) = self.filter.age_range {
            if min > max {
                return Err(SettingsError::EmptyAgeRange { min, max });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = AnalysisSettings::from_json(
            r#"{ "period": "week", "filter": { "departments": ["Oncology"] } }"#,
        )
        .unwrap();

        assert_eq!(settings.period, Period::Week);
        assert_eq!(settings.age_bin_width, DEFAULT_AGE_BIN_WIDTH);
        assert_eq!(settings.sample, SampleSettings::default());
        assert!(settings.filter.departments.contains("Oncology"));
        assert!(settings.filter.age_range.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AnalysisSettings::from_json(r#"{ "age_bin_width": 0 }"#),
            Err(SettingsError::ZeroBinWidth)
        ));
        assert!(matches!(
            AnalysisSettings::from_json(r#"{ "filter": { "age_range": [60, 20] } }"#),
            Err(SettingsError::EmptyAgeRange { min: 60, max: 20 })
        ));
        assert!(matches!(
            AnalysisSettings::from_json(r#"{ "period": "fortnight" }"#),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = AnalysisSettings::load(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
