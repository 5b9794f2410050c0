//! Static Chart Renderer
//! Draws the three dashboard charts to PNG files with plotters.
//!
//! Layout of every chart: caption on top, categories on the x-axis at
//! integer positions (one slot per category), counts or means on the y-axis.
//! 1. Outcome distribution by age: grouped bars, one color per outcome
//! 2. Admissions over time: line with point markers
//! 3. Average satisfaction by department: bars, best mean first

use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::stats::{AdmissionCount, DepartmentSatisfaction, HealthAnalyzer, OutcomeByAge, Period};

pub const OUTCOME_BY_AGE_FILE: &str = "outcome_by_age.png";
pub const ADMISSIONS_FILE: &str = "admissions_over_time.png";
pub const SATISFACTION_FILE: &str = "satisfaction_by_department.png";

/// Color palette for series
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

const FONT: &str = "sans-serif";
const CAPTION_SIZE: u32 = 22;
/// Fraction of a category slot covered by bars.
const BAR_SPAN: f64 = 0.8;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create chart directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to draw {chart}: {message}")]
    Draw { chart: &'static str, message: String },
}

/// Output image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
        }
    }
}

/// Get color for a series index.
pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Label of the category slot at `x`, empty between slots.
pub fn slot_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render every non-empty chart into `dir` and return the written files.
    pub fn render_all(
        analyzer: &HealthAnalyzer<'_>,
        dir: &Path,
        settings: &ChartSettings,
    ) -> Result<Vec<PathBuf>, ChartError> {
        std::fs::create_dir_all(dir).map_err(|source| ChartError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::new();

        let outcome_by_age = analyzer.outcome_by_age();
        if outcome_by_age.is_empty() {
            log::warn!("Insufficient data for the outcome by age chart, skipping");
        } else {
            let path = dir.join(OUTCOME_BY_AGE_FILE);
            Self::render_outcome_by_age(&outcome_by_age, analyzer.age_bin_width(), &path, settings)?;
            written.push(path);
        }

        let admissions = analyzer.admissions_over_time();
        if admissions.is_empty() {
            log::warn!("No admission dates available, skipping admissions chart");
        } else {
            let path = dir.join(ADMISSIONS_FILE);
            Self::render_admissions(&admissions, analyzer.period(), &path, settings)?;
            written.push(path);
        }

        let satisfaction = analyzer.satisfaction_summary();
        if satisfaction.is_empty() {
            log::warn!("No satisfaction data available, skipping satisfaction chart");
        } else {
            let path = dir.join(SATISFACTION_FILE);
            Self::render_satisfaction(&satisfaction, &path, settings)?;
            written.push(path);
        }

        for path in &written {
            log::info!("Wrote chart {}", path.display());
        }
        Ok(written)
    }

    pub fn render_outcome_by_age(
        data: &OutcomeByAge,
        bin_width: u32,
        path: &Path,
        settings: &ChartSettings,
    ) -> Result<(), ChartError> {
        Self::draw_outcome_by_age(data, bin_width, path, settings).map_err(|e| ChartError::Draw {
            chart: "outcome by age",
            message: e.to_string(),
        })
    }

    pub fn render_admissions(
        data: &[AdmissionCount],
        period: Period,
        path: &Path,
        settings: &ChartSettings,
    ) -> Result<(), ChartError> {
        Self::draw_admissions(data, period, path, settings).map_err(|e| ChartError::Draw {
            chart: "admissions over time",
            message: e.to_string(),
        })
    }

    pub fn render_satisfaction(
        data: &[DepartmentSatisfaction],
        path: &Path,
        settings: &ChartSettings,
    ) -> Result<(), ChartError> {
        Self::draw_satisfaction(data, path, settings).map_err(|e| ChartError::Draw {
            chart: "satisfaction by department",
            message: e.to_string(),
        })
    }

    fn draw_outcome_by_age(
        data: &OutcomeByAge,
        bin_width: u32,
        path: &Path,
        settings: &ChartSettings,
    ) -> Result<(), Box<dyn Error>> {
        let labels: Vec<String> = data.iter().map(|(bucket, _)| bucket.to_string()).collect();
        let outcomes = data.outcomes();
        let y_max = data
            .iter()
            .flat_map(|(_, counts)| counts.values().copied())
            .max()
            .unwrap_or(0)
            .max(1) as f64
            * 1.1;

        let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Outcome distribution by age", (FONT, CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..(labels.len() as f64 - 0.5), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len() + 1)
            .x_label_formatter(&|x| slot_label(&labels, *x))
            .x_desc(format!("Age bins ({})", bin_width))
            .y_desc("Patients")
            .draw()?;

        let bar_width = BAR_SPAN / outcomes.len().max(1) as f64;
        for (j, outcome) in outcomes.iter().enumerate() {
            let color = series_color(j);
            let bars = data.iter().enumerate().filter_map(|(i, (_, counts))| {
                let count = *counts.get(outcome)?;
                let x0 = i as f64 - BAR_SPAN / 2.0 + j as f64 * bar_width;
                Some(Rectangle::new(
                    [(x0, 0.0), (x0 + bar_width, count as f64)],
                    color.filled(),
                ))
            });
            chart
                .draw_series(bars)?
                .label(outcome.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_admissions(
        data: &[AdmissionCount],
        period: Period,
        path: &Path,
        settings: &ChartSettings,
    ) -> Result<(), Box<dyn Error>> {
        let labels: Vec<String> = data.iter().map(|a| period.label(a.period_start)).collect();
        let y_max = data.iter().map(|a| a.count).max().unwrap_or(0).max(1) as f64 * 1.1;
        // Keep the axis readable for long series.
        let label_count = labels.len().min(12) + 1;

        let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Admissions over time", (FONT, CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..(labels.len() as f64 - 0.5), 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_labels(label_count)
            .x_label_formatter(&|x| slot_label(&labels, *x))
            .x_desc(format!("Admission {}", period))
            .y_desc("Admissions")
            .draw()?;

        let color = series_color(0);
        let points: Vec<(f64, f64)> = data
            .iter()
            .enumerate()
            .map(|(i, a)| (i as f64, a.count as f64))
            .collect();

        chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?;
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
        )?;

        root.present()?;
        Ok(())
    }

    fn draw_satisfaction(
        data: &[DepartmentSatisfaction],
        path: &Path,
        settings: &ChartSettings,
    ) -> Result<(), Box<dyn Error>> {
        let labels: Vec<String> = data.iter().map(|d| d.department.clone()).collect();
        let y_max = data
            .iter()
            .map(|d| d.mean)
            .fold(1.0f64, f64::max)
            * 1.15;

        let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Average satisfaction by department", (FONT, CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..(labels.len() as f64 - 0.5), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len() + 1)
            .x_label_formatter(&|x| slot_label(&labels, *x))
            .x_desc("Department")
            .y_desc("Avg satisfaction")
            .draw()?;

        chart.draw_series(data.iter().enumerate().map(|(i, d)| {
            let x = i as f64;
            Rectangle::new(
                [(x - BAR_SPAN / 2.0, 0.0), (x + BAR_SPAN / 2.0, d.mean)],
                series_color(i).filled(),
            )
        }))?;

        root.present()?;
        Ok(())
    }
}
