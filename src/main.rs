//! Health Dash - command line front end
//!
//! Loads patient records, prints the dashboard aggregates and optionally
//! renders the charts as PNG files.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use health_dash::charts::ChartRenderer;
use health_dash::data::DataLoader;
use health_dash::stats::{GroupKey, HealthAnalyzer, Period};
use health_dash::AnalysisSettings;

#[derive(Parser, Debug)]
#[command(name = "health-dash", version, about = "Patient & hospital data dashboard")]
struct Cli {
    /// CSV file of patient records
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Fail instead of using the sample dataset when no CSV is given
    #[arg(long)]
    no_sample: bool,

    /// JSON settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Age bucket width in years
    #[arg(long)]
    age_bin: Option<u32>,

    /// Admissions period: day, week, month or year
    #[arg(long)]
    period: Option<Period>,

    #[arg(long)]
    age_min: Option<i64>,

    #[arg(long)]
    age_max: Option<i64>,

    /// Keep only these genders (repeatable)
    #[arg(long = "gender")]
    genders: Vec<String>,

    /// Keep only these departments (repeatable)
    #[arg(long = "department")]
    departments: Vec<String>,

    /// Render PNG charts into this directory
    #[arg(long)]
    charts: Option<PathBuf>,

    /// Print aggregates as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn resolve_settings(&self) -> Result<AnalysisSettings> {
        let mut settings = match &self.settings {
            Some(path) => AnalysisSettings::load(path)?,
            None => AnalysisSettings::default(),
        };

        if let Some(width) = self.age_bin {
            settings.age_bin_width = width;
        }
        if let Some(period) = self.period {
            settings.period = period;
        }
        if self.age_min.is_some() || self.age_max.is_some() {
            let (min, max) = settings.filter.age_range.unwrap_or((0, 120));
            settings.filter.age_range = Some((self.age_min.unwrap_or(min), self.age_max.unwrap_or(max)));
        }
        if !self.genders.is_empty() {
            settings.filter.genders = self.genders.iter().cloned().collect();
        }
        if !self.departments.is_empty() {
            settings.filter.departments = self.departments.iter().cloned().collect();
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let settings = cli.resolve_settings().context("Invalid settings")?;

    if cli.csv.is_none() && cli.no_sample {
        bail!("Upload a CSV with --csv or allow the sample dataset");
    }

    let mut loader = DataLoader::new();
    let table = loader
        .load_or_sample(cli.csv.as_deref(), &settings.sample)
        .context("Could not load patient records")?;

    let table = if settings.filter.is_empty() {
        table.clone()
    } else {
        let filtered = table.filtered(&settings.filter);
        log::info!("Filters kept {} of {} rows", filtered.len(), table.len());
        filtered
    };

    let analyzer = HealthAnalyzer::new(&table)
        .with_age_bin_width(settings.age_bin_width)
        .with_period(settings.period);

    if cli.json {
        print_json(&analyzer)?;
    } else {
        print_report(&analyzer);
    }

    if let Some(dir) = &cli.charts {
        let written = ChartRenderer::render_all(&analyzer, dir, &settings.chart)
            .context("Chart rendering failed")?;
        log::info!("Rendered {} charts into {}", written.len(), dir.display());
    }

    Ok(())
}

fn print_json(analyzer: &HealthAnalyzer<'_>) -> Result<()> {
    let report = serde_json::json!({
        "rows": analyzer.table().len(),
        "age_bin_width": analyzer.age_bin_width(),
        "period": analyzer.period(),
        "outcome_by_age": analyzer.outcome_by_age().rows(),
        "admissions_over_time": analyzer.admissions_over_time(),
        "average_satisfaction_by_department": analyzer.average_satisfaction_by_department(),
        "satisfaction_summary": analyzer.satisfaction_summary(),
        "outcomes": analyzer.summarize_outcomes(),
        "outcomes_by_department": analyzer.outcomes_by(GroupKey::Department),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_report(analyzer: &HealthAnalyzer<'_>) {
    let table = analyzer.table();
    println!("Patient records: {}", table.len());
    println!("  Departments: {}", table.departments().join(", "));
    println!("  Genders:     {}", table.genders().join(", "));
    match table.age_bounds() {
        Some((min, max)) => println!("  Ages:        {}-{}", min, max),
        None => println!("  Ages:        none recorded"),
    }

    println!();
    println!("Outcome distribution by age ({}-year bins)", analyzer.age_bin_width());
    let outcome_by_age = analyzer.outcome_by_age();
    if outcome_by_age.is_empty() {
        println!("  Insufficient data for this chart.");
    }
    for (bucket, counts) in outcome_by_age.iter() {
        let cells: Vec<String> = counts.iter().map(|(o, c)| format!("{}={}", o, c)).collect();
        println!("  {:>9}  {}", bucket.to_string(), cells.join("  "));
    }

    println!();
    println!("Admissions over time (per {})", analyzer.period());
    let admissions = analyzer.admissions_over_time();
    if admissions.is_empty() {
        println!("  No admission_date available.");
    }
    for admission in &admissions {
        println!(
            "  {:>10}  {}",
            analyzer.period().label(admission.period_start),
            admission.count
        );
    }

    println!();
    println!("Average service satisfaction by department");
    let satisfaction = analyzer.satisfaction_summary();
    if satisfaction.is_empty() {
        println!("  No satisfaction data available.");
    }
    for dept in &satisfaction {
        println!(
            "  {:<20} {:>5.2}  (n={}, min={}, max={})",
            dept.department, dept.mean, dept.count, dept.min, dept.max
        );
    }

    println!();
    println!("Outcome counts");
    for share in analyzer.summarize_outcomes() {
        println!(
            "  {:<20} {:>6}  {:>6.1}%",
            share.outcome,
            share.count,
            share.share * 100.0
        );
    }
}
