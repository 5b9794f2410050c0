use chrono::NaiveDate;
use health_dash::data::{generate_sample_table, parse_csv, PatientRecord, PatientTable, SampleSettings};
use health_dash::stats::{HealthAnalyzer, Period};
use std::collections::BTreeMap;

fn three_patients() -> PatientTable {
    parse_csv(
        b"age,admission_date,outcome,department,satisfaction_score\n\
          25,2021-01-04,recovered,ER,4\n\
          25,2021-01-20,deceased,ER,2\n\
          70,2021-03-02,recovered,ICU,5\n"
            .to_vec(),
    )
    .unwrap()
}

#[test]
fn three_patient_scenario() {
    let table = three_patients();
    let analyzer = HealthAnalyzer::new(&table);

    let by_age = analyzer.outcome_by_age();
    let twenties = by_age.bucket("20-29").unwrap();
    assert_eq!(twenties.get("recovered"), Some(&1));
    assert_eq!(twenties.get("deceased"), Some(&1));
    assert_eq!(twenties.len(), 2);
    let seventies = by_age.bucket("70-79").unwrap();
    assert_eq!(seventies.get("recovered"), Some(&1));
    assert_eq!(seventies.len(), 1);

    let satisfaction = analyzer.average_satisfaction_by_department();
    let expected: BTreeMap<String, f64> =
        [("ER".to_string(), 3.0), ("ICU".to_string(), 5.0)].into();
    assert_eq!(satisfaction, expected);

    let admissions = analyzer.admissions_over_time();
    let months: Vec<(NaiveDate, usize)> = admissions
        .iter()
        .map(|a| (a.period_start, a.count))
        .collect();
    assert_eq!(
        months,
        vec![
            (NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(), 2),
            (NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(), 1),
        ]
    );
}

#[test]
fn empty_table_gives_empty_results() {
    let table = parse_csv(b"age,admission_date,outcome,department,satisfaction_score\n".to_vec())
        .unwrap();
    assert!(table.is_empty());

    let analyzer = HealthAnalyzer::new(&table);
    assert!(analyzer.outcome_by_age().is_empty());
    assert!(analyzer.admissions_over_time().is_empty());
    assert!(analyzer.average_satisfaction_by_department().is_empty());
    assert!(analyzer.summarize_outcomes().is_empty());
}

#[test]
fn outcome_counts_cover_rows_with_age_and_outcome() {
    let mut records = generate_sample_table(&SampleSettings { rows: 300, seed: 3 })
        .unwrap()
        .records()
        .to_vec();
    for (i, record) in records.iter_mut().enumerate() {
        if i % 7 == 0 {
            record.age = None;
        }
        if i % 11 == 0 {
            record.outcome = None;
        }
    }
    let table = PatientTable::new(records, Vec::new());

    for width in [1, 5, 10, 25] {
        let result = HealthAnalyzer::new(&table)
            .with_age_bin_width(width)
            .outcome_by_age();
        let expected = table
            .iter()
            .filter(|r| r.age.is_some() && r.outcome.is_some())
            .count();
        assert_eq!(result.total(), expected);
    }
}

#[test]
fn admissions_strictly_increase_and_sum_to_dated_rows() {
    let table = generate_sample_table(&SampleSettings::default()).unwrap();
    let dated = table.iter().filter(|r| r.admission_date.is_some()).count();

    for period in [Period::Day, Period::Week, Period::Month, Period::Year] {
        let series = HealthAnalyzer::new(&table)
            .with_period(period)
            .admissions_over_time();
        assert!(series.windows(2).all(|w| w[0].period_start < w[1].period_start));
        assert!(series.iter().all(|a| period.truncate(a.period_start) == a.period_start));
        assert_eq!(series.iter().map(|a| a.count).sum::<usize>(), dated);
    }
}

#[test]
fn department_means_stay_within_score_range() {
    let table = generate_sample_table(&SampleSettings { rows: 400, seed: 11 }).unwrap();
    let means = HealthAnalyzer::new(&table).average_satisfaction_by_department();
    assert!(!means.is_empty());

    for (department, mean) in &means {
        let scores: Vec<f64> = table
            .iter()
            .filter(|r| &r.department == department)
            .filter_map(|r| r.satisfaction_score)
            .collect();
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(*mean >= min && *mean <= max, "{department}: {mean} not in [{min}, {max}]");
    }
}

#[test]
fn unscored_departments_are_omitted() {
    let table = PatientTable::new(
        vec![
            PatientRecord {
                department: "Radiology".into(),
                ..Default::default()
            },
            PatientRecord {
                department: "ER".into(),
                satisfaction_score: Some(1.0),
                ..Default::default()
            },
        ],
        Vec::new(),
    );
    let means = HealthAnalyzer::new(&table).average_satisfaction_by_department();
    assert_eq!(means.len(), 1);
    assert_eq!(means.get("ER"), Some(&1.0));
}

#[test]
fn queries_are_idempotent() {
    let table = generate_sample_table(&SampleSettings::default()).unwrap();
    let analyzer = HealthAnalyzer::new(&table).with_period(Period::Week);

    assert_eq!(analyzer.outcome_by_age(), analyzer.outcome_by_age());
    assert_eq!(analyzer.admissions_over_time(), analyzer.admissions_over_time());
    assert_eq!(
        analyzer.average_satisfaction_by_department(),
        analyzer.average_satisfaction_by_department()
    );
    assert_eq!(analyzer.satisfaction_summary(), analyzer.satisfaction_summary());
}

#[test]
fn out_of_range_ages_are_treated_as_missing() {
    let table = parse_csv(
        b"age,admission_date,outcome,department,satisfaction_score\n\
          1e30,2021-01-04,recovered,ER,4\n\
          -1e30,2021-01-05,recovered,ER,4\n\
          42,2021-01-06,deceased,ICU,3\n"
            .to_vec(),
    )
    .unwrap();
    assert_eq!(table.records()[0].age, None);
    assert_eq!(table.records()[1].age, None);

    let rows = HealthAnalyzer::new(&table).outcome_by_age().rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].age_bucket, "40-49");
    assert_eq!(rows[0].outcome, "deceased");
    assert_eq!(rows[0].count, 1);
}

#[test]
fn extreme_scores_are_missing_and_means_stay_finite() {
    let table = parse_csv(
        b"age,admission_date,outcome,department,satisfaction_score\n\
          30,2021-01-04,recovered,ER,1e308\n\
          31,2021-01-05,recovered,ER,-1e308\n\
          32,2021-01-06,recovered,ER,4\n\
          33,2021-01-07,recovered,ER,2\n\
          34,2021-01-08,recovered,ICU,1e308\n"
            .to_vec(),
    )
    .unwrap();
    assert_eq!(table.records()[0].satisfaction_score, None);
    assert_eq!(table.records()[1].satisfaction_score, None);

    let means = HealthAnalyzer::new(&table).average_satisfaction_by_department();
    let er = means["ER"];
    assert!(er.is_finite());
    assert!((2.0..=4.0).contains(&er));
    assert!(!means.contains_key("ICU"));
}

#[test]
fn implausible_ages_are_treated_as_missing() {
    let table = parse_csv(
        b"age,admission_date,outcome,department,satisfaction_score\n\
          4294967295,2021-01-04,recovered,ER,4\n\
          150,2021-01-05,recovered,ER,4\n"
            .to_vec(),
    )
    .unwrap();
    assert_eq!(table.records()[0].age, None);
    assert_eq!(table.records()[1].age, Some(150));

    let rows = HealthAnalyzer::new(&table).outcome_by_age().rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].age_bucket, "150-159");
}
