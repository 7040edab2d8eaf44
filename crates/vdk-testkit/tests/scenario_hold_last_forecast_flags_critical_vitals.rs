//! Scenario: merge, forecast with the hold-last baseline, grade the
//! predictions against the clinical ranges.
//!
//! A patient whose last reading carries several out-of-range vitals is
//! flagged high-severity; a patient sitting exactly on a range boundary
//! stays clean (bounds are inclusive).

use anyhow::Result;

use vdk_alert::{evaluate_batch, AlertPolicy, RangeTable};
use vdk_reconcile::{run_merge, PipelineOptions};
use vdk_schemas::PatientId;
use vdk_sequence::{forecast_next, HoldLastForecaster};
use vdk_testkit::PatientFixture;

#[test]
fn deteriorating_patient_is_flagged_high_severity() -> Result<()> {
    let root = tempfile::tempdir()?;
    // P001 holds the systolic low bound exactly, every day
    let mut steady = PatientFixture::new("P001");
    for day in 1..=4u32 {
        let date = format!("{day:02}-01-2024");
        steady = steady
            .vitals_at(&date, "08.00.00", 100.0, 72.0)
            .bp_at(&date, "08.00.00", 90.0, 80.0);
    }
    steady.labs_on("01-01-2024").write_to(root.path())?;

    // P002 ends with glucose, heart rate, and both pressures out of range
    let mut failing = PatientFixture::new("P002");
    for day in 1..=3u32 {
        let date = format!("{day:02}-01-2024");
        failing = failing.reading_at(&date, "08.00.00");
    }
    failing
        .vitals_at("04-01-2024", "08.00.00", 250.0, 130.0)
        .bp_at("04-01-2024", "08.00.00", 160.0, 100.0)
        .labs_on("01-01-2024")
        .write_to(root.path())?;

    let run = run_merge(root.path(), &PipelineOptions::default())?;
    let forecast = forecast_next(&run.rows, 3, &HoldLastForecaster);
    assert!(forecast.is_clean());
    assert_eq!(forecast.predictions.len(), 2);

    let report = evaluate_batch(
        &RangeTable::clinical_defaults(),
        &AlertPolicy::sane_defaults(),
        &forecast.predictions,
    );

    // boundary value 90 is Normal: P001 has nothing critical
    let p1 = &report.alerts[&PatientId::new("P001")];
    assert!(p1.critical.is_empty());
    assert!(!p1.high_severity);

    // hold-last carries the four out-of-range vitals into the prediction
    let p2 = &report.alerts[&PatientId::new("P002")];
    assert_eq!(p2.critical_count(), 4);
    assert!(p2.high_severity);
    let metrics: Vec<&str> = p2.critical.iter().map(|f| f.metric.as_str()).collect();
    assert_eq!(
        metrics,
        vec!["Blood_Glucose", "Heart_Rate", "Systolic_BP", "Diastolic_BP"]
    );

    let flagged: Vec<&str> = report.high_severity().map(|p| p.as_str()).collect();
    assert_eq!(flagged, vec!["P002"]);
    Ok(())
}
