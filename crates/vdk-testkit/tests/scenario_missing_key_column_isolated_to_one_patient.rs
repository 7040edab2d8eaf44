//! Scenario: a structurally broken source file sidelines one patient while
//! the rest of the batch merges normally.
//!
//! P002's blood-pressure export lost its `Time` column. The load is recorded
//! as a failure, the patient's rows keep blood-pressure gaps and drop out at
//! assembly, and P001 is untouched.

use anyhow::Result;
use std::fs;

use vdk_ingest::SourceOutcome;
use vdk_reconcile::{run_merge, PipelineOptions};
use vdk_schemas::{PatientId, SourceKind};
use vdk_testkit::PatientFixture;

#[test]
fn broken_bp_header_drops_only_that_patient() -> Result<()> {
    let root = tempfile::tempdir()?;
    PatientFixture::new("P001")
        .reading_at("01-01-2024", "08.00.00")
        .reading_at("02-01-2024", "08.00.00")
        .labs_on("01-01-2024")
        .write_to(root.path())?;
    let p2_dir = PatientFixture::new("P002")
        .reading_at("01-01-2024", "08.00.00")
        .reading_at("02-01-2024", "08.00.00")
        .labs_on("01-01-2024")
        .write_to(root.path())?;
    // strip the Time column from P002's blood-pressure export
    fs::write(
        p2_dir.join("bp_monitoring.csv"),
        "Patient_ID,Date,Systolic_BP,Diastolic_BP\nP002,01-01-2024,120,80\n",
    )?;

    let run = run_merge(root.path(), &PipelineOptions::default())?;

    // only P001 survives into the canonical dataset
    assert_eq!(run.rows.len(), 2);
    assert!(run.rows.iter().all(|r| r.patient.as_str() == "P001"));

    // the failure is on record with its reason, not an abort
    let failures: Vec<_> = run.diagnostics.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].patient, PatientId::new("P002"));
    assert_eq!(failures[0].source, SourceKind::BloodPressure);
    match &failures[0].outcome {
        SourceOutcome::Failed { reason } => assert!(reason.contains("Time")),
        other => panic!("expected a failure outcome, got {other:?}"),
    }

    // P002's rows entered assembly and were dropped for their gaps
    let p2 = &run.report.per_patient[&PatientId::new("P002")];
    assert_eq!(p2.merged, 2);
    assert_eq!(p2.gapped, 2);
    assert_eq!(p2.kept, 0);
    Ok(())
}
