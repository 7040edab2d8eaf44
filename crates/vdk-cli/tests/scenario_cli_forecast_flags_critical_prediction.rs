//! `vdk merge` then `vdk forecast`: a deteriorating vital shows up as a
//! critical finding on the predicted row.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;

const VITALS_HEADER: &str =
    "Patient_ID,Date,Time,Blood_Glucose,SpO2,ECG,Hydration,Heart_Rate,Respiratory_Rate,Body_Temperature";
const BP_HEADER: &str = "Patient_ID,Date,Time,Systolic_BP,Diastolic_BP";
const LABS_HEADER: &str = "Patient_ID,Date,Hemoglobin,Cholesterol,Platelet_Count,\
WBC_Count,RBC_Count,Creatinine,Urea,Sodium,Potassium,Calcium";

/// One patient, one row per day, with the heart-rate series given per day.
fn write_patient(root: &Path, patient: &str, heart_rates: &[u32]) {
    let dir = root.join(patient);
    std::fs::create_dir_all(&dir).unwrap();
    let vitals: Vec<String> = heart_rates
        .iter()
        .enumerate()
        .map(|(i, hr)| {
            format!(
                "{patient},{:02}-01-2024,08.00.00,100,97,1.0,60,{hr},16,36.8",
                i + 1
            )
        })
        .collect();
    let bp: Vec<String> = heart_rates
        .iter()
        .enumerate()
        .map(|(i, _)| format!("{patient},{:02}-01-2024,08.00.00,120,80", i + 1))
        .collect();
    std::fs::write(
        dir.join("blood_monitoring.csv"),
        format!("{VITALS_HEADER}\n{}\n", vitals.join("\n")),
    )
    .unwrap();
    std::fs::write(
        dir.join("bp_monitoring.csv"),
        format!("{BP_HEADER}\n{}\n", bp.join("\n")),
    )
    .unwrap();
    std::fs::write(
        dir.join("lab_results.csv"),
        format!("{LABS_HEADER}\n{patient},01-01-2024,14,180,250000,7000,5.2,1.0,14,140,4.2,9.4\n"),
    )
    .unwrap();
}

fn merge(data: &Path, out: &Path) -> anyhow::Result<()> {
    assert_cmd::Command::cargo_bin("vdk-cli")?
        .arg("merge")
        .arg("--data-dir")
        .arg(data)
        .arg("--out")
        .arg(out)
        .assert()
        .success();
    Ok(())
}

#[test]
fn cli_forecast_flags_out_of_range_prediction() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("data");
    // steady, then a spike on the final day; hold-last carries the spike
    write_patient(&data, "P001", &[72, 74, 73, 75, 130]);
    let merged = dir.path().join("merged.csv");
    merge(&data, &merged)?;

    let report = dir.path().join("forecast.json");
    let mut cmd = assert_cmd::Command::cargo_bin("vdk-cli")?;
    cmd.arg("forecast")
        .arg("--merged")
        .arg(&merged)
        .arg("--window")
        .arg("3")
        .arg("--report")
        .arg(&report);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ForecastRun"))
        .stdout(predicate::str::contains("AlertReport"))
        .stdout(predicate::str::contains("Heart_Rate = 130 (normal 50..110)"))
        .stdout(predicate::str::contains(
            "forecast_ok=true window=3 predicted=1 skipped=0 critical=1 high_severity=0",
        ));

    let artifact: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report)?)?;
    assert_eq!(artifact["forecast"]["window"], 3);
    assert!(artifact["forecast"]["predictions"]["P001"].is_array());
    assert_eq!(artifact["alerts"]["alerts"]["P001"]["high_severity"], false);
    Ok(())
}

#[test]
fn cli_forecast_reports_short_history_as_a_skip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("data");
    write_patient(&data, "P001", &[72, 73]);
    let merged = dir.path().join("merged.csv");
    merge(&data, &merged)?;

    let mut cmd = assert_cmd::Command::cargo_bin("vdk-cli")?;
    cmd.arg("forecast")
        .arg("--merged")
        .arg(&merged)
        .arg("--window")
        .arg("5");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("insufficient history"))
        .stdout(predicate::str::contains("predicted=0 skipped=1"));
    Ok(())
}

#[test]
fn cli_forecast_rejects_window_zero() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut cmd = assert_cmd::Command::cargo_bin("vdk-cli")?;
    cmd.arg("forecast")
        .arg("--merged")
        .arg(dir.path().join("merged.csv"))
        .arg("--window")
        .arg("0");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--window"));
    Ok(())
}
