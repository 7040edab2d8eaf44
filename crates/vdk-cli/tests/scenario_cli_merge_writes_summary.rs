//! End-to-end `vdk merge`: canonical dataset + run summary on disk.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

const VITALS_HEADER: &str =
    "Patient_ID,Date,Time,Blood_Glucose,SpO2,ECG,Hydration,Heart_Rate,Respiratory_Rate,Body_Temperature";
const BP_HEADER: &str = "Patient_ID,Date,Time,Systolic_BP,Diastolic_BP";
const LABS_HEADER: &str = "Patient_ID,Date,Hemoglobin,Cholesterol,Platelet_Count,\
WBC_Count,RBC_Count,Creatinine,Urea,Sodium,Potassium,Calcium";

fn write_patient(root: &Path, patient: &str, days: u32) {
    let dir = root.join(patient);
    std::fs::create_dir_all(&dir).unwrap();
    let vitals: Vec<String> = (1..=days)
        .map(|d| format!("{patient},{d:02}-01-2024,08.00.00,100,97,1.0,60,72,16,36.8"))
        .collect();
    let bp: Vec<String> = (1..=days)
        .map(|d| format!("{patient},{d:02}-01-2024,08.00.00,120,80"))
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

#[test]
fn cli_merge_writes_canonical_and_summary() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("data");
    write_patient(&data, "P001", 3);
    write_patient(&data, "P002", 2);
    let merged = dir.path().join("out/merged.csv");

    let mut cmd = assert_cmd::Command::cargo_bin("vdk-cli")?;
    cmd.arg("merge")
        .arg("--data-dir")
        .arg(&data)
        .arg("--out")
        .arg(&merged);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("merge_ok=true"))
        .stdout(predicate::str::contains("rows_written=5 patients_kept=2"))
        .stdout(predicate::str::contains("source_failures=0"));

    let csv = std::fs::read_to_string(&merged)?;
    assert!(csv.starts_with("Patient_ID,Date,Time,Blood_Glucose"));
    assert_eq!(csv.lines().count(), 6);

    // exactly one run summary landed next to the dataset
    let summaries: Vec<PathBuf> = std::fs::read_dir(merged.parent().unwrap())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with("merge_run_"))
                .unwrap_or(false)
        })
        .collect();
    assert_eq!(summaries.len(), 1);
    let summary: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&summaries[0])?)?;
    assert_eq!(summary["schema_version"], 1);
    assert_eq!(summary["rows_written"], 5);
    assert_eq!(summary["patients_kept"], 2);
    assert!(summary["run_id"].is_string());
    assert!(summary["created_at_utc"].is_string());
    Ok(())
}

#[test]
fn cli_merge_resolves_paths_from_env() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("data");
    write_patient(&data, "P001", 2);
    let merged = dir.path().join("merged.csv");

    let mut cmd = assert_cmd::Command::cargo_bin("vdk-cli")?;
    cmd.arg("merge")
        .env("VITALDESK_DATA_DIR", &data)
        .env("VITALDESK_MERGED_PATH", &merged);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("rows_written=2"));
    assert!(merged.exists());
    Ok(())
}

#[test]
fn cli_merge_fails_when_no_patient_is_usable() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data)?;
    let merged = dir.path().join("merged.csv");

    let mut cmd = assert_cmd::Command::cargo_bin("vdk-cli")?;
    cmd.arg("merge")
        .arg("--data-dir")
        .arg(&data)
        .arg("--out")
        .arg(&merged);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no usable patient data"));
    assert!(!merged.exists());
    Ok(())
}

#[test]
fn cli_merge_requires_a_data_dir() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut cmd = assert_cmd::Command::cargo_bin("vdk-cli")?;
    cmd.arg("merge")
        .arg("--out")
        .arg(dir.path().join("merged.csv"))
        .env_remove("VITALDESK_DATA_DIR");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("VITALDESK_DATA_DIR"));
    Ok(())
}
