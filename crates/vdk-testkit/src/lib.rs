//! Shared fixtures for cross-crate scenario tests.
//!
//! The builders write the three per-patient source files the loaders expect,
//! with clinically unremarkable values everywhere a scenario does not care;
//! scenarios override only the cells under test. The checked loader
//! re-asserts the canonical-dataset invariants so individual scenarios do
//! not re-derive them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use vdk_reconcile::load_canonical;
use vdk_schemas::TimelineRow;

/// Header of the blood-chemistry monitor export.
pub const VITALS_HEADER: &str =
    "Patient_ID,Date,Time,Blood_Glucose,SpO2,ECG,Hydration,Heart_Rate,Respiratory_Rate,Body_Temperature";
/// Header of the blood-pressure monitor export.
pub const BP_HEADER: &str = "Patient_ID,Date,Time,Systolic_BP,Diastolic_BP";
/// Header of the lab-results export.
pub const LABS_HEADER: &str = "Patient_ID,Date,Hemoglobin,Cholesterol,Platelet_Count,\
WBC_Count,RBC_Count,Creatinine,Urea,Sodium,Potassium,Calcium";

// ---------------------------------------------------------------------------
// Patient source fixture
// ---------------------------------------------------------------------------

/// Source rows for one patient folder.
///
/// Every value a builder method does not name is an in-range constant: a
/// fixture patient alerts on nothing and drifts against nothing unless a
/// scenario says otherwise.
#[derive(Debug, Clone, Default)]
pub struct PatientFixture {
    id: String,
    vitals: Vec<String>,
    bp: Vec<String>,
    labs: Vec<String>,
}

impl PatientFixture {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    /// One reading on both continuous monitors at `date`/`time`.
    pub fn reading_at(self, date: &str, time: &str) -> Self {
        self.vitals_at(date, time, 100.0, 72.0)
            .bp_at(date, time, 120.0, 80.0)
    }

    /// One blood-chemistry row. Glucose and heart rate are the cells
    /// scenarios most often probe, so they are parameters; the rest are the
    /// standard constants.
    pub fn vitals_at(mut self, date: &str, time: &str, glucose: f64, heart_rate: f64) -> Self {
        self.vitals.push(format!(
            "{},{date},{time},{glucose},97,1.0,60,{heart_rate},16,36.8",
            self.id
        ));
        self
    }

    pub fn bp_at(mut self, date: &str, time: &str, systolic: f64, diastolic: f64) -> Self {
        self.bp
            .push(format!("{},{date},{time},{systolic},{diastolic}", self.id));
        self
    }

    /// One standard lab panel dated `date`.
    pub fn labs_on(self, date: &str) -> Self {
        self.labs_with_hemoglobin(date, 14.0)
    }

    /// One lab panel whose hemoglobin tells it apart from other panels.
    pub fn labs_with_hemoglobin(mut self, date: &str, hemoglobin: f64) -> Self {
        self.labs.push(format!(
            "{},{date},{hemoglobin},180,250000,7000,5.2,1.0,14,140,4.2,9.4",
            self.id
        ));
        self
    }

    /// Write the patient folder under `root`. A fixture with no lab rows
    /// writes no lab file at all, which the loaders report as a missing
    /// source.
    pub fn write_to(&self, root: &Path) -> Result<PathBuf> {
        let dir = root.join(&self.id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating patient folder {}", dir.display()))?;
        write_table(
            &dir.join("blood_monitoring.csv"),
            VITALS_HEADER,
            &self.vitals,
        )?;
        write_table(&dir.join("bp_monitoring.csv"), BP_HEADER, &self.bp)?;
        if !self.labs.is_empty() {
            write_table(&dir.join("lab_results.csv"), LABS_HEADER, &self.labs)?;
        }
        Ok(dir)
    }
}

fn write_table(path: &Path, header: &str, rows: &[String]) -> Result<()> {
    let mut table = String::from(header);
    for row in rows {
        table.push('\n');
        table.push_str(row);
    }
    table.push('\n');
    fs::write(path, table).with_context(|| format!("writing {}", path.display()))
}

// ---------------------------------------------------------------------------
// Canonical dataset checks
// ---------------------------------------------------------------------------

/// Load a canonical dataset and re-assert its structural invariants:
/// ascending `(date, time, patient)` order and no gap cells anywhere.
pub fn load_canonical_checked(path: &Path) -> Result<Vec<TimelineRow>> {
    let rows = load_canonical(path)
        .with_context(|| format!("loading canonical dataset {}", path.display()))?;
    for pair in rows.windows(2) {
        if (pair[1].stamp, &pair[1].patient) < (pair[0].stamp, &pair[0].patient) {
            bail!(
                "canonical rows out of order at {} {}",
                pair[1].patient,
                pair[1].stamp
            );
        }
    }
    for row in &rows {
        if !row.is_complete() {
            bail!("canonical row {} {} carries a gap", row.patient, row.stamp);
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
