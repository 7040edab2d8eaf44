//! Per-patient batch loading.
//!
//! Input layout: one folder per patient under a data root, each folder
//! holding up to three source files named by [`SourceKind::as_str`]
//! (`blood_monitoring.csv`, `bp_monitoring.csv`, `lab_results.csv`). Every
//! file load lands as one record in the run's [`LoadDiagnostics`]; a missing
//! or broken file never aborts the batch.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use vdk_schemas::{BpReading, LabPanel, PatientId, SourceKind, VitalsReading};

use crate::diagnostics::LoadDiagnostics;
use crate::loader::{self, LoadError, TableLoad};

/// The three source tables for one patient, as far as they loaded. A failed
/// or missing source is simply empty here; the reason lives in the
/// diagnostics.
#[derive(Debug, Clone)]
pub struct PatientSources {
    pub patient: PatientId,
    pub vitals: Vec<VitalsReading>,
    pub bp: Vec<BpReading>,
    pub labs: Vec<LabPanel>,
}

/// File name for one source table inside a patient folder.
pub fn source_file_name(kind: SourceKind) -> String {
    format!("{}.csv", kind.as_str())
}

/// Enumerate patient folders under `root`, sorted by patient id.
///
/// Every direct subdirectory is one patient; its name is the patient id.
/// Fails only when the root itself does not resolve.
pub fn scan_patients(root: &Path) -> Result<Vec<(PatientId, PathBuf)>, LoadError> {
    let entries = std::fs::read_dir(root).map_err(|e| LoadError::SourceUnavailable {
        path: root.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut patients = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LoadError::SourceUnavailable {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;
        let path = entry.path();
        if path.is_dir() {
            let name = entry.file_name().to_string_lossy().into_owned();
            patients.push((PatientId::new(name), path));
        }
    }
    patients.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(patients)
}

/// Load all three sources from one patient folder, recording one outcome per
/// file in `diag`.
pub fn load_patient_dir(
    patient: &PatientId,
    dir: &Path,
    diag: &mut LoadDiagnostics,
) -> PatientSources {
    let vitals = run_load(
        patient,
        SourceKind::Vitals,
        loader::load_vitals_csv(&dir.join(source_file_name(SourceKind::Vitals))),
        diag,
    );
    let bp = run_load(
        patient,
        SourceKind::BloodPressure,
        loader::load_bp_csv(&dir.join(source_file_name(SourceKind::BloodPressure))),
        diag,
    );
    let labs = run_load(
        patient,
        SourceKind::Lab,
        loader::load_labs_csv(&dir.join(source_file_name(SourceKind::Lab))),
        diag,
    );
    PatientSources {
        patient: patient.clone(),
        vitals,
        bp,
        labs,
    }
}

fn run_load<T>(
    patient: &PatientId,
    source: SourceKind,
    result: Result<TableLoad<T>, LoadError>,
    diag: &mut LoadDiagnostics,
) -> Vec<T> {
    match result {
        Ok(load) => {
            info!(
                patient = %patient,
                source = %source,
                rows = load.rows.len(),
                rows_without_key = load.rows_without_key,
                "source loaded"
            );
            diag.record_loaded(
                patient.clone(),
                source,
                load.rows.len(),
                load.rows_without_key,
            );
            load.rows
        }
        Err(e) => {
            warn!(patient = %patient, source = %source, error = %e, "source skipped");
            diag.record_failure(patient.clone(), source, e.to_string());
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
