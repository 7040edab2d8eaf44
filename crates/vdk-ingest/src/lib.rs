//! Raw-source ingestion for the VitalDesk pipeline.
//!
//! Reads the three per-patient source tables (blood-chemistry monitor,
//! blood-pressure monitor, lab panels) into typed readings, and accumulates
//! per-file load diagnostics for the run.
//!
//! Loaders fail only structurally: a file that does not resolve
//! ([`LoadError::SourceUnavailable`]) or a header missing a required key
//! column ([`LoadError::MissingColumn`]). Per-row damage — malformed dates,
//! blank patient ids, unparseable numeric cells — never aborts a load: the
//! row is excluded or the cell becomes a gap, and the exclusion is counted.
//!
//! This crate does **not**:
//! - merge, fill, or sort timelines (see `vdk-reconcile`)
//! - persist anything

mod batch;
mod diagnostics;
mod loader;

pub use batch::{load_patient_dir, scan_patients, source_file_name, PatientSources};
pub use diagnostics::{LoadDiagnostics, SourceOutcome, SourceRecord};
pub use loader::{
    load_bp_csv, load_bp_str, load_labs_csv, load_labs_str, load_vitals_csv, load_vitals_str,
    LoadError, TableLoad,
};
