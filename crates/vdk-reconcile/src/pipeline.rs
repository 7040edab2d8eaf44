//! Batch driver: data root in, canonical rows out.
//!
//! One invocation walks every patient folder under the data root and runs the
//! full reconciliation chain per patient: load, merge the continuous pair,
//! enrich with labs, forward-fill. The assembler then concatenates all
//! patients. Per-patient failures never abort the batch; they land in the
//! run's diagnostics and reports. The only terminal condition is a data root
//! that does not resolve, or a run where no patient yields a single canonical
//! row.
//!
//! Re-running over identical inputs rebuilds the same rows wholesale; nothing
//! is patched incrementally.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use vdk_ingest::{load_patient_dir, scan_patients, LoadDiagnostics, LoadError};
use vdk_schemas::{PatientId, TimelineRow};

use crate::assemble::{assemble, AssembleOptions, AssembleReport};
use crate::fill::forward_fill;
use crate::labs::{enrich_with_labs, LabReport};
use crate::merge::merge_continuous;

// ---------------------------------------------------------------------------
// Options, result, error
// ---------------------------------------------------------------------------

/// Options for one merge run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Keep only the most recent N rows per patient (see
    /// [`AssembleOptions::per_patient_cap`]).
    pub per_patient_cap: Option<usize>,
}

/// Everything a completed merge run produced.
#[derive(Debug)]
pub struct MergeRun {
    /// Canonical rows: globally sorted, gap-free, one per `(patient, stamp)`.
    pub rows: Vec<TimelineRow>,
    /// Per-file load outcomes for the whole batch.
    pub diagnostics: LoadDiagnostics,
    /// Per-patient lab enrichment accounting, including skips.
    pub lab_reports: BTreeMap<PatientId, LabReport>,
    /// Per-patient row accounting from assembly.
    pub report: AssembleReport,
}

/// Terminal failures of a merge run.
#[derive(Debug)]
pub enum PipelineError {
    /// Every patient was skipped or dropped: zero canonical rows assembled.
    NoUsableData,
    /// The data root itself did not resolve.
    Root(LoadError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::NoUsableData => {
                write!(f, "no usable patient data: zero canonical rows assembled")
            }
            PipelineError::Root(e) => write!(f, "data root: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<LoadError> for PipelineError {
    fn from(e: LoadError) -> Self {
        PipelineError::Root(e)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Run the full merge pipeline over every patient folder under `root`.
///
/// Patients are processed in id order, one at a time; no state crosses a
/// patient boundary before the final assembly. A patient whose sources are
/// missing or broken contributes zero rows and shows up in the diagnostics
/// and lab reports rather than failing the run.
pub fn run_merge(root: &Path, options: &PipelineOptions) -> Result<MergeRun, PipelineError> {
    let patients = scan_patients(root)?;

    let mut diagnostics = LoadDiagnostics::new();
    let mut lab_reports = BTreeMap::new();
    let mut all_rows: Vec<TimelineRow> = Vec::new();

    for (patient, dir) in &patients {
        let sources = load_patient_dir(patient, dir, &mut diagnostics);
        let mut timeline = merge_continuous(&sources.vitals, &sources.bp);
        let lab_report = enrich_with_labs(&mut timeline, &sources.labs);
        forward_fill(&mut timeline);
        lab_reports.insert(patient.clone(), lab_report);
        all_rows.extend(timeline);
    }

    let (rows, report) = assemble(
        all_rows,
        &AssembleOptions {
            per_patient_cap: options.per_patient_cap,
        },
    );

    if rows.is_empty() {
        return Err(PipelineError::NoUsableData);
    }

    Ok(MergeRun {
        rows,
        diagnostics,
        lab_reports,
        report,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
