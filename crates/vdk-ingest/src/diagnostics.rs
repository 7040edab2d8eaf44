//! Load-run diagnostics.
//!
//! The loader stage reports per-file outcomes through an explicit accumulator
//! handed down by the caller, never through process-wide state. The finished
//! [`LoadDiagnostics`] travels with the run report; its counts are part of
//! the pipeline health signal.

use std::fmt;

use serde::Serialize;

use vdk_schemas::{PatientId, SourceKind};

/// Outcome of loading one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SourceOutcome {
    /// The file parsed: `rows` usable readings, `rows_without_key` excluded.
    Loaded { rows: usize, rows_without_key: usize },
    /// The file was skipped outright (missing file or missing key column).
    Failed { reason: String },
}

/// One diagnostic record: which patient, which source, what happened.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRecord {
    pub patient: PatientId,
    pub source: SourceKind,
    pub outcome: SourceOutcome,
}

/// Accumulated per-file outcomes for a batch run, in load order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadDiagnostics {
    pub records: Vec<SourceRecord>,
}

impl LoadDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_loaded(
        &mut self,
        patient: PatientId,
        source: SourceKind,
        rows: usize,
        rows_without_key: usize,
    ) {
        self.records.push(SourceRecord {
            patient,
            source,
            outcome: SourceOutcome::Loaded {
                rows,
                rows_without_key,
            },
        });
    }

    pub fn record_failure(
        &mut self,
        patient: PatientId,
        source: SourceKind,
        reason: impl Into<String>,
    ) {
        self.records.push(SourceRecord {
            patient,
            source,
            outcome: SourceOutcome::Failed {
                reason: reason.into(),
            },
        });
    }

    /// Records whose source was skipped outright.
    pub fn failures(&self) -> impl Iterator<Item = &SourceRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, SourceOutcome::Failed { .. }))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Total usable rows across all loaded files.
    pub fn loaded_rows(&self) -> usize {
        self.records
            .iter()
            .map(|r| match &r.outcome {
                SourceOutcome::Loaded { rows, .. } => *rows,
                SourceOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Rows excluded for missing chronological keys, across all files.
    pub fn rows_without_key(&self) -> usize {
        self.records
            .iter()
            .map(|r| match &r.outcome {
                SourceOutcome::Loaded {
                    rows_without_key, ..
                } => *rows_without_key,
                SourceOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// True when every file loaded and no row was excluded.
    pub fn is_clean(&self) -> bool {
        self.records.iter().all(|r| {
            matches!(
                r.outcome,
                SourceOutcome::Loaded {
                    rows_without_key: 0,
                    ..
                }
            )
        })
    }
}

impl fmt::Display for LoadDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LoadDiagnostics {{")?;
        writeln!(f, "  files: {}", self.records.len())?;
        writeln!(f, "  loaded_rows: {}", self.loaded_rows())?;
        writeln!(f, "  rows_without_key: {}", self.rows_without_key())?;
        writeln!(f, "  failures: {}", self.failure_count())?;
        for r in self.failures() {
            if let SourceOutcome::Failed { reason } = &r.outcome {
                writeln!(f, "    {}/{}: {}", r.patient, r.source, reason)?;
            }
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
