//! Canonical dataset IO.
//!
//! The assembler's output is persisted as a single CSV with a fixed header:
//! `Patient_ID, Date, Time,` then every metric label in catalog order. This
//! module owns both directions. Unlike the raw source loaders, the reader
//! here is **strict**: the file is our own artifact, so a missing column or
//! an unparseable cell means corruption and fails the load instead of being
//! skipped.

use std::fmt;
use std::path::Path;

use vdk_schemas::{Metric, PatientId, Stamp, TimelineRow};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from reading or writing the canonical dataset file.
#[derive(Debug)]
pub enum DatasetError {
    /// An I/O or CSV-library error.
    Io(String),
    /// The header row is missing a canonical column.
    MissingColumn(String),
    /// A data row violates the canonical contract.
    BadRow { row: usize, reason: String },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io(msg) => write!(f, "dataset io error: {msg}"),
            DatasetError::MissingColumn(col) => {
                write!(f, "canonical dataset missing column: '{col}'")
            }
            DatasetError::BadRow { row, reason } => {
                write!(f, "canonical dataset row {row}: {reason}")
            }
        }
    }
}

impl std::error::Error for DatasetError {}

// ---------------------------------------------------------------------------
// Header contract
// ---------------------------------------------------------------------------

/// The canonical column order: key columns, then every metric label.
pub fn canonical_header() -> Vec<&'static str> {
    let mut header = vec!["Patient_ID", "Date", "Time"];
    header.extend(Metric::ALL.into_iter().map(Metric::label));
    header
}

// ---------------------------------------------------------------------------
// Write
// ---------------------------------------------------------------------------

/// Persist rows to `path` in canonical column order.
///
/// Rows are written in the order given; the assembler has already imposed the
/// global sort. Gap columns serialize as empty cells.
pub fn write_canonical(path: &Path, rows: &[TimelineRow]) -> Result<(), DatasetError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| DatasetError::Io(format!("create '{}': {e}", path.display())))?;

    writer
        .write_record(canonical_header())
        .map_err(|e| DatasetError::Io(e.to_string()))?;

    for row in rows {
        let mut record: Vec<String> = Vec::with_capacity(3 + Metric::COUNT);
        record.push(row.patient.as_str().to_string());
        record.push(row.stamp.date_text());
        record.push(row.stamp.time_text());
        for (_, value) in row.columns() {
            record.push(value.map(|v| v.to_string()).unwrap_or_default());
        }
        writer
            .write_record(&record)
            .map_err(|e| DatasetError::Io(e.to_string()))?;
    }

    writer.flush().map_err(|e| DatasetError::Io(e.to_string()))
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read a canonical dataset back from `path`.
///
/// Every canonical column must be present (exact labels). Empty metric cells
/// load as gaps so the writer round-trips; anything else unparseable is a
/// [`DatasetError::BadRow`]. Row numbers in errors are 1-based with the
/// header as row 1.
pub fn load_canonical(path: &Path) -> Result<Vec<TimelineRow>, DatasetError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| DatasetError::Io(format!("open '{}': {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| DatasetError::Io(e.to_string()))?
        .clone();

    let position = |label: &str| -> Result<usize, DatasetError> {
        headers
            .iter()
            .position(|h| h.trim() == label)
            .ok_or_else(|| DatasetError::MissingColumn(label.to_string()))
    };

    let patient_col = position("Patient_ID")?;
    let date_col = position("Date")?;
    let time_col = position("Time")?;
    let mut metric_cols = [0usize; Metric::COUNT];
    for metric in Metric::ALL {
        metric_cols[metric.index()] = position(metric.label())?;
    }

    let mut out = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row_num = i + 2;
        let record = record.map_err(|e| DatasetError::Io(e.to_string()))?;

        let cell = |col: usize| record.get(col).unwrap_or("").trim();

        let patient = PatientId::new(cell(patient_col));
        if patient.is_blank() {
            return Err(DatasetError::BadRow {
                row: row_num,
                reason: "blank patient identifier".to_string(),
            });
        }

        let (date_text, time_text) = (cell(date_col), cell(time_col));
        let stamp = Stamp::parse(date_text, time_text).ok_or_else(|| DatasetError::BadRow {
            row: row_num,
            reason: format!("malformed stamp '{date_text} {time_text}'"),
        })?;

        let mut row = TimelineRow::empty(patient, stamp);
        for metric in Metric::ALL {
            let raw = cell(metric_cols[metric.index()]);
            if raw.is_empty() {
                continue;
            }
            let value: f64 = raw.parse().map_err(|_| DatasetError::BadRow {
                row: row_num,
                reason: format!("cannot parse {} from '{raw}'", metric.label()),
            })?;
            if !value.is_finite() {
                return Err(DatasetError::BadRow {
                    row: row_num,
                    reason: format!("non-finite {} value '{raw}'", metric.label()),
                });
            }
            row.set(metric, Some(value));
        }
        out.push(row);
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
