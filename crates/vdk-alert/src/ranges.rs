//! Normal-range configuration.
//!
//! Keyed by metric label rather than by [`Metric`] so a deployment's JSON
//! override can drop a range (making that metric unclassified) or carry
//! ranges for columns this build does not know about.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use vdk_schemas::Metric;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors loading a range table from JSON.
#[derive(Debug)]
pub enum RangeTableError {
    /// An I/O error reading the file.
    Io(String),
    /// The JSON did not parse, or a range is inverted.
    Parse(String),
}

impl fmt::Display for RangeTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeTableError::Io(msg) => write!(f, "range table io error: {msg}"),
            RangeTableError::Parse(msg) => write!(f, "range table parse error: {msg}"),
        }
    }
}

impl std::error::Error for RangeTableError {}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Inclusive normal range for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalRange {
    pub low: f64,
    pub high: f64,
}

/// Metric label → normal range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeTable {
    ranges: BTreeMap<String, NormalRange>,
}

impl RangeTable {
    /// A table with no ranges: everything classifies as unclassified.
    pub fn empty() -> Self {
        RangeTable {
            ranges: BTreeMap::new(),
        }
    }

    /// The clinical normal ranges the original deployment shipped with, one
    /// per canonical metric.
    pub fn clinical_defaults() -> Self {
        let entries: [(Metric, f64, f64); Metric::COUNT] = [
            (Metric::BloodGlucose, 70.0, 140.0),
            (Metric::SpO2, 90.0, 100.0),
            (Metric::Ecg, 0.5, 1.5),
            (Metric::Hydration, 50.0, 70.0),
            (Metric::HeartRate, 50.0, 110.0),
            (Metric::RespiratoryRate, 12.0, 20.0),
            (Metric::BodyTemperature, 36.1, 37.8),
            (Metric::SystolicBp, 90.0, 140.0),
            (Metric::DiastolicBp, 60.0, 90.0),
            (Metric::Hemoglobin, 12.0, 18.0),
            (Metric::Cholesterol, 100.0, 200.0),
            (Metric::PlateletCount, 150_000.0, 450_000.0),
            (Metric::WbcCount, 4_000.0, 11_000.0),
            (Metric::RbcCount, 4.7, 6.1),
            (Metric::Creatinine, 0.7, 1.3),
            (Metric::Urea, 7.0, 20.0),
            (Metric::Sodium, 135.0, 145.0),
            (Metric::Potassium, 3.5, 5.1),
            (Metric::Calcium, 8.5, 10.5),
        ];
        let mut table = RangeTable::empty();
        for (metric, low, high) in entries {
            table.set(metric.label(), low, high);
        }
        table
    }

    pub fn set(&mut self, label: impl Into<String>, low: f64, high: f64) {
        self.ranges.insert(label.into(), NormalRange { low, high });
    }

    /// Drop a range; that metric then classifies as unclassified.
    pub fn remove(&mut self, label: &str) -> Option<NormalRange> {
        self.ranges.remove(label)
    }

    /// Range for a canonical metric, if one is configured.
    pub fn get(&self, metric: Metric) -> Option<NormalRange> {
        self.get_label(metric.label())
    }

    pub fn get_label(&self, label: &str) -> Option<NormalRange> {
        self.ranges.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Parse a table from JSON (`{"Heart_Rate": {"low": 50, "high": 110}}`).
    ///
    /// An inverted range (`low > high`) would classify everything critical,
    /// so it is rejected here at the load boundary.
    pub fn from_json_str(src: &str) -> Result<Self, RangeTableError> {
        let table: RangeTable =
            serde_json::from_str(src).map_err(|e| RangeTableError::Parse(e.to_string()))?;
        for (label, range) in &table.ranges {
            if range.low > range.high {
                return Err(RangeTableError::Parse(format!(
                    "inverted range for '{label}': low {} > high {}",
                    range.low, range.high
                )));
            }
        }
        Ok(table)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, RangeTableError> {
        let src = std::fs::read_to_string(path)
            .map_err(|e| RangeTableError::Io(format!("read '{}': {e}", path.display())))?;
        Self::from_json_str(&src)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
