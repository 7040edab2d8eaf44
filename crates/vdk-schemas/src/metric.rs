//! The canonical metric catalog.
//!
//! Every numeric column that can appear in the canonical dataset is declared
//! here with a stable order, a CSV label, and the source that owns it. The
//! merged row shape is closed: downstream code addresses columns by [`Metric`]
//! rather than by string, so a misspelled column is a compile error, not a
//! silent gap.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SourceKind
// ---------------------------------------------------------------------------

/// The three upstream tables a metric can originate from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SourceKind {
    /// Blood-chemistry monitor (continuous).
    Vitals,
    /// Blood-pressure monitor (continuous).
    BloodPressure,
    /// Lab panel (sparse, at most one per calendar day).
    Lab,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] =
        [SourceKind::Vitals, SourceKind::BloodPressure, SourceKind::Lab];

    /// Canonical source name. Doubles as the input file stem and, for the
    /// continuous sources, the streaming topic name.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Vitals => "blood_monitoring",
            SourceKind::BloodPressure => "bp_monitoring",
            SourceKind::Lab => "lab_results",
        }
    }

    /// Continuous sources carry a time-of-day; the lab source is date-keyed.
    pub fn is_continuous(self) -> bool {
        !matches!(self, SourceKind::Lab)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// One canonical metric column.
///
/// Declaration order is the canonical column order; [`Metric::index`] relies
/// on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    // blood-chemistry monitor
    BloodGlucose,
    SpO2,
    Ecg,
    Hydration,
    HeartRate,
    RespiratoryRate,
    BodyTemperature,
    // blood-pressure monitor
    SystolicBp,
    DiastolicBp,
    // lab panel
    Hemoglobin,
    Cholesterol,
    PlateletCount,
    WbcCount,
    RbcCount,
    Creatinine,
    Urea,
    Sodium,
    Potassium,
    Calcium,
}

impl Metric {
    /// All metrics in canonical column order: vitals, then blood pressure,
    /// then labs.
    pub const ALL: [Metric; 19] = [
        Metric::BloodGlucose,
        Metric::SpO2,
        Metric::Ecg,
        Metric::Hydration,
        Metric::HeartRate,
        Metric::RespiratoryRate,
        Metric::BodyTemperature,
        Metric::SystolicBp,
        Metric::DiastolicBp,
        Metric::Hemoglobin,
        Metric::Cholesterol,
        Metric::PlateletCount,
        Metric::WbcCount,
        Metric::RbcCount,
        Metric::Creatinine,
        Metric::Urea,
        Metric::Sodium,
        Metric::Potassium,
        Metric::Calcium,
    ];

    /// Number of metric columns in the canonical dataset.
    pub const COUNT: usize = Metric::ALL.len();

    /// Position of this metric in [`Metric::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column label used in the canonical dataset header.
    pub fn label(self) -> &'static str {
        match self {
            Metric::BloodGlucose => "Blood_Glucose",
            Metric::SpO2 => "SpO2",
            Metric::Ecg => "ECG",
            Metric::Hydration => "Hydration",
            Metric::HeartRate => "Heart_Rate",
            Metric::RespiratoryRate => "Respiratory_Rate",
            Metric::BodyTemperature => "Body_Temperature",
            Metric::SystolicBp => "Systolic_BP",
            Metric::DiastolicBp => "Diastolic_BP",
            Metric::Hemoglobin => "Hemoglobin",
            Metric::Cholesterol => "Cholesterol",
            Metric::PlateletCount => "Platelet_Count",
            Metric::WbcCount => "WBC_Count",
            Metric::RbcCount => "RBC_Count",
            Metric::Creatinine => "Creatinine",
            Metric::Urea => "Urea",
            Metric::Sodium => "Sodium",
            Metric::Potassium => "Potassium",
            Metric::Calcium => "Calcium",
        }
    }

    /// The source table this metric originates from.
    pub fn source(self) -> SourceKind {
        match self {
            Metric::BloodGlucose
            | Metric::SpO2
            | Metric::Ecg
            | Metric::Hydration
            | Metric::HeartRate
            | Metric::RespiratoryRate
            | Metric::BodyTemperature => SourceKind::Vitals,
            Metric::SystolicBp | Metric::DiastolicBp => SourceKind::BloodPressure,
            Metric::Hemoglobin
            | Metric::Cholesterol
            | Metric::PlateletCount
            | Metric::WbcCount
            | Metric::RbcCount
            | Metric::Creatinine
            | Metric::Urea
            | Metric::Sodium
            | Metric::Potassium
            | Metric::Calcium => SourceKind::Lab,
        }
    }

    /// Look up a metric by its canonical label (exact match).
    pub fn from_label(label: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.label() == label)
    }

    /// Metrics owned by one source, in canonical order.
    pub fn of_source(kind: SourceKind) -> impl Iterator<Item = Metric> {
        Metric::ALL.into_iter().filter(move |m| m.source() == kind)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
