//! Per-source reading records.
//!
//! One struct per upstream table, with named numeric fields. Values are
//! `Option<f64>`: absent means a gap, never zero. Each record folds its
//! metrics into the `(Metric, value)` shape the merge stages consume.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metric::Metric;
use crate::stamp::{PatientId, Stamp};

// ---------------------------------------------------------------------------
// Continuous sources
// ---------------------------------------------------------------------------

/// One blood-chemistry monitor observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsReading {
    pub patient: PatientId,
    pub stamp: Stamp,
    pub glucose: Option<f64>,
    pub spo2: Option<f64>,
    pub ecg: Option<f64>,
    pub hydration: Option<f64>,
    pub heart_rate: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub body_temperature: Option<f64>,
}

impl VitalsReading {
    /// Metric/value pairs in canonical column order.
    pub fn metrics(&self) -> [(Metric, Option<f64>); 7] {
        [
            (Metric::BloodGlucose, self.glucose),
            (Metric::SpO2, self.spo2),
            (Metric::Ecg, self.ecg),
            (Metric::Hydration, self.hydration),
            (Metric::HeartRate, self.heart_rate),
            (Metric::RespiratoryRate, self.respiratory_rate),
            (Metric::BodyTemperature, self.body_temperature),
        ]
    }
}

/// One blood-pressure monitor observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpReading {
    pub patient: PatientId,
    pub stamp: Stamp,
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
}

impl BpReading {
    /// Metric/value pairs in canonical column order.
    pub fn metrics(&self) -> [(Metric, Option<f64>); 2] {
        [
            (Metric::SystolicBp, self.systolic),
            (Metric::DiastolicBp, self.diastolic),
        ]
    }

    /// Split a legacy combined blood-pressure cell (`"120/80"`) into
    /// `(systolic, diastolic)`. `None` when the cell is not two numbers
    /// separated by a slash.
    pub fn split_combined(text: &str) -> Option<(f64, f64)> {
        let (sys, dia) = text.trim().split_once('/')?;
        let systolic: f64 = sys.trim().parse().ok()?;
        let diastolic: f64 = dia.trim().parse().ok()?;
        Some((systolic, diastolic))
    }
}

// ---------------------------------------------------------------------------
// Lab panels
// ---------------------------------------------------------------------------

/// One lab panel. Sparse: at most one per patient per calendar day, keyed by
/// date alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabPanel {
    pub patient: PatientId,
    pub date: NaiveDate,
    /// Lab-side glucose. Present in raw files but never merged: the
    /// continuous monitor already owns the glucose column.
    pub glucose: Option<f64>,
    pub hemoglobin: Option<f64>,
    pub cholesterol: Option<f64>,
    pub platelet_count: Option<f64>,
    pub wbc_count: Option<f64>,
    pub rbc_count: Option<f64>,
    pub creatinine: Option<f64>,
    pub urea: Option<f64>,
    pub sodium: Option<f64>,
    pub potassium: Option<f64>,
    pub calcium: Option<f64>,
}

impl LabPanel {
    /// Metric/value pairs that may be merged onto a timeline, in canonical
    /// column order. Excludes the lab glucose.
    pub fn mergeable_metrics(&self) -> [(Metric, Option<f64>); 10] {
        [
            (Metric::Hemoglobin, self.hemoglobin),
            (Metric::Cholesterol, self.cholesterol),
            (Metric::PlateletCount, self.platelet_count),
            (Metric::WbcCount, self.wbc_count),
            (Metric::RbcCount, self.rbc_count),
            (Metric::Creatinine, self.creatinine),
            (Metric::Urea, self.urea),
            (Metric::Sodium, self.sodium),
            (Metric::Potassium, self.potassium),
            (Metric::Calcium, self.calcium),
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::SourceKind;

    // --- metric folding ---

    #[test]
    fn vitals_metrics_cover_the_vitals_source() {
        let reading = VitalsReading {
            patient: PatientId::new("P001"),
            stamp: Stamp::parse("01-01-2024", "08.00.00").unwrap(),
            glucose: Some(100.0),
            spo2: Some(97.0),
            ecg: None,
            hydration: Some(60.0),
            heart_rate: Some(72.0),
            respiratory_rate: Some(16.0),
            body_temperature: Some(36.8),
        };
        let metrics = reading.metrics();
        assert_eq!(metrics.len(), 7);
        for (m, _) in metrics {
            assert_eq!(m.source(), SourceKind::Vitals);
        }
        assert_eq!(metrics[0], (Metric::BloodGlucose, Some(100.0)));
        assert_eq!(metrics[2], (Metric::Ecg, None));
    }

    #[test]
    fn lab_mergeable_metrics_exclude_glucose() {
        let panel = LabPanel {
            patient: PatientId::new("P001"),
            date: Stamp::parse_date("01-01-2024").unwrap(),
            glucose: Some(95.0),
            hemoglobin: Some(14.0),
            cholesterol: Some(180.0),
            platelet_count: Some(250_000.0),
            wbc_count: Some(7_000.0),
            rbc_count: Some(5.0),
            creatinine: Some(1.0),
            urea: Some(12.0),
            sodium: Some(140.0),
            potassium: Some(4.2),
            calcium: Some(9.5),
        };
        let metrics = panel.mergeable_metrics();
        assert_eq!(metrics.len(), 10);
        assert!(metrics.iter().all(|(m, _)| m.source() == SourceKind::Lab));
        assert!(metrics.iter().all(|(m, _)| *m != Metric::BloodGlucose));
    }

    // --- combined blood pressure ---

    #[test]
    fn splits_combined_blood_pressure() {
        assert_eq!(BpReading::split_combined("120/80"), Some((120.0, 80.0)));
        assert_eq!(BpReading::split_combined(" 135 / 85 "), Some((135.0, 85.0)));
        assert_eq!(BpReading::split_combined("118.5/79.5"), Some((118.5, 79.5)));
    }

    #[test]
    fn rejects_malformed_combined_blood_pressure() {
        assert_eq!(BpReading::split_combined("120"), None);
        assert_eq!(BpReading::split_combined("120/"), None);
        assert_eq!(BpReading::split_combined("/80"), None);
        assert_eq!(BpReading::split_combined("high/low"), None);
        assert_eq!(BpReading::split_combined(""), None);
    }
}
