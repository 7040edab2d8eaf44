//! Classification and per-patient severity.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use vdk_schemas::{Metric, PatientId};

use crate::ranges::RangeTable;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Round to two decimal places, the fixed comparison precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Grade of one predicted value against its normal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// Outside the inclusive `[low, high]` range.
    Critical,
    /// Inside the range.
    Normal,
    /// No range configured for this metric.
    Unclassified,
}

/// Classify one metric value. The value is rounded to two decimal places
/// before comparison; both bounds are inclusive.
pub fn classify(table: &RangeTable, metric: Metric, value: f64) -> Classification {
    match table.get(metric) {
        None => Classification::Unclassified,
        Some(range) => {
            let v = round2(value);
            if v < range.low || v > range.high {
                Classification::Critical
            } else {
                Classification::Normal
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-patient evaluation
// ---------------------------------------------------------------------------

/// Severity policy: a patient whose critical count exceeds
/// `high_severity_above` is flagged for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub high_severity_above: usize,
}

impl AlertPolicy {
    pub fn sane_defaults() -> Self {
        AlertPolicy {
            high_severity_above: 2,
        }
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::sane_defaults()
    }
}

/// One critical metric in a patient's predicted row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalFinding {
    /// Canonical metric label.
    pub metric: String,
    /// The offending value, rounded to two decimal places.
    pub value: f64,
    pub low: f64,
    pub high: f64,
}

/// Evaluation of one patient's predicted row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientAlert {
    pub critical: Vec<CriticalFinding>,
    pub normal: usize,
    pub unclassified: usize,
    /// Critical count exceeded the policy threshold.
    pub high_severity: bool,
}

impl PatientAlert {
    pub fn critical_count(&self) -> usize {
        self.critical.len()
    }
}

/// Evaluate one predicted row in canonical column order.
pub fn evaluate_prediction(
    table: &RangeTable,
    policy: &AlertPolicy,
    values: &[f64; Metric::COUNT],
) -> PatientAlert {
    let mut alert = PatientAlert {
        critical: Vec::new(),
        normal: 0,
        unclassified: 0,
        high_severity: false,
    };
    for metric in Metric::ALL {
        let value = values[metric.index()];
        match classify(table, metric, value) {
            Classification::Critical => {
                // classify() only returns Critical when a range exists
                if let Some(range) = table.get(metric) {
                    alert.critical.push(CriticalFinding {
                        metric: metric.label().to_string(),
                        value: round2(value),
                        low: range.low,
                        high: range.high,
                    });
                }
            }
            Classification::Normal => alert.normal += 1,
            Classification::Unclassified => alert.unclassified += 1,
        }
    }
    alert.high_severity = alert.critical_count() > policy.high_severity_above;
    alert
}

// ---------------------------------------------------------------------------
// Batch report
// ---------------------------------------------------------------------------

/// Alert evaluation across a whole forecast pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertReport {
    pub alerts: BTreeMap<PatientId, PatientAlert>,
}

impl AlertReport {
    /// Patients flagged high-severity, in id order.
    pub fn high_severity(&self) -> impl Iterator<Item = &PatientId> {
        self.alerts
            .iter()
            .filter(|(_, a)| a.high_severity)
            .map(|(p, _)| p)
    }

    pub fn total_critical(&self) -> usize {
        self.alerts.values().map(PatientAlert::critical_count).sum()
    }

    /// True when no patient has a single critical metric.
    pub fn is_clean(&self) -> bool {
        self.alerts.values().all(|a| a.critical.is_empty())
    }
}

impl fmt::Display for AlertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AlertReport {{")?;
        writeln!(f, "  patients: {}", self.alerts.len())?;
        writeln!(f, "  total_critical: {}", self.total_critical())?;
        for (patient, alert) in &self.alerts {
            if alert.critical.is_empty() {
                continue;
            }
            let flag = if alert.high_severity { " HIGH" } else { "" };
            writeln!(f, "  {patient}: {} critical{flag}", alert.critical_count())?;
            for finding in &alert.critical {
                writeln!(
                    f,
                    "    {} = {} (normal {}..{})",
                    finding.metric, finding.value, finding.low, finding.high
                )?;
            }
        }
        write!(f, "}}")
    }
}

/// Evaluate every patient's predicted row.
pub fn evaluate_batch(
    table: &RangeTable,
    policy: &AlertPolicy,
    predictions: &BTreeMap<PatientId, [f64; Metric::COUNT]>,
) -> AlertReport {
    let mut report = AlertReport::default();
    for (patient, values) in predictions {
        report
            .alerts
            .insert(patient.clone(), evaluate_prediction(table, policy, values));
    }
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
