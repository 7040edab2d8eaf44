//! The merged timeline row.

use crate::metric::Metric;
use crate::stamp::{PatientId, Stamp};

/// One merged row of a patient timeline: every canonical metric column,
/// addressed by [`Metric`]. Absent values are gaps, never zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow {
    pub patient: PatientId,
    pub stamp: Stamp,
    values: [Option<f64>; Metric::COUNT],
}

impl TimelineRow {
    /// A fully gapped row for the given key.
    pub fn empty(patient: PatientId, stamp: Stamp) -> Self {
        TimelineRow {
            patient,
            stamp,
            values: [None; Metric::COUNT],
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric.index()] = value;
    }

    /// Write `value` only when the column is currently a gap. A present value
    /// is never overwritten.
    pub fn fill_gap(&mut self, metric: Metric, value: Option<f64>) {
        let slot = &mut self.values[metric.index()];
        if slot.is_none() {
            *slot = value;
        }
    }

    /// True when every canonical column is populated.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|v| v.is_some())
    }

    /// Columns still gapped, in canonical order.
    pub fn gaps(&self) -> Vec<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|m| self.get(*m).is_none())
            .collect()
    }

    /// Metric/value pairs in canonical column order.
    pub fn columns(&self) -> impl Iterator<Item = (Metric, Option<f64>)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// All values in canonical column order, or `None` if any gap remains.
    pub fn dense_values(&self) -> Option<[f64; Metric::COUNT]> {
        let mut out = [0.0; Metric::COUNT];
        for (slot, value) in out.iter_mut().zip(self.values.iter()) {
            *slot = (*value)?;
        }
        Some(out)
    }
}
