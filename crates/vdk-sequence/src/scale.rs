//! Per-patient min-max normalization.
//!
//! The forecaster consumes values in `[0, 1]`; its predictions come back in
//! the same space and are mapped back with [`MinMaxScaler::inverse_transform`].
//! One scaler is fit per patient over that patient's full timeline, so one
//! patient's extremes never distort another's scale.

use vdk_schemas::Metric;

/// Column-wise min-max scaler over dense metric vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: [f64; Metric::COUNT],
    max: [f64; Metric::COUNT],
}

impl MinMaxScaler {
    /// Fit over every row of one patient's dense timeline. `None` when there
    /// is nothing to fit on.
    pub fn fit(rows: &[[f64; Metric::COUNT]]) -> Option<MinMaxScaler> {
        let (first, rest) = rows.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for row in rest {
            for (i, value) in row.iter().enumerate() {
                if *value < min[i] {
                    min[i] = *value;
                }
                if *value > max[i] {
                    max[i] = *value;
                }
            }
        }
        Some(MinMaxScaler { min, max })
    }

    /// Map one row into `[0, 1]` per column. A constant column maps to 0.0.
    pub fn transform(&self, row: &[f64; Metric::COUNT]) -> [f64; Metric::COUNT] {
        let mut out = [0.0; Metric::COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            let span = self.max[i] - self.min[i];
            if span != 0.0 {
                *slot = (row[i] - self.min[i]) / span;
            }
        }
        out
    }

    pub fn transform_all(&self, rows: &[[f64; Metric::COUNT]]) -> Vec<[f64; Metric::COUNT]> {
        rows.iter().map(|row| self.transform(row)).collect()
    }

    /// Map a scaled row back to original units. A constant column comes back
    /// as its fitted value regardless of the scaled input.
    pub fn inverse_transform(&self, row: &[f64; Metric::COUNT]) -> [f64; Metric::COUNT] {
        let mut out = [0.0; Metric::COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            let span = self.max[i] - self.min[i];
            *slot = self.min[i] + row[i] * span;
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
