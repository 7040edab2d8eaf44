//! Column-by-column drift report over two canonical datasets.
//!
//! [`compare_datasets`] treats each metric column of a baseline and a
//! current dataset as two samples (gaps dropped), runs the KS test and the
//! Wasserstein distance against [`DriftThresholds`], and collects a
//! [`DriftReport`]. Concept drift over forecast error is a separate check
//! ([`concept_drift`]) because it needs predictions, not datasets.

use std::fmt;

use serde::Serialize;
use vdk_schemas::{Metric, TimelineRow};

use crate::stats::{ks_test, wasserstein_distance, KsTest};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Decision thresholds for the drift checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftThresholds {
    /// A column drifts when its KS p-value falls below this.
    pub ks_p_value: f64,
    /// A column drifts when its Wasserstein distance exceeds this.
    pub wasserstein: f64,
    /// Concept drift when `current_mse > baseline_mse * mse_ratio`.
    pub mse_ratio: f64,
}

impl DriftThresholds {
    /// Conventional defaults: `p < 0.05`, distance `> 0.2`, MSE ratio `1.5`.
    pub fn sane_defaults() -> Self {
        Self {
            ks_p_value: 0.05,
            wasserstein: 0.2,
            mse_ratio: 1.5,
        }
    }
}

impl Default for DriftThresholds {
    fn default() -> Self {
        Self::sane_defaults()
    }
}

// ---------------------------------------------------------------------------
// Per-column outcome
// ---------------------------------------------------------------------------

/// Drift verdict for one metric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDrift {
    /// Canonical column label.
    pub metric: String,
    /// Non-gap values on the baseline side.
    pub baseline_n: usize,
    /// Non-gap values on the current side.
    pub current_n: usize,
    pub ks: KsTest,
    pub wasserstein: f64,
    /// `ks.p_value < thresholds.ks_p_value`.
    pub ks_drift: bool,
    /// `wasserstein > thresholds.wasserstein`.
    pub wasserstein_drift: bool,
}

impl ColumnDrift {
    /// True when either statistic crossed its threshold.
    pub fn is_drifted(&self) -> bool {
        self.ks_drift || self.wasserstein_drift
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Column-by-column comparison of two canonical datasets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftReport {
    pub baseline_rows: usize,
    pub current_rows: usize,
    /// One entry per testable column, in canonical metric order.
    pub columns: Vec<ColumnDrift>,
    /// Labels of columns with no values on at least one side; these carry
    /// no verdict.
    pub skipped_columns: Vec<String>,
}

impl DriftReport {
    /// Columns whose verdict is drift, in canonical metric order.
    pub fn drifted(&self) -> impl Iterator<Item = &ColumnDrift> {
        self.columns.iter().filter(|c| c.is_drifted())
    }

    pub fn drifted_count(&self) -> usize {
        self.drifted().count()
    }

    /// Returns `true` when no tested column drifted. Skipped columns do not
    /// count as drift.
    pub fn is_clean(&self) -> bool {
        self.drifted_count() == 0
    }
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DriftReport {{")?;
        writeln!(f, "  baseline_rows: {}", self.baseline_rows)?;
        writeln!(f, "  current_rows: {}", self.current_rows)?;
        writeln!(f, "  columns_tested: {}", self.columns.len())?;
        writeln!(f, "  skipped_columns: {}", self.skipped_columns.len())?;
        for label in &self.skipped_columns {
            writeln!(f, "    {label}")?;
        }
        writeln!(f, "  drifted_columns: {}", self.drifted_count())?;
        for column in self.drifted() {
            writeln!(
                f,
                "    column={} ks_stat={:.4} ks_p={:.4} wd={:.4} ks_drift={} wd_drift={}",
                column.metric,
                column.ks.statistic,
                column.ks.p_value,
                column.wasserstein,
                column.ks_drift,
                column.wasserstein_drift
            )?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Dataset comparison
// ---------------------------------------------------------------------------

/// Compare every metric column of two canonical datasets.
///
/// Gap cells are dropped before testing. A column with no values on either
/// side is skipped, not drifted. Deterministic: columns are visited in
/// canonical metric order and row order never matters.
pub fn compare_datasets(
    baseline: &[TimelineRow],
    current: &[TimelineRow],
    thresholds: &DriftThresholds,
) -> DriftReport {
    let mut columns = Vec::new();
    let mut skipped_columns = Vec::new();

    for metric in Metric::ALL {
        let base_values = column_values(baseline, metric);
        let cur_values = column_values(current, metric);

        // One empty side means both statistics are undefined.
        let Some(ks) = ks_test(&base_values, &cur_values) else {
            skipped_columns.push(metric.label().to_string());
            continue;
        };
        let Some(wasserstein) = wasserstein_distance(&base_values, &cur_values) else {
            skipped_columns.push(metric.label().to_string());
            continue;
        };

        columns.push(ColumnDrift {
            metric: metric.label().to_string(),
            baseline_n: base_values.len(),
            current_n: cur_values.len(),
            ks_drift: ks.p_value < thresholds.ks_p_value,
            wasserstein_drift: wasserstein > thresholds.wasserstein,
            ks,
            wasserstein,
        });
    }

    DriftReport {
        baseline_rows: baseline.len(),
        current_rows: current.len(),
        columns,
        skipped_columns,
    }
}

/// Non-gap values of one metric column, in row order.
fn column_values(rows: &[TimelineRow], metric: Metric) -> Vec<f64> {
    rows.iter().filter_map(|row| row.get(metric)).collect()
}

// ---------------------------------------------------------------------------
// Concept drift
// ---------------------------------------------------------------------------

/// Forecast-error comparison against a recorded baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConceptDrift {
    pub baseline_mse: f64,
    pub current_mse: f64,
    pub drifted: bool,
}

/// Concept drift fires when the current forecast MSE exceeds the baseline
/// MSE by more than the configured ratio.
pub fn concept_drift(
    baseline_mse: f64,
    current_mse: f64,
    thresholds: &DriftThresholds,
) -> ConceptDrift {
    ConceptDrift {
        baseline_mse,
        current_mse,
        drifted: current_mse > baseline_mse * thresholds.mse_ratio,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
