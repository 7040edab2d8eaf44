//! The forecasting seam and its batch driver.
//!
//! The model itself is an external collaborator: anything implementing
//! [`Forecaster`] maps the last `W` scaled rows of one patient to a predicted
//! next row in the same scaled space. [`forecast_next`] drives it across the
//! whole canonical dataset, one patient at a time, with per-patient scaling
//! and per-patient skips.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use vdk_schemas::{Metric, PatientId, TimelineRow};

use crate::scale::MinMaxScaler;
use crate::window::patient_timelines;

// ---------------------------------------------------------------------------
// Seam
// ---------------------------------------------------------------------------

/// Next-step forecaster over scaled metric vectors.
///
/// The window arrives min-max scaled; the prediction is expected back in the
/// same scaled space with one value per canonical metric column. The driver
/// validates the width and inverse-transforms for the caller.
pub trait Forecaster {
    fn predict(&self, patient: &PatientId, window: &[[f64; Metric::COUNT]]) -> Vec<f64>;
}

/// Persistence baseline: predicts that the next row equals the last observed
/// row. Stands in for the external model in tests and demos.
#[derive(Debug, Default)]
pub struct HoldLastForecaster;

impl Forecaster for HoldLastForecaster {
    fn predict(&self, _patient: &PatientId, window: &[[f64; Metric::COUNT]]) -> Vec<f64> {
        window.last().map(|row| row.to_vec()).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Why a patient produced no prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ForecastSkip {
    /// Fewer dense rows than one window.
    InsufficientHistory { required: usize, available: usize },
    /// The model returned a vector of the wrong width.
    DimensionMismatch { expected: usize, got: usize },
}

impl fmt::Display for ForecastSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastSkip::InsufficientHistory {
                required,
                available,
            } => {
                write!(f, "insufficient history: need {required} rows, have {available}")
            }
            ForecastSkip::DimensionMismatch { expected, got } => {
                write!(f, "dimension mismatch: expected {expected} columns, got {got}")
            }
        }
    }
}

/// One batch forecast pass: a prediction or a skip reason per patient.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastRun {
    /// Window length the pass used.
    pub window: usize,
    /// Predicted next row per patient, in original units, canonical column
    /// order, reported at two decimal places.
    pub predictions: BTreeMap<PatientId, [f64; Metric::COUNT]>,
    /// Patients that produced no prediction, with the reason.
    pub skipped: BTreeMap<PatientId, ForecastSkip>,
}

impl ForecastRun {
    /// True when every patient got a prediction.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl fmt::Display for ForecastRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ForecastRun {{")?;
        writeln!(f, "  window: {}", self.window)?;
        writeln!(f, "  predicted: {}", self.predictions.len())?;
        writeln!(f, "  skipped: {}", self.skipped.len())?;
        for (patient, reason) in &self.skipped {
            writeln!(f, "    {patient}: {reason}")?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Predict the next row for every patient in the canonical rows.
///
/// Per patient: vectorize the timeline (rows still carrying a gap cannot be
/// vectorized and are ignored), fit a [`MinMaxScaler`] over it, scale, hand
/// the most recent `window` rows to the forecaster, validate the width, and
/// inverse-transform. Short history and wrong-width predictions are recorded
/// as skips; nothing here is fatal.
pub fn forecast_next(
    rows: &[TimelineRow],
    window: usize,
    forecaster: &dyn Forecaster,
) -> ForecastRun {
    debug_assert!(window > 0);
    let mut run = ForecastRun {
        window,
        predictions: BTreeMap::new(),
        skipped: BTreeMap::new(),
    };

    for (patient, timeline) in patient_timelines(rows) {
        let matrix: Vec<[f64; Metric::COUNT]> =
            timeline.iter().filter_map(|r| r.dense_values()).collect();
        if matrix.len() < window {
            run.skipped.insert(
                patient,
                ForecastSkip::InsufficientHistory {
                    required: window,
                    available: matrix.len(),
                },
            );
            continue;
        }

        // matrix is non-empty here, so fit always succeeds
        let Some(scaler) = MinMaxScaler::fit(&matrix) else {
            continue;
        };
        let scaled = scaler.transform_all(&matrix);
        let last = &scaled[scaled.len() - window..];

        let predicted = forecaster.predict(&patient, last);
        if predicted.len() != Metric::COUNT {
            run.skipped.insert(
                patient,
                ForecastSkip::DimensionMismatch {
                    expected: Metric::COUNT,
                    got: predicted.len(),
                },
            );
            continue;
        }

        let mut scaled_row = [0.0; Metric::COUNT];
        scaled_row.copy_from_slice(&predicted);
        let mut values = scaler.inverse_transform(&scaled_row);
        for value in &mut values {
            *value = (*value * 100.0).round() / 100.0;
        }
        run.predictions.insert(patient, values);
    }

    run
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
