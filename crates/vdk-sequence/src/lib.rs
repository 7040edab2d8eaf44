//! Sequence building for the forecasting boundary.
//!
//! Turns canonical timeline rows into what a next-step forecaster consumes:
//! - [`patient_timelines`] — split the globally sorted canonical rows back
//!   into per-patient chronological timelines
//! - [`windows`] / [`latest_window`] — lazy, restartable fixed-length
//!   contiguous slices of one timeline
//! - [`MinMaxScaler`] — per-patient min-max normalization with an exact
//!   inverse
//! - [`Forecaster`] — the model seam, plus the [`HoldLastForecaster`]
//!   persistence baseline and the [`forecast_next`] batch driver
//!
//! Patients with too little history or a model emitting the wrong width are
//! skipped and reported, never fatal. This crate does **not**:
//! - train models or talk to any model runtime
//! - classify predictions against clinical ranges (see `vdk-alert`)
//! - read or write any file

mod forecast;
mod scale;
mod window;

pub use forecast::{forecast_next, Forecaster, ForecastRun, ForecastSkip, HoldLastForecaster};
pub use scale::MinMaxScaler;
pub use window::{
    latest_window, patient_timelines, windows, SequenceError, Windows, DEFAULT_WINDOW,
};
