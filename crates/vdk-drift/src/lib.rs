//! Two-sample drift statistics over canonical VitalDesk datasets.
//!
//! Compares a baseline dataset against a current one, column by column:
//! - Kolmogorov-Smirnov test ([`ks_test`]) with an asymptotic two-sided
//!   p-value; a column drifts when `p` falls below the configured threshold
//! - 1-D empirical Wasserstein distance ([`wasserstein_distance`]); a column
//!   drifts when the distance exceeds the configured threshold
//! - concept drift ([`concept_drift`]): current forecast MSE against a
//!   recorded baseline MSE
//!
//! This crate does **not**:
//! - load datasets (see `vdk-reconcile::load_canonical`)
//! - produce forecasts (see `vdk-sequence`)
//! - decide what to do about drift (callers act on the report)

mod report;
mod stats;

pub use report::{
    compare_datasets, concept_drift, ColumnDrift, ConceptDrift, DriftReport, DriftThresholds,
};
pub use stats::{ks_statistic, ks_test, mean_squared_error, wasserstein_distance, KsTest};
