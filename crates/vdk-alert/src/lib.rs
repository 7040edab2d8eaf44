//! Threshold evaluation of predicted vitals.
//!
//! Pure, side-effect-free classification: a [`RangeTable`] maps metric labels
//! to inclusive normal ranges; [`classify`] grades one value,
//! [`evaluate_prediction`] grades one patient's predicted row, and
//! [`evaluate_batch`] aggregates a whole forecast pass into an
//! [`AlertReport`] with per-patient severity.
//!
//! Values are rounded to two decimal places before every comparison so a
//! prediction sitting at a boundary does not flicker between runs.
//!
//! This crate does **not**:
//! - produce forecasts (see `vdk-sequence`)
//! - render or deliver alerts anywhere

mod evaluate;
mod ranges;

pub use evaluate::{
    classify, evaluate_batch, evaluate_prediction, round2, AlertPolicy, AlertReport,
    Classification, CriticalFinding, PatientAlert,
};
pub use ranges::{NormalRange, RangeTable, RangeTableError};
