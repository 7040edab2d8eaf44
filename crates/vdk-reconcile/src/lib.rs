//! Temporal multi-source reconciliation: the core of the VitalDesk pipeline.
//!
//! Takes the typed per-patient source tables produced by `vdk-ingest` and
//! builds the canonical merged dataset:
//! - [`merge_continuous`] — outer join of the two continuous sources on
//!   `(patient, date, time)`, establishing the primary timeline
//! - [`enrich_with_labs`] — attaches sparse lab panels to the timeline via
//!   exact-date and nearest-prior joins with a deterministic precedence rule
//! - [`forward_fill`] — per-patient last-value carry-forward, never across a
//!   patient boundary
//! - [`assemble`] — global ordering, deduplication, gap-free filtering, and
//!   row accounting
//! - [`write_canonical`] / [`load_canonical`] — canonical dataset CSV IO
//! - [`run_merge`] — the batch driver wiring all stages for a data root
//!
//! Every stage is deterministic: identical inputs produce identical rows,
//! reports, and files. This crate does **not**:
//! - parse raw source files (see `vdk-ingest`)
//! - window, scale, or forecast (see `vdk-sequence`)
//! - classify values against clinical ranges (see `vdk-alert`)

mod assemble;
mod dataset;
mod fill;
mod labs;
mod merge;
mod pipeline;

pub use assemble::{assemble, AssembleOptions, AssembleReport, PatientRows};
pub use dataset::{canonical_header, load_canonical, write_canonical, DatasetError};
pub use fill::{forward_fill, forward_fill_metrics};
pub use labs::{enrich_with_labs, LabReport};
pub use merge::merge_continuous;
pub use pipeline::{run_merge, MergeRun, PipelineError, PipelineOptions};
