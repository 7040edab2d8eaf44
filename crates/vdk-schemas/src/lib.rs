//! Shared record types for the VitalDesk reconciliation pipeline.
//!
//! Everything the pipeline crates exchange lives here:
//! - chronological keys ([`PatientId`], [`Stamp`]) and their wire formats
//! - the canonical metric catalog ([`Metric`], [`SourceKind`])
//! - per-source reading records ([`VitalsReading`], [`BpReading`], [`LabPanel`])
//! - the merged [`TimelineRow`] and the streaming [`StreamRecord`] envelope
//!
//! This crate does **not**:
//! - read or write files (see `vdk-ingest` / `vdk-reconcile`)
//! - implement merge, fill, or alert logic

mod envelope;
mod metric;
mod reading;
mod row;
mod stamp;

pub use envelope::StreamRecord;
pub use metric::{Metric, SourceKind};
pub use reading::{BpReading, LabPanel, VitalsReading};
pub use row::TimelineRow;
pub use stamp::{PatientId, Stamp, DATE_FORMAT, TIME_FORMAT};
