//! Streaming-boundary envelope.

use serde::{Deserialize, Serialize};

use crate::stamp::PatientId;

/// Message envelope on the streaming boundary: keyed by patient, stamped
/// with the ingestion time in milliseconds since the Unix epoch. The payload
/// is the source record as produced by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRecord<T> {
    pub topic: String,
    pub patient: PatientId,
    pub ingest_ts_millis: i64,
    pub payload: T,
}
