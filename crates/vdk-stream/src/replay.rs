//! Replay producer: streams per-patient continuous CSVs onto the broker.
//!
//! One task per patient. Each task walks the patient's blood-chemistry and
//! blood-pressure tables row by row; the two records of a row share one
//! ingestion timestamp and go out back to back, then the task sleeps one
//! cadence. Per-key ordering holds because each patient is produced by
//! exactly one task.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use vdk_ingest::{load_bp_csv, load_vitals_csv, scan_patients, source_file_name};
use vdk_schemas::{BpReading, PatientId, SourceKind, StreamRecord, VitalsReading};

use crate::broker::StreamBroker;

// ---------------------------------------------------------------------------
// Options / summary
// ---------------------------------------------------------------------------

/// Pacing for the replay producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Pause between consecutive rows of one patient.
    pub cadence: Duration,
}

impl ReplayOptions {
    /// One row per second, the pace of the live monitors.
    pub fn sane_defaults() -> Self {
        Self {
            cadence: Duration::from_secs(1),
        }
    }
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self::sane_defaults()
    }
}

/// What a finished replay streamed.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    /// Patients whose rows were streamed.
    pub patients: usize,
    /// Patients skipped because a continuous file failed to load.
    pub skipped_patients: Vec<String>,
    /// Messages published across both topics.
    pub messages_sent: usize,
}

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

/// Stream every patient folder under `root` onto the broker, one task per
/// patient, and wait for all of them to finish.
///
/// A patient whose vitals or blood-pressure file fails to load is skipped
/// with a warning. Fails when the root cannot be scanned or no patient is
/// streamable at all.
pub async fn replay_patients(
    broker: Arc<dyn StreamBroker>,
    root: &Path,
    options: &ReplayOptions,
) -> Result<ReplaySummary> {
    let patients = scan_patients(root)
        .with_context(|| format!("scanning patient folders under {}", root.display()))?;

    let mut loaded: Vec<(PatientId, Vec<VitalsReading>, Vec<BpReading>)> = Vec::new();
    let mut skipped_patients = Vec::new();
    for (patient, dir) in patients {
        let vitals = load_vitals_csv(&dir.join(source_file_name(SourceKind::Vitals)));
        let bp = load_bp_csv(&dir.join(source_file_name(SourceKind::BloodPressure)));
        match (vitals, bp) {
            (Ok(vitals), Ok(bp)) => {
                info!(
                    patient = %patient,
                    rows = vitals.rows.len().min(bp.rows.len()),
                    "patient ready for replay"
                );
                loaded.push((patient, vitals.rows, bp.rows));
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(patient = %patient, error = %e, "patient skipped for replay");
                skipped_patients.push(patient.as_str().to_string());
            }
        }
    }

    if loaded.is_empty() {
        bail!("no streamable patient data under {}", root.display());
    }

    let mut handles = Vec::new();
    for (patient, vitals, bp) in loaded {
        let broker = Arc::clone(&broker);
        let cadence = options.cadence;
        handles.push(tokio::spawn(async move {
            stream_patient(broker.as_ref(), &patient, &vitals, &bp, cadence).await
        }));
    }

    let mut patients = 0;
    let mut messages_sent = 0;
    for handle in handles {
        messages_sent += handle.await.context("replay task panicked")??;
        patients += 1;
    }

    info!(patients, messages_sent, "replay complete");
    Ok(ReplaySummary {
        patients,
        skipped_patients,
        messages_sent,
    })
}

/// Stream one patient's paired rows. Rows beyond the shorter table are not
/// streamed; a length mismatch is logged once.
async fn stream_patient(
    broker: &dyn StreamBroker,
    patient: &PatientId,
    vitals: &[VitalsReading],
    bp: &[BpReading],
    cadence: Duration,
) -> Result<usize> {
    if vitals.len() != bp.len() {
        warn!(
            patient = %patient,
            vitals_rows = vitals.len(),
            bp_rows = bp.len(),
            "continuous tables differ in length; streaming the overlap"
        );
    }

    let mut sent = 0;
    for (row, (vital, pressure)) in vitals.iter().zip(bp.iter()).enumerate() {
        let ingest_ts_millis = chrono::Utc::now().timestamp_millis();

        publish_record(broker, SourceKind::Vitals, patient, ingest_ts_millis, vital).await?;
        publish_record(
            broker,
            SourceKind::BloodPressure,
            patient,
            ingest_ts_millis,
            pressure,
        )
        .await?;
        sent += 2;

        info!(patient = %patient, row, "row streamed");
        if cadence > Duration::ZERO {
            tokio::time::sleep(cadence).await;
        }
    }
    Ok(sent)
}

async fn publish_record<T: Serialize + Clone>(
    broker: &dyn StreamBroker,
    kind: SourceKind,
    patient: &PatientId,
    ingest_ts_millis: i64,
    payload: &T,
) -> Result<()> {
    let record = StreamRecord {
        topic: kind.as_str().to_string(),
        patient: patient.clone(),
        ingest_ts_millis,
        payload: payload.clone(),
    };
    let message = serde_json::to_string(&record)
        .with_context(|| format!("encoding {} record", kind.as_str()))?;
    broker.publish(kind.as_str(), message).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
