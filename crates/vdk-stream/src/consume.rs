//! Bounded consumer for the continuous topics.
//!
//! Keeps only the most recent messages per topic (live views look at a
//! sliding window, not history) and persists a periodic CSV snapshot per
//! topic under `out_dir/<topic>/<topic>.csv`. A message that fails to
//! decode is dropped with a warning; the consumer stays up.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use vdk_schemas::{BpReading, Metric, SourceKind, StreamRecord, VitalsReading};

use crate::broker::{MessageStream, StreamBroker};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Sizing and pacing for [`run_consumer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerOptions {
    /// Most-recent messages kept per topic.
    pub buffer_capacity: usize,
    /// Pause between snapshot writes.
    pub snapshot_every: Duration,
}

impl ConsumerOptions {
    /// 250 messages per topic, snapshots every two minutes.
    pub fn sane_defaults() -> Self {
        Self {
            buffer_capacity: 250,
            snapshot_every: Duration::from_secs(120),
        }
    }
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self::sane_defaults()
    }
}

// ---------------------------------------------------------------------------
// Buffers
// ---------------------------------------------------------------------------

/// Most-recent ring buffers for the two continuous topics.
#[derive(Debug)]
pub struct ConsumerBuffers {
    capacity: usize,
    vitals: VecDeque<StreamRecord<VitalsReading>>,
    bp: VecDeque<StreamRecord<BpReading>>,
}

/// Rows written by one snapshot pass (zero for a topic with nothing
/// buffered; its file is left untouched).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    pub vitals_rows: usize,
    pub bp_rows: usize,
}

impl ConsumerBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            vitals: VecDeque::with_capacity(capacity),
            bp: VecDeque::with_capacity(capacity),
        }
    }

    /// Decode and buffer one vitals wire message.
    pub fn offer_vitals(&mut self, raw: &str) -> Result<()> {
        let record: StreamRecord<VitalsReading> =
            serde_json::from_str(raw).context("decoding vitals record")?;
        push_bounded(&mut self.vitals, record, self.capacity);
        Ok(())
    }

    /// Decode and buffer one blood-pressure wire message.
    pub fn offer_bp(&mut self, raw: &str) -> Result<()> {
        let record: StreamRecord<BpReading> =
            serde_json::from_str(raw).context("decoding bp record")?;
        push_bounded(&mut self.bp, record, self.capacity);
        Ok(())
    }

    /// Buffered vitals records, oldest first.
    pub fn vitals(&self) -> impl Iterator<Item = &StreamRecord<VitalsReading>> {
        self.vitals.iter()
    }

    /// Buffered blood-pressure records, oldest first.
    pub fn bp(&self) -> impl Iterator<Item = &StreamRecord<BpReading>> {
        self.bp.iter()
    }

    pub fn len(&self) -> usize {
        self.vitals.len() + self.bp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vitals.is_empty() && self.bp.is_empty()
    }

    /// Write one CSV per non-empty topic under `dir`, overwriting the
    /// previous snapshot.
    pub fn snapshot(&self, dir: &Path) -> Result<SnapshotStats> {
        let mut stats = SnapshotStats::default();
        if !self.vitals.is_empty() {
            let path = topic_csv_path(dir, SourceKind::Vitals);
            write_vitals_snapshot(&path, &self.vitals)?;
            stats.vitals_rows = self.vitals.len();
            info!(rows = stats.vitals_rows, path = %path.display(), "snapshot written");
        }
        if !self.bp.is_empty() {
            let path = topic_csv_path(dir, SourceKind::BloodPressure);
            write_bp_snapshot(&path, &self.bp)?;
            stats.bp_rows = self.bp.len();
            info!(rows = stats.bp_rows, path = %path.display(), "snapshot written");
        }
        Ok(stats)
    }
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, item: T, capacity: usize) {
    if buffer.len() == capacity {
        buffer.pop_front();
    }
    buffer.push_back(item);
}

/// Snapshot location for one topic: `dir/<topic>/<topic>.csv`.
fn topic_csv_path(dir: &Path, kind: SourceKind) -> PathBuf {
    dir.join(kind.as_str())
        .join(format!("{}.csv", kind.as_str()))
}

fn write_vitals_snapshot(
    path: &Path,
    records: &VecDeque<StreamRecord<VitalsReading>>,
) -> Result<()> {
    let mut writer = snapshot_writer(path)?;

    let mut header = vec!["Patient_ID", "Date", "Time"];
    header.extend(metric_labels(SourceKind::Vitals));
    header.push("Ingest_Millis");
    writer.write_record(&header)?;

    for record in records {
        let reading = &record.payload;
        let mut row = vec![
            record.patient.as_str().to_string(),
            reading.stamp.date_text(),
            reading.stamp.time_text(),
        ];
        for (_, value) in reading.metrics() {
            row.push(cell(value));
        }
        row.push(record.ingest_ts_millis.to_string());
        writer.write_record(&row)?;
    }
    writer.flush().context("flushing snapshot")?;
    Ok(())
}

fn write_bp_snapshot(path: &Path, records: &VecDeque<StreamRecord<BpReading>>) -> Result<()> {
    let mut writer = snapshot_writer(path)?;

    let mut header = vec!["Patient_ID", "Date", "Time"];
    header.extend(metric_labels(SourceKind::BloodPressure));
    header.push("Ingest_Millis");
    writer.write_record(&header)?;

    for record in records {
        let reading = &record.payload;
        let mut row = vec![
            record.patient.as_str().to_string(),
            reading.stamp.date_text(),
            reading.stamp.time_text(),
        ];
        for (_, value) in reading.metrics() {
            row.push(cell(value));
        }
        row.push(record.ingest_ts_millis.to_string());
        writer.write_record(&row)?;
    }
    writer.flush().context("flushing snapshot")?;
    Ok(())
}

fn snapshot_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    if let Some(folder) = path.parent() {
        std::fs::create_dir_all(folder)
            .with_context(|| format!("creating snapshot folder {}", folder.display()))?;
    }
    csv::Writer::from_path(path).with_context(|| format!("creating snapshot {}", path.display()))
}

fn metric_labels(kind: SourceKind) -> impl Iterator<Item = &'static str> {
    Metric::of_source(kind).map(|m| m.label())
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Consumer loop
// ---------------------------------------------------------------------------

/// Live subscriptions to both continuous topics.
///
/// Subscribing is separate from draining so a caller can attach before any
/// producer starts; messages published between [`subscribe_continuous`] and
/// [`TopicSubscriptions::drain`] are buffered by the transport, not lost.
pub struct TopicSubscriptions {
    vitals: MessageStream,
    bp: MessageStream,
}

/// Subscribe to the two continuous topics.
pub async fn subscribe_continuous(broker: &dyn StreamBroker) -> Result<TopicSubscriptions> {
    let vitals = broker.subscribe(SourceKind::Vitals.as_str()).await?;
    let bp = broker.subscribe(SourceKind::BloodPressure.as_str()).await?;
    info!(
        vitals_topic = SourceKind::Vitals.as_str(),
        bp_topic = SourceKind::BloodPressure.as_str(),
        "consumer listening"
    );
    Ok(TopicSubscriptions { vitals, bp })
}

impl TopicSubscriptions {
    /// Drain both topics into bounded buffers, snapshotting on a fixed
    /// period and once more at shutdown. Returns the final buffers when both
    /// subscriptions have closed (transport shut down).
    pub async fn drain(self, out_dir: &Path, options: &ConsumerOptions) -> Result<ConsumerBuffers> {
        let TopicSubscriptions {
            mut vitals,
            mut bp,
        } = self;

        let mut buffers = ConsumerBuffers::new(options.buffer_capacity);
        let mut ticker = tokio::time::interval(options.snapshot_every);
        // The first interval tick completes immediately; consume it so the
        // first periodic snapshot lands one full period in.
        ticker.tick().await;

        let mut vitals_open = true;
        let mut bp_open = true;
        while vitals_open || bp_open {
            tokio::select! {
                message = vitals.next(), if vitals_open => match message {
                    Some(raw) => {
                        if let Err(error) = buffers.offer_vitals(&raw) {
                            warn!(error = %error, "dropping undecodable vitals message");
                        }
                    }
                    None => vitals_open = false,
                },
                message = bp.next(), if bp_open => match message {
                    Some(raw) => {
                        if let Err(error) = buffers.offer_bp(&raw) {
                            warn!(error = %error, "dropping undecodable bp message");
                        }
                    }
                    None => bp_open = false,
                },
                _ = ticker.tick() => {
                    buffers.snapshot(out_dir)?;
                }
            }
        }

        buffers.snapshot(out_dir)?;
        Ok(buffers)
    }
}

/// Subscribe and drain in one call.
pub async fn run_consumer(
    broker: Arc<dyn StreamBroker>,
    out_dir: &Path,
    options: &ConsumerOptions,
) -> Result<ConsumerBuffers> {
    let subscriptions = subscribe_continuous(broker.as_ref()).await?;
    // The subscriptions outlive the handle. Dropping it lets an in-process
    // transport shut down once the producers are done.
    drop(broker);
    subscriptions.drain(out_dir, options).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
