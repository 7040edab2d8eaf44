//! Replay command: stream every patient's continuous sources through the
//! in-process broker and snapshot what the consumer sees.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use vdk_stream::{
    replay_patients, subscribe_continuous, ChannelBroker, ConsumerOptions, ReplayOptions,
    DEFAULT_CHANNEL_CAPACITY,
};

use super::{path_from_flag_or_env, ENV_DATA_DIR};

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

pub async fn run(
    data_dir: Option<PathBuf>,
    out_dir: PathBuf,
    cadence_ms: u64,
    buffer: usize,
    snapshot_secs: u64,
) -> Result<()> {
    let data_dir = path_from_flag_or_env(data_dir, "--data-dir", ENV_DATA_DIR)?;

    let broker = Arc::new(ChannelBroker::new(DEFAULT_CHANNEL_CAPACITY));

    // Subscribe before any producer starts so the consumer sees row one.
    let subscriptions = subscribe_continuous(broker.as_ref()).await?;
    let consumer = tokio::spawn({
        let out_dir = out_dir.clone();
        let options = ConsumerOptions {
            buffer_capacity: buffer,
            snapshot_every: Duration::from_secs(snapshot_secs),
        };
        async move { subscriptions.drain(&out_dir, &options).await }
    });

    let replay_options = ReplayOptions {
        cadence: Duration::from_millis(cadence_ms),
    };
    let summary = replay_patients(
        Arc::clone(&broker) as Arc<dyn vdk_stream::StreamBroker>,
        &data_dir,
        &replay_options,
    )
    .await?;

    // Every producer is done; dropping the last broker handle closes the
    // transport and lets the consumer drain out.
    drop(broker);
    let buffers = consumer.await.context("consumer task panicked")??;

    println!(
        "replay_ok=true patients={} skipped={} messages_sent={}",
        summary.patients,
        summary.skipped_patients.len(),
        summary.messages_sent
    );
    for patient in &summary.skipped_patients {
        println!("  skipped={patient}");
    }
    println!(
        "buffered_vitals={} buffered_bp={} snapshot_dir={}",
        buffers.vitals().count(),
        buffers.bp().count(),
        out_dir.display()
    );

    Ok(())
}
