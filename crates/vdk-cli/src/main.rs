//! vdk entry point.
//!
//! This file is intentionally thin: it loads the environment, sets up
//! tracing, and parses the command line. All command logic lives in
//! `commands/`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "vdk")]
#[command(about = "VitalDesk pipeline CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every patient's source files into the canonical dataset
    Merge {
        /// Data root holding one folder per patient (env VITALDESK_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Destination for the canonical dataset CSV (env VITALDESK_MERGED_PATH)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Keep only the most recent N rows per patient
        #[arg(long)]
        cap: Option<usize>,

        /// Folder for the run summary JSON (env VITALDESK_ARTIFACTS_DIR;
        /// defaults to the canonical dataset's folder)
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,
    },

    /// Forecast the next reading per patient and grade it against normal ranges
    Forecast {
        /// Canonical dataset produced by `vdk merge` (env VITALDESK_MERGED_PATH)
        #[arg(long)]
        merged: Option<PathBuf>,

        /// Window length in rows
        #[arg(long, default_value_t = vdk_sequence::DEFAULT_WINDOW)]
        window: usize,

        /// JSON normal-range overrides (env VITALDESK_RANGES_PATH; built-in
        /// clinical defaults when absent)
        #[arg(long)]
        ranges: Option<PathBuf>,

        /// Also write the forecast + alert reports as JSON here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Compare two canonical datasets column by column for drift
    Drift {
        /// Reference dataset
        #[arg(long)]
        baseline: PathBuf,

        /// Dataset under scrutiny
        #[arg(long)]
        current: PathBuf,

        /// Also write the drift report as JSON here
        #[arg(long)]
        report: Option<PathBuf>,

        /// Exit nonzero when any column drifts
        #[arg(long, default_value_t = false)]
        fail_on_drift: bool,
    },

    /// Stream every patient's continuous sources through the in-process broker
    Replay {
        /// Data root holding one folder per patient (env VITALDESK_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Folder for the consumer's per-topic snapshots
        #[arg(long)]
        out_dir: PathBuf,

        /// Pause between rows per patient, in milliseconds
        #[arg(long, default_value_t = 1000)]
        cadence_ms: u64,

        /// Most-recent messages kept per topic
        #[arg(long, default_value_t = 250)]
        buffer: usize,

        /// Seconds between consumer snapshots
        #[arg(long, default_value_t = 120)]
        snapshot_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present. Silent if the file does not exist; deployments
    // inject env vars directly.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Merge {
            data_dir,
            out,
            cap,
            artifacts_dir,
        } => commands::merge::run(data_dir, out, cap, artifacts_dir),

        Commands::Forecast {
            merged,
            window,
            ranges,
            report,
        } => commands::forecast::run(merged, window, ranges, report),

        Commands::Drift {
            baseline,
            current,
            report,
            fail_on_drift,
        } => commands::drift::run(&baseline, &current, report, fail_on_drift),

        Commands::Replay {
            data_dir,
            out_dir,
            cadence_ms,
            buffer,
            snapshot_secs,
        } => commands::replay::run(data_dir, out_dir, cadence_ms, buffer, snapshot_secs).await,
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
