//! Forecast command: canonical dataset in, graded next-step predictions out.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use vdk_alert::{evaluate_batch, AlertPolicy, AlertReport, RangeTable};
use vdk_reconcile::load_canonical;
use vdk_sequence::{forecast_next, ForecastRun, HoldLastForecaster};

use super::{
    optional_path_from_flag_or_env, path_from_flag_or_env, ENV_MERGED_PATH, ENV_RANGES_PATH,
};

/// JSON payload for `--report`.
#[derive(Serialize)]
struct ForecastArtifact<'a> {
    forecast: &'a ForecastRun,
    alerts: &'a AlertReport,
}

// ---------------------------------------------------------------------------
// forecast
// ---------------------------------------------------------------------------

pub fn run(
    merged: Option<PathBuf>,
    window: usize,
    ranges: Option<PathBuf>,
    report: Option<PathBuf>,
) -> Result<()> {
    if window == 0 {
        anyhow::bail!("--window must be at least 1");
    }
    let merged_path = path_from_flag_or_env(merged, "--merged", ENV_MERGED_PATH)?;
    let rows = load_canonical(&merged_path)
        .with_context(|| format!("load canonical dataset {} failed", merged_path.display()))?;

    let table = match optional_path_from_flag_or_env(ranges, ENV_RANGES_PATH) {
        Some(path) => RangeTable::from_json_file(&path)
            .with_context(|| format!("load range table {} failed", path.display()))?,
        None => RangeTable::clinical_defaults(),
    };

    let forecast = forecast_next(&rows, window, &HoldLastForecaster);
    let alerts = evaluate_batch(&table, &AlertPolicy::sane_defaults(), &forecast.predictions);

    println!("{forecast}");
    println!("{alerts}");
    println!(
        "forecast_ok=true window={} predicted={} skipped={} critical={} high_severity={}",
        window,
        forecast.predictions.len(),
        forecast.skipped.len(),
        alerts.total_critical(),
        alerts.high_severity().count()
    );

    if let Some(path) = report {
        let artifact = ForecastArtifact {
            forecast: &forecast,
            alerts: &alerts,
        };
        let json =
            serde_json::to_string_pretty(&artifact).context("serialize forecast report failed")?;
        fs::write(&path, format!("{json}\n"))
            .with_context(|| format!("write report failed: {}", path.display()))?;
        println!("report_path={}", path.display());
    }

    Ok(())
}
