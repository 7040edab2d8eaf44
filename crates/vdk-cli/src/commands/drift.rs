//! Drift command: two canonical datasets in, per-column drift verdicts out.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use vdk_drift::{compare_datasets, DriftThresholds};
use vdk_reconcile::load_canonical;

// ---------------------------------------------------------------------------
// drift
// ---------------------------------------------------------------------------

pub fn run(
    baseline: &Path,
    current: &Path,
    report: Option<PathBuf>,
    fail_on_drift: bool,
) -> Result<()> {
    let baseline_rows = load_canonical(baseline)
        .with_context(|| format!("load baseline dataset {} failed", baseline.display()))?;
    let current_rows = load_canonical(current)
        .with_context(|| format!("load current dataset {} failed", current.display()))?;

    let drift = compare_datasets(&baseline_rows, &current_rows, &DriftThresholds::sane_defaults());

    println!("{drift}");
    println!(
        "drift_ok=true columns={} drifted={} skipped={}",
        drift.columns.len(),
        drift.drifted_count(),
        drift.skipped_columns.len()
    );

    if let Some(path) = report {
        let json = serde_json::to_string_pretty(&drift).context("serialize drift report failed")?;
        fs::write(&path, format!("{json}\n"))
            .with_context(|| format!("write report failed: {}", path.display()))?;
        println!("report_path={}", path.display());
    }

    if fail_on_drift && !drift.is_clean() {
        anyhow::bail!("drift detected in {} column(s)", drift.drifted_count());
    }

    Ok(())
}
