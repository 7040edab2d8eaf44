//! Merge command: data root in, canonical dataset + run summary out.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use vdk_ingest::LoadDiagnostics;
use vdk_reconcile::{run_merge, write_canonical, AssembleReport, LabReport, PipelineOptions};
use vdk_schemas::PatientId;

use super::{
    optional_path_from_flag_or_env, path_from_flag_or_env, ENV_ARTIFACTS_DIR, ENV_DATA_DIR,
    ENV_MERGED_PATH,
};

// ---------------------------------------------------------------------------
// Run summary artifact
// ---------------------------------------------------------------------------

/// JSON summary written after every merge run, next to the canonical dataset
/// unless an artifacts folder is configured.
#[derive(Serialize)]
struct MergeSummary<'a> {
    schema_version: i32,
    run_id: Uuid,
    created_at_utc: DateTime<Utc>,
    data_dir: String,
    merged_path: String,
    rows_written: usize,
    patients_kept: usize,
    diagnostics: &'a LoadDiagnostics,
    lab_reports: &'a BTreeMap<PatientId, LabReport>,
    rows: &'a AssembleReport,
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

pub fn run(
    data_dir: Option<PathBuf>,
    out: Option<PathBuf>,
    cap: Option<usize>,
    artifacts_dir: Option<PathBuf>,
) -> Result<()> {
    let data_dir = path_from_flag_or_env(data_dir, "--data-dir", ENV_DATA_DIR)?;
    let merged_path = path_from_flag_or_env(out, "--out", ENV_MERGED_PATH)?;

    let options = PipelineOptions {
        per_patient_cap: cap,
    };
    let merge = run_merge(&data_dir, &options)
        .with_context(|| format!("merge failed for {}", data_dir.display()))?;

    if let Some(folder) = merged_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(folder)
            .with_context(|| format!("create {} failed", folder.display()))?;
    }
    write_canonical(&merged_path, &merge.rows)
        .with_context(|| format!("write canonical dataset {} failed", merged_path.display()))?;

    let run_id = Uuid::new_v4();
    let summary = MergeSummary {
        schema_version: 1,
        run_id,
        created_at_utc: Utc::now(),
        data_dir: data_dir.display().to_string(),
        merged_path: merged_path.display().to_string(),
        rows_written: merge.rows.len(),
        patients_kept: merge.report.patients_kept(),
        diagnostics: &merge.diagnostics,
        lab_reports: &merge.lab_reports,
        rows: &merge.report,
    };
    let summary_path = write_summary(&summary, artifacts_dir_or_default(artifacts_dir, &merged_path))?;

    let lab_skips = merge.lab_reports.values().filter(|r| r.skipped).count();
    println!("merge_ok=true run_id={run_id}");
    println!(
        "rows_written={} patients_kept={}",
        merge.rows.len(),
        merge.report.patients_kept()
    );
    println!(
        "source_failures={} rows_without_key={} lab_skips={}",
        merge.diagnostics.failure_count(),
        merge.diagnostics.rows_without_key(),
        lab_skips
    );
    println!("merged_path={}", merged_path.display());
    println!("summary_path={}", summary_path.display());
    if !merge.diagnostics.is_clean() {
        println!("{}", merge.diagnostics);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn artifacts_dir_or_default(flag: Option<PathBuf>, merged_path: &Path) -> PathBuf {
    if let Some(dir) = optional_path_from_flag_or_env(flag, ENV_ARTIFACTS_DIR) {
        return dir;
    }
    match merged_path.parent() {
        Some(folder) if !folder.as_os_str().is_empty() => folder.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_summary(summary: &MergeSummary<'_>, dir: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&dir)
        .with_context(|| format!("create artifacts dir {} failed", dir.display()))?;
    let path = dir.join(format!("merge_run_{}.json", summary.run_id));
    let json = serde_json::to_string_pretty(summary).context("serialize run summary failed")?;
    fs::write(&path, format!("{json}\n"))
        .with_context(|| format!("write summary failed: {}", path.display()))?;
    Ok(path)
}
