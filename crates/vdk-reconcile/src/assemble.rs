//! Assembler: final ordering, deduplication, and gap-free filtering.
//!
//! Takes the concatenation of all patients' enriched timelines and produces
//! the canonical row set:
//! 1. optional most-recent-N cap per patient (bounded-memory policy for
//!    streaming deployments), applied before the global sort
//! 2. keep-first deduplication of `(patient, stamp)` keys — re-validation of
//!    the one-row-per-key invariant after duplicate-key join growth
//! 3. removal of any row still carrying a gap in any column
//! 4. global sort ascending `(date, time, patient)`; descending display
//!    order is a presentation concern, not a dataset property
//!
//! Every removal is counted per patient in the [`AssembleReport`]; the
//! report's totals are the pipeline's primary health signal.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use vdk_schemas::{PatientId, TimelineRow};

// ---------------------------------------------------------------------------
// Options and report
// ---------------------------------------------------------------------------

/// Options for the final assembly pass.
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Keep only the most recent N rows per patient, selected by stamp
    /// before the global sort. `None` keeps everything.
    pub per_patient_cap: Option<usize>,
}

/// Row accounting for one patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatientRows {
    /// Rows entering assembly for this patient.
    pub merged: usize,
    /// Rows discarded by the most-recent-N cap.
    pub capped: usize,
    /// Extra rows sharing an already-seen `(patient, stamp)` key.
    pub duplicates: usize,
    /// Rows dropped because a column was still gapped.
    pub gapped: usize,
    /// Rows surviving into the canonical dataset.
    pub kept: usize,
}

/// Assembly summary across all patients.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssembleReport {
    pub per_patient: BTreeMap<PatientId, PatientRows>,
    pub total_kept: usize,
}

impl AssembleReport {
    /// Patients with at least one canonical row.
    pub fn patients_kept(&self) -> usize {
        self.per_patient.values().filter(|p| p.kept > 0).count()
    }

    /// True when no row was removed for any reason.
    pub fn is_clean(&self) -> bool {
        self.per_patient
            .values()
            .all(|p| p.capped == 0 && p.duplicates == 0 && p.gapped == 0)
    }
}

impl fmt::Display for AssembleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AssembleReport {{")?;
        writeln!(f, "  patients: {}", self.per_patient.len())?;
        writeln!(f, "  total_kept: {}", self.total_kept)?;
        for (patient, rows) in &self.per_patient {
            writeln!(
                f,
                "  {patient}: merged={} capped={} duplicates={} gapped={} kept={}",
                rows.merged, rows.capped, rows.duplicates, rows.gapped, rows.kept
            )?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Assemble the canonical row set from all patients' enriched timelines.
///
/// Deterministic: identical input rows produce identical output and report
/// regardless of input order, except that keep-first deduplication keeps the
/// earliest of equal keys in input order.
pub fn assemble(
    rows: Vec<TimelineRow>,
    options: &AssembleOptions,
) -> (Vec<TimelineRow>, AssembleReport) {
    let mut report = AssembleReport::default();
    for row in &rows {
        report.per_patient.entry(row.patient.clone()).or_default().merged += 1;
    }

    // Group per patient, preserving input order within each patient so the
    // keep-first rule below stays meaningful.
    let mut by_patient: BTreeMap<PatientId, Vec<TimelineRow>> = BTreeMap::new();
    for row in rows {
        by_patient.entry(row.patient.clone()).or_default().push(row);
    }

    let mut kept: Vec<TimelineRow> = Vec::new();
    for (patient, mut timeline) in by_patient {
        let stats = report.per_patient.entry(patient).or_default();

        // Stable: equal stamps keep their input order.
        timeline.sort_by_key(|row| row.stamp);

        // Most-recent-N cap, selected by stamp.
        if let Some(cap) = options.per_patient_cap {
            if timeline.len() > cap {
                stats.capped = timeline.len() - cap;
                timeline.drain(..timeline.len() - cap);
            }
        }

        // Keep-first per (patient, stamp).
        let mut last_stamp = None;
        for row in timeline {
            if last_stamp == Some(row.stamp) {
                stats.duplicates += 1;
                continue;
            }
            last_stamp = Some(row.stamp);
            if row.is_complete() {
                stats.kept += 1;
                kept.push(row);
            } else {
                stats.gapped += 1;
            }
        }
    }

    // Global order: ascending (date, time, patient).
    kept.sort_by(|a, b| (a.stamp, &a.patient).cmp(&(b.stamp, &b.patient)));

    report.total_kept = kept.len();
    (kept, report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use vdk_schemas::{Metric, Stamp};

    fn complete(patient: &str, date: &str, time: &str) -> TimelineRow {
        let mut row = TimelineRow::empty(
            PatientId::new(patient),
            Stamp::parse(date, time).unwrap(),
        );
        for m in Metric::ALL {
            row.set(m, Some(1.0));
        }
        row
    }

    fn gapped(patient: &str, date: &str, time: &str) -> TimelineRow {
        let mut row = complete(patient, date, time);
        row.set(Metric::Hemoglobin, None);
        row
    }

    fn keys(rows: &[TimelineRow]) -> Vec<(String, String)> {
        rows.iter()
            .map(|r| (r.patient.as_str().to_string(), r.stamp.to_string()))
            .collect()
    }

    // --- ordering ---

    #[test]
    fn sorts_ascending_by_date_time_patient() {
        let rows = vec![
            complete("P002", "02-01-2024", "08.00.00"),
            complete("P001", "01-01-2024", "12.00.00"),
            complete("P001", "02-01-2024", "08.00.00"),
            complete("P001", "01-01-2024", "08.00.00"),
        ];
        let (out, report) = assemble(rows, &AssembleOptions::default());
        assert_eq!(
            keys(&out),
            vec![
                ("P001".into(), "01-01-2024 08.00.00".into()),
                ("P001".into(), "01-01-2024 12.00.00".into()),
                ("P001".into(), "02-01-2024 08.00.00".into()),
                ("P002".into(), "02-01-2024 08.00.00".into()),
            ]
        );
        assert!(report.is_clean());
        assert_eq!(report.total_kept, 4);
    }

    #[test]
    fn same_stamp_orders_by_patient() {
        let rows = vec![
            complete("P002", "01-01-2024", "08.00.00"),
            complete("P001", "01-01-2024", "08.00.00"),
        ];
        let (out, _) = assemble(rows, &AssembleOptions::default());
        assert_eq!(out[0].patient.as_str(), "P001");
        assert_eq!(out[1].patient.as_str(), "P002");
    }

    #[test]
    fn per_patient_timestamps_monotone_in_output() {
        let rows = vec![
            complete("P001", "03-01-2024", "08.00.00"),
            complete("P002", "01-01-2024", "09.00.00"),
            complete("P001", "01-01-2024", "08.00.00"),
            complete("P002", "02-01-2024", "07.00.00"),
        ];
        let (out, _) = assemble(rows, &AssembleOptions::default());
        for patient in ["P001", "P002"] {
            let stamps: Vec<Stamp> = out
                .iter()
                .filter(|r| r.patient.as_str() == patient)
                .map(|r| r.stamp)
                .collect();
            assert!(stamps.windows(2).all(|w| w[0] <= w[1]), "{patient} not monotone");
        }
    }

    // --- deduplication ---

    #[test]
    fn duplicate_keys_deduplicated_keep_first() {
        let mut second = complete("P001", "01-01-2024", "08.00.00");
        second.set(Metric::BloodGlucose, Some(999.0));
        let rows = vec![complete("P001", "01-01-2024", "08.00.00"), second];
        let (out, report) = assemble(rows, &AssembleOptions::default());
        assert_eq!(out.len(), 1);
        // the first of the two survives
        assert_eq!(out[0].get(Metric::BloodGlucose), Some(1.0));
        assert_eq!(report.per_patient[&PatientId::new("P001")].duplicates, 1);
        assert!(!report.is_clean());
    }

    // --- gap filtering ---

    #[test]
    fn gapped_rows_dropped_and_counted() {
        let rows = vec![
            complete("P001", "01-01-2024", "08.00.00"),
            gapped("P001", "01-01-2024", "09.00.00"),
            gapped("P001", "01-01-2024", "10.00.00"),
        ];
        let (out, report) = assemble(rows, &AssembleOptions::default());
        assert_eq!(out.len(), 1);
        let stats = &report.per_patient[&PatientId::new("P001")];
        assert_eq!(stats.merged, 3);
        assert_eq!(stats.gapped, 2);
        assert_eq!(stats.kept, 1);
    }

    #[test]
    fn output_rows_are_gap_free() {
        let rows = vec![
            complete("P001", "01-01-2024", "08.00.00"),
            gapped("P002", "01-01-2024", "08.00.00"),
        ];
        let (out, _) = assemble(rows, &AssembleOptions::default());
        assert!(out.iter().all(|r| r.is_complete()));
    }

    #[test]
    fn patient_with_no_surviving_rows_still_reported() {
        let rows = vec![
            complete("P001", "01-01-2024", "08.00.00"),
            gapped("P002", "01-01-2024", "08.00.00"),
        ];
        let (_, report) = assemble(rows, &AssembleOptions::default());
        assert_eq!(report.patients_kept(), 1);
        let p2 = &report.per_patient[&PatientId::new("P002")];
        assert_eq!(p2.kept, 0);
        assert_eq!(p2.gapped, 1);
    }

    // --- cap ---

    #[test]
    fn cap_keeps_most_recent_rows_per_patient() {
        let rows = vec![
            complete("P001", "01-01-2024", "08.00.00"),
            complete("P001", "02-01-2024", "08.00.00"),
            complete("P001", "03-01-2024", "08.00.00"),
            complete("P002", "01-01-2024", "08.00.00"),
        ];
        let options = AssembleOptions {
            per_patient_cap: Some(2),
        };
        let (out, report) = assemble(rows, &options);
        let p1_dates: Vec<String> = out
            .iter()
            .filter(|r| r.patient.as_str() == "P001")
            .map(|r| r.stamp.date_text())
            .collect();
        assert_eq!(p1_dates, vec!["02-01-2024", "03-01-2024"]);
        assert_eq!(report.per_patient[&PatientId::new("P001")].capped, 1);
        // under the cap: untouched
        assert_eq!(report.per_patient[&PatientId::new("P002")].capped, 0);
    }

    #[test]
    fn cap_selects_by_stamp_not_input_order() {
        let rows = vec![
            complete("P001", "03-01-2024", "08.00.00"),
            complete("P001", "01-01-2024", "08.00.00"),
            complete("P001", "02-01-2024", "08.00.00"),
        ];
        let options = AssembleOptions {
            per_patient_cap: Some(1),
        };
        let (out, _) = assemble(rows, &options);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].stamp.date_text(), "03-01-2024");
    }

    // --- report ---

    #[test]
    fn empty_input_yields_empty_clean_report() {
        let (out, report) = assemble(Vec::new(), &AssembleOptions::default());
        assert!(out.is_empty());
        assert_eq!(report.total_kept, 0);
        assert_eq!(report.patients_kept(), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn report_serializes_to_json() {
        let rows = vec![complete("P001", "01-01-2024", "08.00.00")];
        let (_, report) = assemble(rows, &AssembleOptions::default());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"total_kept\":1"));
        assert!(json.contains("P001"));
    }

    #[test]
    fn display_lists_per_patient_accounting() {
        let rows = vec![
            complete("P001", "01-01-2024", "08.00.00"),
            gapped("P001", "01-01-2024", "09.00.00"),
        ];
        let (_, report) = assemble(rows, &AssembleOptions::default());
        let s = report.to_string();
        assert!(s.contains("AssembleReport"));
        assert!(s.contains("total_kept: 1"));
        assert!(s.contains("P001: merged=2"));
    }
}
