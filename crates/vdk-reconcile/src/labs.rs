//! Lab-panel reconciler.
//!
//! Attaches sparse lab panels onto a primary timeline. Two complementary
//! joins run per row, both on the row's calendar date:
//! - **exact**: the panel dated exactly like the row, if any
//! - **nearest-prior**: the most recent panel dated `<=` the row's date
//!   (never a future panel)
//!
//! Per metric, the exact value takes precedence; where the exact panel is
//! absent or its cell is a gap, the nearest-prior value fills in. A present
//! nearest-prior value is never displaced by an absent exact one. Lab
//! columns are then forward-filled per patient in timeline order. Rows dated
//! before a patient's first panel stay gapped — the assembler drops them.
//!
//! The lab-side glucose column never merges: the continuous monitor owns
//! glucose in the canonical dataset ([`LabPanel::mergeable_metrics`]).

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use vdk_schemas::{LabPanel, Metric, PatientId, SourceKind, TimelineRow};

use crate::fill::forward_fill_metrics;

/// Accounting for one lab-enrichment pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabReport {
    /// Panels actually indexed for joining.
    pub panels: usize,
    /// Panels discarded because another panel already covered the same
    /// `(patient, date)` — the source contract is one panel per day;
    /// keep-first.
    pub duplicate_dates: usize,
    /// True when enrichment was skipped outright (no panels): the timeline
    /// is unchanged and its lab columns stay gapped.
    pub skipped: bool,
}

/// Enrich `timeline` with lab values from `panels`, in place.
///
/// The timeline must be in per-patient chronological order (the merger's
/// output order). Rows join only against panels of their own patient; a
/// multi-patient timeline is handled per row. With zero panels the pass is
/// skipped and reported, never an error: the patient's rows proceed and
/// will fail the assembler's gap-free check instead.
pub fn enrich_with_labs(timeline: &mut [TimelineRow], panels: &[LabPanel]) -> LabReport {
    if panels.is_empty() {
        return LabReport {
            panels: 0,
            duplicate_dates: 0,
            skipped: true,
        };
    }

    // Index panels per patient by date, keep-first on duplicates.
    let mut by_patient: BTreeMap<&PatientId, BTreeMap<NaiveDate, &LabPanel>> = BTreeMap::new();
    let mut duplicate_dates = 0usize;
    for panel in panels {
        match by_patient.entry(&panel.patient).or_default().entry(panel.date) {
            Entry::Vacant(slot) => {
                slot.insert(panel);
            }
            Entry::Occupied(_) => duplicate_dates += 1,
        }
    }
    let indexed: usize = by_patient.values().map(|dates| dates.len()).sum();

    for row in timeline.iter_mut() {
        let Some(dates) = by_patient.get(&row.patient) else {
            continue;
        };
        let exact = dates.get(&row.stamp.date).copied();
        let prior = dates
            .range(..=row.stamp.date)
            .next_back()
            .map(|(_, panel)| *panel);

        for metric in Metric::of_source(SourceKind::Lab) {
            let exact_value = exact.and_then(|p| panel_value(p, metric));
            let prior_value = prior.and_then(|p| panel_value(p, metric));
            // exact wins; a present prior value survives an absent exact one
            row.fill_gap(metric, exact_value.or(prior_value));
        }
    }

    // Cover any remaining intra-patient gaps in timeline order.
    let lab_metrics: Vec<Metric> = Metric::of_source(SourceKind::Lab).collect();
    forward_fill_metrics(timeline, &lab_metrics);

    LabReport {
        panels: indexed,
        duplicate_dates,
        skipped: false,
    }
}

fn panel_value(panel: &LabPanel, metric: Metric) -> Option<f64> {
    panel
        .mergeable_metrics()
        .into_iter()
        .find(|(m, _)| *m == metric)
        .and_then(|(_, value)| value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use vdk_schemas::Stamp;

    fn date(text: &str) -> NaiveDate {
        Stamp::parse_date(text).unwrap()
    }

    fn row(patient: &str, date_text: &str, time: &str) -> TimelineRow {
        TimelineRow::empty(
            PatientId::new(patient),
            Stamp::parse(date_text, time).unwrap(),
        )
    }

    fn panel(patient: &str, date_text: &str, hemoglobin: Option<f64>) -> LabPanel {
        LabPanel {
            patient: PatientId::new(patient),
            date: date(date_text),
            glucose: Some(95.0),
            hemoglobin,
            cholesterol: Some(180.0),
            platelet_count: Some(250_000.0),
            wbc_count: Some(7_000.0),
            rbc_count: Some(5.0),
            creatinine: Some(1.0),
            urea: Some(12.0),
            sodium: Some(140.0),
            potassium: Some(4.2),
            calcium: Some(9.5),
        }
    }

    // --- joins ---

    #[test]
    fn exact_date_match_attaches_values() {
        let mut timeline = vec![row("P001", "05-01-2024", "08.00.00")];
        let report = enrich_with_labs(&mut timeline, &[panel("P001", "05-01-2024", Some(14.0))]);
        assert!(!report.skipped);
        assert_eq!(report.panels, 1);
        assert_eq!(timeline[0].get(Metric::Hemoglobin), Some(14.0));
        assert_eq!(timeline[0].get(Metric::Sodium), Some(140.0));
    }

    #[test]
    fn nearest_prior_fills_rows_after_a_panel() {
        let mut timeline = vec![
            row("P001", "06-01-2024", "08.00.00"),
            row("P001", "09-01-2024", "08.00.00"),
        ];
        let report = enrich_with_labs(&mut timeline, &[panel("P001", "05-01-2024", Some(14.0))]);
        assert_eq!(report.panels, 1);
        assert_eq!(timeline[0].get(Metric::Hemoglobin), Some(14.0));
        assert_eq!(timeline[1].get(Metric::Hemoglobin), Some(14.0));
    }

    #[test]
    fn future_panels_never_leak_backwards() {
        let mut timeline = vec![row("P001", "04-01-2024", "08.00.00")];
        enrich_with_labs(&mut timeline, &[panel("P001", "05-01-2024", Some(14.0))]);
        // the only panel is dated after the row: all lab columns stay gapped
        assert_eq!(timeline[0].get(Metric::Hemoglobin), None);
        assert_eq!(timeline[0].get(Metric::Sodium), None);
    }

    #[test]
    fn exact_match_takes_precedence_over_nearest_prior() {
        let mut timeline = vec![row("P001", "10-01-2024", "08.00.00")];
        let panels = vec![
            panel("P001", "05-01-2024", Some(13.0)),
            panel("P001", "10-01-2024", Some(15.0)),
        ];
        enrich_with_labs(&mut timeline, &panels);
        assert_eq!(timeline[0].get(Metric::Hemoglobin), Some(15.0));
    }

    #[test]
    fn present_prior_value_survives_absent_exact_cell() {
        // The panel on the row's own date has no hemoglobin result; the
        // earlier panel does. The prior value must not be displaced by the
        // exact panel's gap.
        let mut timeline = vec![row("P001", "10-01-2024", "08.00.00")];
        let panels = vec![
            panel("P001", "05-01-2024", Some(13.0)),
            panel("P001", "10-01-2024", None),
        ];
        enrich_with_labs(&mut timeline, &panels);
        assert_eq!(timeline[0].get(Metric::Hemoglobin), Some(13.0));
        // cells the exact panel does carry still win
        assert_eq!(timeline[0].get(Metric::Sodium), Some(140.0));
    }

    // --- exclusions ---

    #[test]
    fn lab_glucose_never_merges() {
        let mut timeline = vec![row("P001", "05-01-2024", "08.00.00")];
        enrich_with_labs(&mut timeline, &[panel("P001", "05-01-2024", Some(14.0))]);
        // the panel carries glucose 95.0, but the continuous monitor owns
        // that column
        assert_eq!(timeline[0].get(Metric::BloodGlucose), None);
    }

    #[test]
    fn continuous_columns_untouched() {
        let mut timeline = vec![row("P001", "05-01-2024", "08.00.00")];
        timeline[0].set(Metric::HeartRate, Some(72.0));
        enrich_with_labs(&mut timeline, &[panel("P001", "05-01-2024", Some(14.0))]);
        assert_eq!(timeline[0].get(Metric::HeartRate), Some(72.0));
        assert_eq!(timeline[0].get(Metric::SpO2), None);
    }

    #[test]
    fn panels_of_other_patients_never_leak() {
        let mut timeline = vec![
            row("P001", "05-01-2024", "08.00.00"),
            row("P002", "05-01-2024", "08.00.00"),
        ];
        enrich_with_labs(&mut timeline, &[panel("P001", "05-01-2024", Some(14.0))]);
        assert_eq!(timeline[0].get(Metric::Hemoglobin), Some(14.0));
        assert_eq!(timeline[1].get(Metric::Hemoglobin), None);
    }

    // --- degenerate inputs ---

    #[test]
    fn zero_panels_skips_and_reports() {
        let mut timeline = vec![row("P001", "05-01-2024", "08.00.00")];
        let before = timeline.clone();
        let report = enrich_with_labs(&mut timeline, &[]);
        assert!(report.skipped);
        assert_eq!(report.panels, 0);
        assert_eq!(timeline, before);
    }

    #[test]
    fn duplicate_panel_dates_keep_first_and_count() {
        let mut timeline = vec![row("P001", "05-01-2024", "08.00.00")];
        let panels = vec![
            panel("P001", "05-01-2024", Some(14.0)),
            panel("P001", "05-01-2024", Some(99.0)),
        ];
        let report = enrich_with_labs(&mut timeline, &panels);
        assert_eq!(report.panels, 1);
        assert_eq!(report.duplicate_dates, 1);
        assert_eq!(timeline[0].get(Metric::Hemoglobin), Some(14.0));
    }

    #[test]
    fn empty_timeline_reports_panels_without_rows() {
        let mut timeline: Vec<TimelineRow> = Vec::new();
        let report = enrich_with_labs(&mut timeline, &[panel("P001", "05-01-2024", Some(14.0))]);
        assert!(!report.skipped);
        assert_eq!(report.panels, 1);
    }

    // --- fill step ---

    #[test]
    fn rows_before_first_panel_stay_gapped_after_fill() {
        let mut timeline = vec![
            row("P001", "01-01-2024", "08.00.00"),
            row("P001", "05-01-2024", "08.00.00"),
            row("P001", "07-01-2024", "08.00.00"),
        ];
        enrich_with_labs(&mut timeline, &[panel("P001", "05-01-2024", Some(14.0))]);
        assert_eq!(timeline[0].get(Metric::Hemoglobin), None);
        assert_eq!(timeline[1].get(Metric::Hemoglobin), Some(14.0));
        assert_eq!(timeline[2].get(Metric::Hemoglobin), Some(14.0));
    }

    #[test]
    fn metric_missing_from_early_panels_fills_once_available() {
        let mut timeline = vec![
            row("P001", "05-01-2024", "08.00.00"),
            row("P001", "07-01-2024", "08.00.00"),
            row("P001", "10-01-2024", "08.00.00"),
            row("P001", "12-01-2024", "08.00.00"),
        ];
        let panels = vec![
            panel("P001", "05-01-2024", None),
            panel("P001", "10-01-2024", Some(15.0)),
        ];
        enrich_with_labs(&mut timeline, &panels);
        // no hemoglobin anywhere at or before 05-01 / 07-01
        assert_eq!(timeline[0].get(Metric::Hemoglobin), None);
        assert_eq!(timeline[1].get(Metric::Hemoglobin), None);
        // available from the 10-01 panel onwards
        assert_eq!(timeline[2].get(Metric::Hemoglobin), Some(15.0));
        assert_eq!(timeline[3].get(Metric::Hemoglobin), Some(15.0));
        // other lab columns were present from the first panel
        assert_eq!(timeline[0].get(Metric::Sodium), Some(140.0));
    }
}
