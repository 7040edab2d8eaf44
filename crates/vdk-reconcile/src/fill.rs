//! Forward-fill normalizer.
//!
//! Last-value carry-forward in row order, per column, with the carried state
//! reset at every patient boundary: fill never crosses patients even on
//! concatenated input. Leading gaps (no prior value in the patient's
//! timeline) remain and are later dropped by the assembler. Idempotent.

use vdk_schemas::{Metric, PatientId, TimelineRow};

/// Forward-fill the given columns in place, in row order.
///
/// Rows must be in per-patient chronological order (the merger's output
/// order); the global output order is the assembler's job.
pub fn forward_fill_metrics(rows: &mut [TimelineRow], metrics: &[Metric]) {
    let mut carried: [Option<f64>; Metric::COUNT] = [None; Metric::COUNT];
    let mut current: Option<PatientId> = None;

    for row in rows.iter_mut() {
        if current.as_ref() != Some(&row.patient) {
            carried = [None; Metric::COUNT];
            current = Some(row.patient.clone());
        }
        for &metric in metrics {
            match row.get(metric) {
                Some(value) => carried[metric.index()] = Some(value),
                None => row.set(metric, carried[metric.index()]),
            }
        }
    }
}

/// Forward-fill every canonical column. See [`forward_fill_metrics`].
pub fn forward_fill(rows: &mut [TimelineRow]) {
    forward_fill_metrics(rows, &Metric::ALL);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use vdk_schemas::Stamp;

    fn row(patient: &str, time: &str, glucose: Option<f64>, sodium: Option<f64>) -> TimelineRow {
        let mut r = TimelineRow::empty(
            PatientId::new(patient),
            Stamp::parse("01-01-2024", time).unwrap(),
        );
        r.set(Metric::BloodGlucose, glucose);
        r.set(Metric::Sodium, sodium);
        r
    }

    fn glucose_column(rows: &[TimelineRow]) -> Vec<Option<f64>> {
        rows.iter().map(|r| r.get(Metric::BloodGlucose)).collect()
    }

    // --- carry forward ---

    #[test]
    fn carries_last_value_forward() {
        let mut rows = vec![
            row("P001", "08.00.00", Some(100.0), None),
            row("P001", "09.00.00", None, None),
            row("P001", "10.00.00", None, None),
            row("P001", "11.00.00", Some(110.0), None),
            row("P001", "12.00.00", None, None),
        ];
        forward_fill(&mut rows);
        assert_eq!(
            glucose_column(&rows),
            vec![Some(100.0), Some(100.0), Some(100.0), Some(110.0), Some(110.0)]
        );
    }

    #[test]
    fn leading_gaps_remain() {
        let mut rows = vec![
            row("P001", "08.00.00", None, None),
            row("P001", "09.00.00", None, None),
            row("P001", "10.00.00", Some(100.0), None),
        ];
        forward_fill(&mut rows);
        assert_eq!(glucose_column(&rows), vec![None, None, Some(100.0)]);
    }

    #[test]
    fn columns_fill_independently() {
        let mut rows = vec![
            row("P001", "08.00.00", Some(100.0), None),
            row("P001", "09.00.00", None, Some(140.0)),
            row("P001", "10.00.00", None, None),
        ];
        forward_fill(&mut rows);
        assert_eq!(rows[1].get(Metric::BloodGlucose), Some(100.0));
        assert_eq!(rows[1].get(Metric::Sodium), Some(140.0));
        assert_eq!(rows[2].get(Metric::BloodGlucose), Some(100.0));
        assert_eq!(rows[2].get(Metric::Sodium), Some(140.0));
        // sodium before its first value stays gapped
        assert_eq!(rows[0].get(Metric::Sodium), None);
    }

    // --- patient boundaries ---

    #[test]
    fn fill_never_crosses_patient_boundary() {
        let mut rows = vec![
            row("P001", "08.00.00", Some(100.0), Some(140.0)),
            row("P001", "09.00.00", None, None),
            row("P002", "08.00.00", None, None),
            row("P002", "09.00.00", Some(90.0), None),
        ];
        forward_fill(&mut rows);
        // P001 filled from its own history
        assert_eq!(rows[1].get(Metric::BloodGlucose), Some(100.0));
        // P002's first row must NOT inherit P001's values
        assert_eq!(rows[2].get(Metric::BloodGlucose), None);
        assert_eq!(rows[2].get(Metric::Sodium), None);
        assert_eq!(rows[3].get(Metric::BloodGlucose), Some(90.0));
    }

    #[test]
    fn interleaved_return_to_earlier_patient_resets_state() {
        // A patient appearing again after another patient's block starts a
        // fresh carry; fill is strictly segment-local.
        let mut rows = vec![
            row("P001", "08.00.00", Some(100.0), None),
            row("P002", "08.00.00", Some(90.0), None),
            row("P001", "09.00.00", None, None),
        ];
        forward_fill(&mut rows);
        assert_eq!(rows[2].get(Metric::BloodGlucose), None);
    }

    // --- idempotence ---

    #[test]
    fn forward_fill_is_idempotent() {
        let mut once = vec![
            row("P001", "08.00.00", None, Some(140.0)),
            row("P001", "09.00.00", Some(100.0), None),
            row("P001", "10.00.00", None, None),
            row("P002", "08.00.00", Some(90.0), None),
            row("P002", "09.00.00", None, Some(138.0)),
        ];
        forward_fill(&mut once);
        let mut twice = once.clone();
        forward_fill(&mut twice);
        assert_eq!(once, twice);
    }

    // --- subset fill ---

    #[test]
    fn metric_subset_leaves_other_columns_untouched() {
        let mut rows = vec![
            row("P001", "08.00.00", Some(100.0), Some(140.0)),
            row("P001", "09.00.00", None, None),
        ];
        forward_fill_metrics(&mut rows, &[Metric::Sodium]);
        assert_eq!(rows[1].get(Metric::Sodium), Some(140.0));
        // glucose was not in the fill set
        assert_eq!(rows[1].get(Metric::BloodGlucose), None);
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut rows: Vec<TimelineRow> = Vec::new();
        forward_fill(&mut rows);
        assert!(rows.is_empty());
    }
}
