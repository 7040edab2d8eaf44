//! Pairwise exact merger for the two continuous sources.
//!
//! Outer join on `(patient, date, time)`. Every reading from either side
//! appears in the output; a key present on one side only yields a row whose
//! other-side columns are gaps. A key matched `m` times on one side and `n`
//! times on the other emits all `m·n` combinations — duplicate-key ambiguity
//! surfaces as row-count growth, never as an error, and the assembler
//! re-validates one-row-per-key afterwards.

use std::collections::{BTreeMap, BTreeSet};

use vdk_schemas::{BpReading, PatientId, Stamp, TimelineRow, VitalsReading};

/// Outer-join the two continuous source tables into the primary timeline.
///
/// Output is sorted ascending by `(patient, stamp)` and is deterministic for
/// any input order: readings are grouped per key, and combinations are
/// emitted in input order within a key.
pub fn merge_continuous(vitals: &[VitalsReading], bp: &[BpReading]) -> Vec<TimelineRow> {
    let mut vitals_by_key: BTreeMap<(&PatientId, Stamp), Vec<&VitalsReading>> = BTreeMap::new();
    for reading in vitals {
        vitals_by_key
            .entry((&reading.patient, reading.stamp))
            .or_default()
            .push(reading);
    }

    let mut bp_by_key: BTreeMap<(&PatientId, Stamp), Vec<&BpReading>> = BTreeMap::new();
    for reading in bp {
        bp_by_key
            .entry((&reading.patient, reading.stamp))
            .or_default()
            .push(reading);
    }

    // Union of keys, ascending (patient, stamp).
    let mut keys: BTreeSet<(&PatientId, Stamp)> = BTreeSet::new();
    keys.extend(vitals_by_key.keys().copied());
    keys.extend(bp_by_key.keys().copied());

    let mut rows = Vec::new();
    for key in keys {
        let (patient, stamp) = key;
        match (vitals_by_key.get(&key), bp_by_key.get(&key)) {
            (Some(vs), Some(bs)) => {
                for v in vs {
                    for b in bs {
                        rows.push(combined_row(patient, stamp, Some(v), Some(b)));
                    }
                }
            }
            (Some(vs), None) => {
                for v in vs {
                    rows.push(combined_row(patient, stamp, Some(v), None));
                }
            }
            (None, Some(bs)) => {
                for b in bs {
                    rows.push(combined_row(patient, stamp, None, Some(b)));
                }
            }
            (None, None) => unreachable!("key came from one of the two maps"),
        }
    }
    rows
}

fn combined_row(
    patient: &PatientId,
    stamp: Stamp,
    vitals: Option<&VitalsReading>,
    bp: Option<&BpReading>,
) -> TimelineRow {
    let mut row = TimelineRow::empty(patient.clone(), stamp);
    if let Some(v) = vitals {
        for (metric, value) in v.metrics() {
            row.set(metric, value);
        }
    }
    if let Some(b) = bp {
        for (metric, value) in b.metrics() {
            row.set(metric, value);
        }
    }
    row
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
