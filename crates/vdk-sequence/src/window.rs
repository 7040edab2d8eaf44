//! Fixed-length windows over a patient timeline.

use std::collections::BTreeMap;
use std::fmt;

use vdk_schemas::{PatientId, TimelineRow};

/// Window length the original deployment trained with.
pub const DEFAULT_WINDOW: usize = 30;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by sequence building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// The timeline is shorter than one window.
    InsufficientHistory { required: usize, available: usize },
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::InsufficientHistory {
                required,
                available,
            } => {
                write!(f, "insufficient history: need {required} rows, have {available}")
            }
        }
    }
}

impl std::error::Error for SequenceError {}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Lazy iterator over every contiguous `width`-row slice of a timeline, in
/// timeline order. Restartable: it is `Clone`, and [`windows`] can be called
/// again on the same rows.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    rows: &'a [TimelineRow],
    width: usize,
    next: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = &'a [TimelineRow];

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.next.checked_add(self.width)?;
        if end > self.rows.len() {
            return None;
        }
        let window = &self.rows[self.next..end];
        self.next += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.rows.len() + 1)
            .saturating_sub(self.width)
            .saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

/// All contiguous `width`-row windows of `rows`, stride 1.
///
/// A timeline of `len` rows yields exactly `len - width + 1` windows; fewer
/// than `width` rows is [`SequenceError::InsufficientHistory`].
pub fn windows(rows: &[TimelineRow], width: usize) -> Result<Windows<'_>, SequenceError> {
    debug_assert!(width > 0);
    if rows.len() < width {
        return Err(SequenceError::InsufficientHistory {
            required: width,
            available: rows.len(),
        });
    }
    Ok(Windows {
        rows,
        width,
        next: 0,
    })
}

/// The most recent `width` rows: the slice a next-step forecast consumes.
pub fn latest_window(rows: &[TimelineRow], width: usize) -> Result<&[TimelineRow], SequenceError> {
    debug_assert!(width > 0);
    if rows.len() < width {
        return Err(SequenceError::InsufficientHistory {
            required: width,
            available: rows.len(),
        });
    }
    Ok(&rows[rows.len() - width..])
}

// ---------------------------------------------------------------------------
// Per-patient split
// ---------------------------------------------------------------------------

/// Split globally sorted canonical rows into one chronological timeline per
/// patient.
///
/// The canonical global order is ascending `(date, time, patient)`, so each
/// patient's rows arrive here already in chronological order; this only
/// regroups them.
pub fn patient_timelines(rows: &[TimelineRow]) -> BTreeMap<PatientId, Vec<TimelineRow>> {
    let mut timelines: BTreeMap<PatientId, Vec<TimelineRow>> = BTreeMap::new();
    for row in rows {
        timelines
            .entry(row.patient.clone())
            .or_default()
            .push(row.clone());
    }
    timelines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
