//! Single-file CSV loaders for the three source tables.
//!
//! Column lookup is case-insensitive and order-independent, with per-column
//! aliases because raw exports label the same metric differently across
//! sites (`Heart_Rate` vs `Heart Rate (HR)`). Key columns are required;
//! metric columns are optional and gap when absent.
//!
//! ## Key column contract
//!
//! | Source            | Required keys               | Chronology        |
//! |-------------------|-----------------------------|-------------------|
//! | blood_monitoring  | `Patient_ID`, `Date`, `Time`| `(date, time)`    |
//! | bp_monitoring     | `Patient_ID`, `Date`, `Time`| `(date, time)`    |
//! | lab_results       | `Patient_ID`, `Date`        | date only         |
//!
//! Dates are day-month-year (`31-12-2024`); times dotted or colon-separated
//! (`14.30.00` / `14:30:00`). A row whose key cells are blank or malformed
//! cannot be placed on a timeline: it is excluded and counted in
//! [`TableLoad::rows_without_key`].

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;

use vdk_schemas::{BpReading, LabPanel, PatientId, Stamp, VitalsReading};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Structural load failures. Everything row-level is counted, not raised.
#[derive(Debug)]
pub enum LoadError {
    /// The file reference does not resolve (missing file, unreadable).
    SourceUnavailable { path: String, reason: String },
    /// The header row lacks a required key column.
    MissingColumn { path: String, column: &'static str },
    /// The CSV header could not be decoded at all.
    Malformed { path: String, reason: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::SourceUnavailable { path, reason } => {
                write!(f, "source unavailable: '{path}': {reason}")
            }
            LoadError::MissingColumn { path, column } => {
                write!(f, "'{path}': missing required key column '{column}'")
            }
            LoadError::Malformed { path, reason } => {
                write!(f, "'{path}': malformed csv: {reason}")
            }
        }
    }
}

impl std::error::Error for LoadError {}

// ---------------------------------------------------------------------------
// Load result
// ---------------------------------------------------------------------------

/// One parsed source table plus row accounting for the load.
#[derive(Debug, Clone)]
pub struct TableLoad<T> {
    pub rows: Vec<T>,
    /// Rows excluded because their key cells (patient id, date, time) were
    /// blank, malformed, or undecodable.
    pub rows_without_key: usize,
}

// ---------------------------------------------------------------------------
// Header index
// ---------------------------------------------------------------------------

const PATIENT_ALIASES: &[&str] = &["Patient_ID", "Patient ID"];
const DATE_ALIASES: &[&str] = &["Date"];
const TIME_ALIASES: &[&str] = &["Time"];

/// Case-insensitive column-name → index map built from the header row.
struct HeaderIndex {
    by_name: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(headers: &csv::StringRecord) -> Self {
        let mut by_name = HashMap::new();
        for (i, col) in headers.iter().enumerate() {
            // first occurrence wins on duplicate headers
            by_name
                .entry(col.trim().to_ascii_lowercase())
                .or_insert(i);
        }
        HeaderIndex { by_name }
    }

    /// Index of the first alias present, if any.
    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|name| self.by_name.get(&name.to_ascii_lowercase()).copied())
    }

    fn require(
        &self,
        origin: &str,
        column: &'static str,
        aliases: &[&str],
    ) -> Result<usize, LoadError> {
        self.find(aliases).ok_or_else(|| LoadError::MissingColumn {
            path: origin.to_string(),
            column,
        })
    }
}

// ---------------------------------------------------------------------------
// Cell helpers
// ---------------------------------------------------------------------------

/// Numeric cell → value. Blank, absent, or unparseable cells are gaps, never
/// errors. A literal `NaN`/`inf` is a gap, not a value.
fn value_at(record: &csv::StringRecord, idx: Option<usize>) -> Option<f64> {
    let cell = record.get(idx?)?.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Key cells for a continuous row. `None` when the patient id is blank or
/// either chronological cell is malformed.
fn continuous_key(
    record: &csv::StringRecord,
    patient_col: usize,
    date_col: usize,
    time_col: usize,
) -> Option<(PatientId, Stamp)> {
    let patient = PatientId::new(record.get(patient_col)?.trim());
    if patient.is_blank() {
        return None;
    }
    let stamp = Stamp::parse(record.get(date_col)?, record.get(time_col)?)?;
    Some((patient, stamp))
}

/// Key cells for a lab row (date only, no time-of-day).
fn lab_key(
    record: &csv::StringRecord,
    patient_col: usize,
    date_col: usize,
) -> Option<(PatientId, NaiveDate)> {
    let patient = PatientId::new(record.get(patient_col)?.trim());
    if patient.is_blank() {
        return None;
    }
    let date = Stamp::parse_date(record.get(date_col)?)?;
    Some((patient, date))
}

fn reader(src: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(src.as_bytes())
}

fn read_headers(rdr: &mut csv::Reader<&[u8]>, origin: &str) -> Result<csv::StringRecord, LoadError> {
    rdr.headers().cloned().map_err(|e| LoadError::Malformed {
        path: origin.to_string(),
        reason: e.to_string(),
    })
}

fn read_source(path: &Path) -> Result<(String, String), LoadError> {
    let origin = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(src) => Ok((src, origin)),
        Err(e) => Err(LoadError::SourceUnavailable {
            path: origin,
            reason: e.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Blood-chemistry monitor
// ---------------------------------------------------------------------------

const GLUCOSE_ALIASES: &[&str] = &["Blood_Glucose", "Blood Glucose Level (mg/dL)", "Blood Glucose"];
const SPO2_ALIASES: &[&str] = &["SpO2", "Blood Oxygen (SpO₂)", "Blood Oxygen"];
const ECG_ALIASES: &[&str] = &["ECG", "Electrocardiogram (ECG/EKG)"];
const HYDRATION_ALIASES: &[&str] = &["Hydration", "Hydration Levels"];
const HEART_RATE_ALIASES: &[&str] = &["Heart_Rate", "Heart Rate (HR)", "Heart Rate"];
const RESPIRATORY_ALIASES: &[&str] = &["Respiratory_Rate", "Respiratory Rate (RR)", "Respiratory Rate"];
const BODY_TEMP_ALIASES: &[&str] = &["Body_Temperature", "Body Temperature", "Body Temp"];

/// Load the blood-chemistry monitor table from `path`.
pub fn load_vitals_csv(path: &Path) -> Result<TableLoad<VitalsReading>, LoadError> {
    let (src, origin) = read_source(path)?;
    load_vitals_str(&src, &origin)
}

/// Parse the blood-chemistry monitor table from CSV text. `origin` labels
/// error messages (useful for tests without touching the filesystem).
pub fn load_vitals_str(src: &str, origin: &str) -> Result<TableLoad<VitalsReading>, LoadError> {
    let mut rdr = reader(src);
    let idx = HeaderIndex::new(&read_headers(&mut rdr, origin)?);

    let patient_col = idx.require(origin, "Patient_ID", PATIENT_ALIASES)?;
    let date_col = idx.require(origin, "Date", DATE_ALIASES)?;
    let time_col = idx.require(origin, "Time", TIME_ALIASES)?;

    let glucose = idx.find(GLUCOSE_ALIASES);
    let spo2 = idx.find(SPO2_ALIASES);
    let ecg = idx.find(ECG_ALIASES);
    let hydration = idx.find(HYDRATION_ALIASES);
    let heart_rate = idx.find(HEART_RATE_ALIASES);
    let respiratory_rate = idx.find(RESPIRATORY_ALIASES);
    let body_temperature = idx.find(BODY_TEMP_ALIASES);

    let mut rows = Vec::new();
    let mut rows_without_key = 0usize;
    for record in rdr.records() {
        let record = match record {
            Ok(r) => r,
            Err(_) => {
                rows_without_key += 1;
                continue;
            }
        };
        let Some((patient, stamp)) = continuous_key(&record, patient_col, date_col, time_col)
        else {
            rows_without_key += 1;
            continue;
        };
        rows.push(VitalsReading {
            patient,
            stamp,
            glucose: value_at(&record, glucose),
            spo2: value_at(&record, spo2),
            ecg: value_at(&record, ecg),
            hydration: value_at(&record, hydration),
            heart_rate: value_at(&record, heart_rate),
            respiratory_rate: value_at(&record, respiratory_rate),
            body_temperature: value_at(&record, body_temperature),
        });
    }
    Ok(TableLoad {
        rows,
        rows_without_key,
    })
}

// ---------------------------------------------------------------------------
// Blood-pressure monitor
// ---------------------------------------------------------------------------

const SYSTOLIC_ALIASES: &[&str] = &["Systolic_BP", "Systolic"];
const DIASTOLIC_ALIASES: &[&str] = &["Diastolic_BP", "Diastolic"];
const COMBINED_BP_ALIASES: &[&str] = &["Blood_Pressure", "Blood Pressure"];

/// Load the blood-pressure monitor table from `path`.
pub fn load_bp_csv(path: &Path) -> Result<TableLoad<BpReading>, LoadError> {
    let (src, origin) = read_source(path)?;
    load_bp_str(&src, &origin)
}

/// Parse the blood-pressure monitor table from CSV text.
///
/// Accepts either separate `Systolic_BP`/`Diastolic_BP` columns or the
/// legacy combined `Blood_Pressure` column (`"120/80"`). Split columns take
/// precedence; the combined cell only fills rows where both halves are
/// absent.
pub fn load_bp_str(src: &str, origin: &str) -> Result<TableLoad<BpReading>, LoadError> {
    let mut rdr = reader(src);
    let idx = HeaderIndex::new(&read_headers(&mut rdr, origin)?);

    let patient_col = idx.require(origin, "Patient_ID", PATIENT_ALIASES)?;
    let date_col = idx.require(origin, "Date", DATE_ALIASES)?;
    let time_col = idx.require(origin, "Time", TIME_ALIASES)?;

    let systolic_col = idx.find(SYSTOLIC_ALIASES);
    let diastolic_col = idx.find(DIASTOLIC_ALIASES);
    let combined_col = idx.find(COMBINED_BP_ALIASES);

    let mut rows = Vec::new();
    let mut rows_without_key = 0usize;
    for record in rdr.records() {
        let record = match record {
            Ok(r) => r,
            Err(_) => {
                rows_without_key += 1;
                continue;
            }
        };
        let Some((patient, stamp)) = continuous_key(&record, patient_col, date_col, time_col)
        else {
            rows_without_key += 1;
            continue;
        };

        let mut systolic = value_at(&record, systolic_col);
        let mut diastolic = value_at(&record, diastolic_col);
        if systolic.is_none() && diastolic.is_none() {
            if let Some(cell) = combined_col.and_then(|c| record.get(c)) {
                if let Some((sys, dia)) = BpReading::split_combined(cell) {
                    systolic = Some(sys);
                    diastolic = Some(dia);
                }
            }
        }

        rows.push(BpReading {
            patient,
            stamp,
            systolic,
            diastolic,
        });
    }
    Ok(TableLoad {
        rows,
        rows_without_key,
    })
}

// ---------------------------------------------------------------------------
// Lab panels
// ---------------------------------------------------------------------------

const LAB_GLUCOSE_ALIASES: &[&str] = &["Glucose"];
const HEMOGLOBIN_ALIASES: &[&str] = &["Hemoglobin"];
const CHOLESTEROL_ALIASES: &[&str] = &["Cholesterol"];
const PLATELET_ALIASES: &[&str] = &["Platelet_Count", "Platelet Count"];
const WBC_ALIASES: &[&str] = &["WBC_Count", "WBC Count", "WBC"];
const RBC_ALIASES: &[&str] = &["RBC_Count", "RBC Count", "RBC"];
const CREATININE_ALIASES: &[&str] = &["Creatinine"];
const UREA_ALIASES: &[&str] = &["Urea"];
const SODIUM_ALIASES: &[&str] = &["Sodium"];
const POTASSIUM_ALIASES: &[&str] = &["Potassium"];
const CALCIUM_ALIASES: &[&str] = &["Calcium"];

/// Load the lab-results table from `path`.
pub fn load_labs_csv(path: &Path) -> Result<TableLoad<LabPanel>, LoadError> {
    let (src, origin) = read_source(path)?;
    load_labs_str(&src, &origin)
}

/// Parse the lab-results table from CSV text. Keys are `Patient_ID` + `Date`
/// only; a `Time` column, if present, is ignored. Non-numeric columns (free
/// text lab notes) are ignored.
pub fn load_labs_str(src: &str, origin: &str) -> Result<TableLoad<LabPanel>, LoadError> {
    let mut rdr = reader(src);
    let idx = HeaderIndex::new(&read_headers(&mut rdr, origin)?);

    let patient_col = idx.require(origin, "Patient_ID", PATIENT_ALIASES)?;
    let date_col = idx.require(origin, "Date", DATE_ALIASES)?;

    let glucose = idx.find(LAB_GLUCOSE_ALIASES);
    let hemoglobin = idx.find(HEMOGLOBIN_ALIASES);
    let cholesterol = idx.find(CHOLESTEROL_ALIASES);
    let platelet_count = idx.find(PLATELET_ALIASES);
    let wbc_count = idx.find(WBC_ALIASES);
    let rbc_count = idx.find(RBC_ALIASES);
    let creatinine = idx.find(CREATININE_ALIASES);
    let urea = idx.find(UREA_ALIASES);
    let sodium = idx.find(SODIUM_ALIASES);
    let potassium = idx.find(POTASSIUM_ALIASES);
    let calcium = idx.find(CALCIUM_ALIASES);

    let mut rows = Vec::new();
    let mut rows_without_key = 0usize;
    for record in rdr.records() {
        let record = match record {
            Ok(r) => r,
            Err(_) => {
                rows_without_key += 1;
                continue;
            }
        };
        let Some((patient, date)) = lab_key(&record, patient_col, date_col) else {
            rows_without_key += 1;
            continue;
        };
        rows.push(LabPanel {
            patient,
            date,
            glucose: value_at(&record, glucose),
            hemoglobin: value_at(&record, hemoglobin),
            cholesterol: value_at(&record, cholesterol),
            platelet_count: value_at(&record, platelet_count),
            wbc_count: value_at(&record, wbc_count),
            rbc_count: value_at(&record, rbc_count),
            creatinine: value_at(&record, creatinine),
            urea: value_at(&record, urea),
            sodium: value_at(&record, sodium),
            potassium: value_at(&record, potassium),
            calcium: value_at(&record, calcium),
        });
    }
    Ok(TableLoad {
        rows,
        rows_without_key,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
