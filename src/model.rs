/// Core data types for the Rogaland population dashboard.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O; the only logic is period parsing and ordering, which
/// every other module relies on.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Content codes (SSB table 01222)
// ---------------------------------------------------------------------------

/// Population at the end of the quarter.
pub const METRIC_POPULATION: &str = "Folketallet11";

/// Population growth during the quarter.
pub const METRIC_GROWTH: &str = "Folketilvekst10";

/// Dimension names used by table 01222.
pub const DIM_REGION: &str = "Region";
pub const DIM_CONTENTS: &str = "ContentsCode";
pub const DIM_TIME: &str = "Tid";

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

/// A calendar quarter, displayed the way SSB does: `2024K2`.
///
/// Field order matters: the derived `Ord` compares year first, then quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub quarter: u8,
}

impl Period {
    /// Returns `None` unless `quarter` is in 1..=4.
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        if (1..=4).contains(&quarter) {
            Some(Period { year, quarter })
        } else {
            None
        }
    }

    pub fn previous(self) -> Self {
        if self.quarter == 1 {
            Period { year: self.year - 1, quarter: 4 }
        } else {
            Period { year: self.year, quarter: self.quarter - 1 }
        }
    }

    pub fn next(self) -> Self {
        if self.quarter == 4 {
            Period { year: self.year + 1, quarter: 1 }
        } else {
            Period { year: self.year, quarter: self.quarter + 1 }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}K{}", self.year, self.quarter)
    }
}

impl FromStr for Period {
    type Err = PopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PopError::InvalidQuery(format!("not a quarter identifier: {:?}", s));

        let (year, quarter) = s.trim().split_once(['K', 'k']).ok_or_else(invalid)?;
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let quarter: u8 = quarter.parse().map_err(|_| invalid())?;

        Period::new(year, quarter).ok_or_else(invalid)
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// One value of the decoded dataset, with its coordinates spelled out.
///
/// The API never sends these tuples directly; they are reconstructed from
/// the flat `value` array by `analysis::reshape`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub entity_code: String,
    pub period: String,
    pub metric: String,
    /// `None` when the API reports `null` for this cell.
    pub value: Option<f64>,
}

/// Key into an `ObservationTable`: (entity code, period, metric).
pub type ObservationKey = (String, String, String);

/// Decoded dataset: exactly one entry per requested (entity, period, metric).
///
/// Label maps carry the display names SSB returned for each category,
/// e.g. `"K-1103" -> "Stavanger"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    pub values: BTreeMap<ObservationKey, Option<f64>>,
    pub entity_labels: BTreeMap<String, String>,
    pub period_labels: BTreeMap<String, String>,
    pub metric_labels: BTreeMap<String, String>,
}

impl ObservationTable {
    pub fn insert(&mut self, obs: RawObservation) {
        self.values
            .insert((obs.entity_code, obs.period, obs.metric), obs.value);
    }

    /// Outer `None`: the combination was never returned.
    /// Inner `None`: the API returned `null` for it.
    pub fn get(&self, entity: &str, period: &str, metric: &str) -> Option<Option<f64>> {
        self.values
            .get(&(entity.to_string(), period.to_string(), metric.to_string()))
            .copied()
    }

    /// Value if present and non-null.
    pub fn value(&self, entity: &str, period: &str, metric: &str) -> Option<f64> {
        self.get(entity, period, metric).flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn entity_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.entity_labels.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn period_label<'a>(&'a self, period: &'a str) -> &'a str {
        self.period_labels.get(period).map(String::as_str).unwrap_or(period)
    }

    pub fn metric_label<'a>(&'a self, metric: &'a str) -> &'a str {
        self.metric_labels.get(metric).map(String::as_str).unwrap_or(metric)
    }
}

// ---------------------------------------------------------------------------
// Derived rows
// ---------------------------------------------------------------------------

/// One municipality's change between two periods.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub entity_code: String,
    pub label: String,
    pub period_latest: String,
    pub value_latest: Option<f64>,
    pub value_previous: Option<f64>,
    /// `value_latest - value_previous`, if both are present.
    pub absolute_change: Option<f64>,
    /// `None` when the previous value is zero or missing.
    pub percent_change: Option<f64>,
}

/// Region-wide totals over all `DerivedRow`s of a snapshot.
///
/// The percentage is recomputed from the summed bases, not averaged.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: String,
    pub value_latest: f64,
    pub value_previous: f64,
    pub absolute_change: f64,
    pub percent_change: Option<f64>,
}

/// Percentage change from `previous` to `latest`.
///
/// Returns `None` instead of dividing by zero.
pub fn percent_change(absolute_change: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() {
        None
    } else {
        Some(absolute_change / previous * 100.0)
    }
}

// ---------------------------------------------------------------------------
// Presentation contract
// ---------------------------------------------------------------------------

/// Final tabular structure consumed by the renderer and the CSV writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or processing SSB data.
#[derive(Debug, Clone, PartialEq)]
pub enum PopError {
    /// Non-2xx HTTP response from the SSB API.
    HttpError(u16),
    /// The request never produced a response (DNS, TLS, timeout, ...).
    TransportError(String),
    /// The API answered with an error message instead of data.
    ApiError(String),
    /// The response did not have the expected json-stat2 shape.
    DataShapeError(String),
    /// The caller asked for something that cannot be queried
    /// (empty selection, unknown municipality, bad period).
    InvalidQuery(String),
    /// Writing the CSV export failed.
    ExportError(String),
}

impl fmt::Display for PopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopError::HttpError(code) => write!(f, "HTTP error: {}", code),
            PopError::TransportError(msg) => write!(f, "Transport error: {}", msg),
            PopError::ApiError(msg) => write!(f, "API error: {}", msg),
            PopError::DataShapeError(msg) => write!(f, "Data shape error: {}", msg),
            PopError::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
            PopError::ExportError(msg) => write!(f, "Export error: {}", msg),
        }
    }
}

impl PopError {
    /// True when the failure came from talking to SSB or reading its answer,
    /// as opposed to bad user input or a failed export.
    pub fn is_data_source_failure(&self) -> bool {
        matches!(
            self,
            PopError::HttpError(_)
                | PopError::TransportError(_)
                | PopError::ApiError(_)
                | PopError::DataShapeError(_)
        )
    }

    /// One-line message for the terminal.
    pub fn user_message(&self) -> String {
        if self.is_data_source_failure() {
            format!("Error fetching or processing data from SSB: {}", self)
        } else {
            format!("Error: {}", self)
        }
    }
}

impl std::error::Error for PopError {}

impl From<csv::Error> for PopError {
    fn from(err: csv::Error) -> Self {
        PopError::ExportError(err.to_string())
    }
}

impl From<std::io::Error> for PopError {
    fn from(err: std::io::Error) -> Self {
        PopError::ExportError(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
