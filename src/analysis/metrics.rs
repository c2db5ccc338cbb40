/// Period-over-period metrics.
///
/// Three views over an `ObservationTable`:
/// - `snapshot`: every municipality, latest vs. previous period, with a
///   region total row.
/// - `trend`: one municipality over a contiguous run of quarters.
/// - `quarter_report`: reported growth and population for one quarter.

use std::cmp::Ordering;

use crate::model::{percent_change, DerivedRow, ObservationTable, SummaryRow};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub metric: String,
    pub period_previous: String,
    pub period_latest: String,
    /// Sorted by descending latest value, ties by entity code.
    pub rows: Vec<DerivedRow>,
    pub summary: SummaryRow,
}

/// Compute each entity's change from `previous` to `latest`, plus the sum.
///
/// A missing or zero previous value yields `percent_change: None` for that
/// row only; the rest of the snapshot is unaffected.
pub fn snapshot<E: AsRef<str>>(
    table: &ObservationTable,
    entities: &[E],
    metric: &str,
    previous: &str,
    latest: &str,
    summary_label: &str,
) -> Snapshot {
    let mut rows: Vec<DerivedRow> = entities
        .iter()
        .map(|e| {
            let code = e.as_ref();
            let value_latest = table.value(code, latest, metric);
            let value_previous = table.value(code, previous, metric);
            let absolute_change = match (value_latest, value_previous) {
                (Some(l), Some(p)) => Some(l - p),
                _ => None,
            };
            let percent = match (absolute_change, value_previous) {
                (Some(change), Some(p)) => percent_change(change, p),
                _ => None,
            };
            DerivedRow {
                entity_code: code.to_string(),
                label: table.entity_label(code).to_string(),
                period_latest: latest.to_string(),
                value_latest,
                value_previous,
                absolute_change,
                percent_change: percent,
            }
        })
        .collect();

    rows.sort_by(compare_rows);

    let summary = summarize(&rows, summary_label);

    Snapshot {
        metric: metric.to_string(),
        period_previous: previous.to_string(),
        period_latest: latest.to_string(),
        rows,
        summary,
    }
}

/// Descending by latest value (missing last), then ascending by code.
fn compare_rows(a: &DerivedRow, b: &DerivedRow) -> Ordering {
    let by_value = match (a.value_latest, b.value_latest) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_value.then_with(|| a.entity_code.cmp(&b.entity_code))
}

/// Sum the rows. The percentage is recomputed from the summed previous
/// values of the rows that have a change, never averaged.
pub fn summarize(rows: &[DerivedRow], label: &str) -> SummaryRow {
    let value_latest = rows.iter().filter_map(|r| r.value_latest).sum();
    let (absolute_change, value_previous) = rows
        .iter()
        .filter_map(|r| Some((r.absolute_change?, r.value_previous?)))
        .fold((0.0, 0.0), |(c, p), (rc, rp)| (c + rc, p + rp));

    SummaryRow {
        label: label.to_string(),
        value_latest,
        value_previous,
        absolute_change,
        percent_change: percent_change(absolute_change, value_previous),
    }
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub period: String,
    pub value: Option<f64>,
    /// Change from the previous point; `None` for the first point.
    pub absolute_change: Option<f64>,
    pub percent_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub entity_code: String,
    pub label: String,
    pub metric: String,
    /// Oldest first.
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// Change from the first to the last point with a value.
    pub fn total_change(&self) -> Option<(f64, Option<f64>)> {
        let first = self.points.iter().find_map(|p| p.value)?;
        let last = self.points.iter().rev().find_map(|p| p.value)?;
        let change = last - first;
        Some((change, percent_change(change, first)))
    }

    /// (period, value) pairs for plotting, skipping empty cells.
    pub fn series(&self) -> Vec<(&str, f64)> {
        self.points
            .iter()
            .filter_map(|p| Some((p.period.as_str(), p.value?)))
            .collect()
    }
}

/// One entity's values over `periods`, each compared with the one before.
pub fn trend<P: AsRef<str>>(
    table: &ObservationTable,
    entity: &str,
    metric: &str,
    periods: &[P],
) -> TrendSeries {
    let mut points = Vec::with_capacity(periods.len());
    let mut previous: Option<f64> = None;

    for period in periods {
        let value = table.value(entity, period.as_ref(), metric);
        let absolute_change = match (value, previous) {
            (Some(v), Some(p)) => Some(v - p),
            _ => None,
        };
        let percent = match (absolute_change, previous) {
            (Some(c), Some(p)) => percent_change(c, p),
            _ => None,
        };
        points.push(TrendPoint {
            period: period.as_ref().to_string(),
            value,
            absolute_change,
            percent_change: percent,
        });
        previous = value;
    }

    TrendSeries {
        entity_code: entity.to_string(),
        label: table.entity_label(entity).to_string(),
        metric: metric.to_string(),
        points,
    }
}

// ---------------------------------------------------------------------------
// Quarter report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterReportRow {
    pub entity_code: String,
    pub label: String,
    pub growth: Option<f64>,
    pub population: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterReport {
    pub period: String,
    pub period_label: String,
    /// In the order the entities were requested.
    pub rows: Vec<QuarterReportRow>,
    pub total: QuarterReportRow,
}

/// Reported growth and end-of-quarter population per entity, with totals.
pub fn quarter_report<E: AsRef<str>>(
    table: &ObservationTable,
    entities: &[E],
    growth_metric: &str,
    population_metric: &str,
    period: &str,
    total_label: &str,
) -> QuarterReport {
    let rows: Vec<QuarterReportRow> = entities
        .iter()
        .map(|e| {
            let code = e.as_ref();
            QuarterReportRow {
                entity_code: code.to_string(),
                label: table.entity_label(code).to_string(),
                growth: table.value(code, period, growth_metric),
                population: table.value(code, period, population_metric),
            }
        })
        .collect();

    let sum = |f: fn(&QuarterReportRow) -> Option<f64>| -> Option<f64> {
        let values: Vec<f64> = rows.iter().filter_map(f).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum())
        }
    };

    let total = QuarterReportRow {
        entity_code: String::new(),
        label: total_label.to_string(),
        growth: sum(|r| r.growth),
        population: sum(|r| r.population),
    };

    QuarterReport {
        period: period.to_string(),
        period_label: table.period_label(period).to_string(),
        rows,
        total,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
