/// Terminal presentation: table construction, text tables and charts.
///
/// Everything here returns `String`s so the binary decides where output
/// goes and tests can inspect it.

use crate::analysis::metrics::{QuarterReport, Snapshot, TrendSeries};
use crate::model::{Table, METRIC_GROWTH, METRIC_POPULATION};

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Whole numbers without decimals, anything else with two.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{}", v),
        Some(v) => format!("{:.2}", v),
        None => String::new(),
    }
}

/// Like `format_value` but always signed: `+10`, `-5`.
pub fn format_change(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{:+}", v),
        Some(v) => format!("{:+.2}", v),
        None => String::new(),
    }
}

/// Percentages always carry two decimals: `+3.33`.
pub fn format_percent(value: Option<f64>) -> String {
    value.map(|v| format!("{:+.2}", v)).unwrap_or_default()
}

/// Column heading for a content code.
pub fn metric_heading(metric: &str) -> &str {
    match metric {
        METRIC_POPULATION => "Folketall",
        METRIC_GROWTH => "Folketilvekst",
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

pub fn snapshot_table(snapshot: &Snapshot) -> Table {
    let heading = metric_heading(&snapshot.metric);
    let columns = vec![
        "Kode".to_string(),
        "Kommune".to_string(),
        format!("{} {}", heading, snapshot.period_previous),
        format!("{} {}", heading, snapshot.period_latest),
        "Endring".to_string(),
        "Endring (%)".to_string(),
    ];

    let mut rows: Vec<Vec<String>> = snapshot
        .rows
        .iter()
        .map(|r| {
            vec![
                r.entity_code.clone(),
                r.label.clone(),
                format_value(r.value_previous),
                format_value(r.value_latest),
                format_change(r.absolute_change),
                format_percent(r.percent_change),
            ]
        })
        .collect();

    let s = &snapshot.summary;
    rows.push(vec![
        String::new(),
        s.label.clone(),
        format_value(Some(s.value_previous)),
        format_value(Some(s.value_latest)),
        format_change(Some(s.absolute_change)),
        format_percent(s.percent_change),
    ]);

    Table {
        title: format!(
            "{}: {} -> {}",
            heading, snapshot.period_previous, snapshot.period_latest
        ),
        columns,
        rows,
    }
}

pub fn trend_table(series: &TrendSeries) -> Table {
    let rows = series
        .points
        .iter()
        .map(|p| {
            vec![
                p.period.clone(),
                format_value(p.value),
                format_change(p.absolute_change),
                format_percent(p.percent_change),
            ]
        })
        .collect();

    let span = match (series.points.first(), series.points.last()) {
        (Some(first), Some(last)) => format!(" {} - {}", first.period, last.period),
        _ => String::new(),
    };

    Table {
        title: format!("{}: {}{}", series.label, metric_heading(&series.metric), span),
        columns: vec![
            "Periode".to_string(),
            metric_heading(&series.metric).to_string(),
            "Endring".to_string(),
            "Endring (%)".to_string(),
        ],
        rows,
    }
}

pub fn quarter_report_table(report: &QuarterReport) -> Table {
    let mut rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|r| {
            vec![
                r.label.clone(),
                format_change(r.growth),
                format_value(r.population),
            ]
        })
        .collect();
    rows.push(vec![
        report.total.label.clone(),
        format_change(report.total.growth),
        format_value(report.total.population),
    ]);

    Table {
        title: format!("Data for {}", report.period_label),
        columns: vec![
            "Kommune".to_string(),
            "Folketall endring".to_string(),
            "Summer folketall".to_string(),
        ],
        rows,
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn width(s: &str) -> usize {
    s.chars().count()
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.parse::<f64>().is_ok()
}

fn pad(cell: &str, w: usize, right: bool) -> String {
    let fill = " ".repeat(w.saturating_sub(width(cell)));
    if right {
        format!("{}{}", fill, cell)
    } else {
        format!("{}{}", cell, fill)
    }
}

/// Plain-text table: numbers right-aligned, text left-aligned.
pub fn table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| width(c)).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(width(cell));
            }
        }
    }

    let mut out = String::new();
    if !table.title.is_empty() {
        out.push_str(&table.title);
        out.push('\n');
    }

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, &w)| pad(c, w, false))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| pad(cell, w, is_numeric(cell)))
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

/// Horizontal bar chart. Negative values are drawn with a lighter glyph.
pub fn bar_chart(title: &str, bars: &[(String, f64)], max_width: usize) -> String {
    let mut out = format!("{}\n", title);
    let label_width = bars.iter().map(|(l, _)| width(l)).max().unwrap_or(0);
    let max_abs = bars.iter().map(|(_, v)| v.abs()).fold(0.0_f64, f64::max);

    for (label, value) in bars {
        let len = if max_abs > 0.0 {
            ((value.abs() / max_abs) * max_width as f64).round() as usize
        } else {
            0
        };
        let glyph = if *value < 0.0 { "░" } else { "█" };
        out.push_str(&format!(
            "{} | {} {}\n",
            pad(label, label_width, false),
            glyph.repeat(len),
            format_value(Some(*value))
        ));
    }
    out
}

/// Scatter-style line chart of a time series, `height` rows tall.
pub fn line_chart(title: &str, points: &[(&str, f64)], height: usize) -> String {
    let mut out = format!("{}\n", title);
    if points.is_empty() || height == 0 {
        out.push_str("(no data)\n");
        return out;
    }

    let min = points.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let level = |v: f64| -> usize {
        if span == 0.0 || height == 1 {
            0
        } else {
            (((v - min) / span) * (height - 1) as f64).round() as usize
        }
    };

    let max_label = format_value(Some(max));
    let min_label = format_value(Some(min));
    let axis_width = width(&max_label).max(width(&min_label));

    for row in (0..height).rev() {
        let axis = if row == height - 1 {
            pad(&max_label, axis_width, true)
        } else if row == 0 {
            pad(&min_label, axis_width, true)
        } else {
            " ".repeat(axis_width)
        };
        let cells: String = points
            .iter()
            .map(|(_, v)| if level(*v) == row { " ●" } else { "  " })
            .collect();
        out.push_str(&format!("{} |{}\n", axis, cells.trim_end()));
    }

    out.push_str(&format!("{} +{}\n", " ".repeat(axis_width), "--".repeat(points.len())));
    let first = points[0].0;
    let last = points[points.len() - 1].0;
    out.push_str(&format!("{}  {} .. {}\n", " ".repeat(axis_width), first, last));
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::snapshot;
    use crate::model::{ObservationTable, RawObservation};

    fn example_snapshot() -> Snapshot {
        let mut t = ObservationTable::default();
        for (e, p, v) in [
            ("A", "2024K1", 100.0),
            ("A", "2024K2", 110.0),
            ("B", "2024K1", 50.0),
            ("B", "2024K2", 45.0),
        ] {
            t.insert(RawObservation {
                entity_code: e.into(),
                period: p.into(),
                metric: METRIC_POPULATION.into(),
                value: Some(v),
            });
        }
        snapshot(&t, &["A", "B"], METRIC_POPULATION, "2024K1", "2024K2", "Totalt Rogaland")
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_value(Some(149000.0)), "149000");
        assert_eq!(format_value(Some(2.5)), "2.50");
        assert_eq!(format_value(None), "");
        assert_eq!(format_change(Some(10.0)), "+10");
        assert_eq!(format_change(Some(-5.0)), "-5");
        assert_eq!(format_percent(Some(5.0 / 150.0 * 100.0)), "+3.33");
        assert_eq!(format_percent(Some(-10.0)), "-10.00");
        assert_eq!(format_percent(None), "");
    }

    #[test]
    fn test_snapshot_table_matches_worked_example() {
        let t = snapshot_table(&example_snapshot());
        assert_eq!(
            t.columns,
            ["Kode", "Kommune", "Folketall 2024K1", "Folketall 2024K2", "Endring", "Endring (%)"]
        );
        assert_eq!(t.rows[0], ["A", "A", "100", "110", "+10", "+10.00"]);
        assert_eq!(t.rows[1], ["B", "B", "50", "45", "-5", "-10.00"]);
        assert_eq!(t.rows[2], ["", "Totalt Rogaland", "150", "155", "+5", "+3.33"]);
    }

    #[test]
    fn test_text_table_aligns_columns() {
        let out = table(&snapshot_table(&example_snapshot()));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Folketall: 2024K1 -> 2024K2");
        assert!(lines[1].starts_with("Kode"));
        assert!(lines[2].chars().all(|c| c == '-' || c == ' '));
        assert_eq!(lines.len(), 3 + 3);
        assert!(lines[5].contains("Totalt Rogaland"));
    }

    #[test]
    fn test_bar_chart_scales_to_largest() {
        let out = bar_chart(
            "Folketall",
            &[("Stavanger".to_string(), 100.0), ("Utsira".to_string(), 50.0)],
            10,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1].matches('█').count(), 10);
        assert_eq!(lines[2].matches('█').count(), 5);
    }

    #[test]
    fn test_line_chart_places_extremes_on_top_and_bottom_rows() {
        let out = line_chart("Trend", &[("2024K1", 10.0), ("2024K2", 20.0), ("2024K3", 15.0)], 5);
        let lines: Vec<&str> = out.lines().collect();
        // title + 5 rows + axis + labels
        assert_eq!(lines.len(), 8);
        assert!(lines[1].starts_with("20 |"));
        assert!(lines[5].starts_with("10 |"));
        assert!(lines[7].contains("2024K1 .. 2024K3"));
    }

    #[test]
    fn test_line_chart_empty_series() {
        assert!(line_chart("Trend", &[], 5).contains("(no data)"));
    }
}
