/// Integration tests for the full pipeline against a canned SSB source
///
/// These tests verify:
/// 1. A well-formed response for all 23 municipalities decodes completely
/// 2. Snapshot rows are sorted and the total row adds up
/// 3. The rendered table survives a CSV round trip through a real file
/// 4. Error payloads and malformed bodies surface as errors, not panics
///
/// No network access is needed; the live API is covered by ssb_live.rs.

use popstat_service::analysis::reshape::{self, DimensionRoles};
use popstat_service::config::PopstatConfig;
use popstat_service::export;
use popstat_service::ingest::ssb::{self, DatasetSource, PxQuery};
use popstat_service::model::{Period, PopError, METRIC_POPULATION};
use popstat_service::municipalities::{self, MUNICIPALITY_REGISTRY};
use popstat_service::pipeline;
use popstat_service::render;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Answers every query with a json-stat2 cube built from the query itself.
///
/// value(region r, content c, period t) = base(r) + 10 * t + c
/// so every cell is distinct and predictable.
struct SyntheticSource;

fn base(region_index: usize) -> f64 {
    // Distinct, non-monotonic bases so sorting is actually exercised.
    (((region_index * 7919) % 23) as f64 + 1.0) * 1000.0
}

impl DatasetSource for SyntheticSource {
    fn fetch(&self, query: &PxQuery) -> Result<String, PopError> {
        let regions = &query.query[0].selection.values;
        let contents = &query.query[1].selection.values;
        let periods = &query.query[2].selection.values;

        let mut values = Vec::new();
        for r in 0..regions.len() {
            for c in 0..contents.len() {
                for t in 0..periods.len() {
                    values.push(base(r) + 10.0 * t as f64 + c as f64);
                }
            }
        }

        let index = |keys: &Vec<String>| -> serde_json::Value {
            keys.iter()
                .enumerate()
                .map(|(i, k)| (k.clone(), serde_json::json!(i)))
                .collect::<serde_json::Map<_, _>>()
                .into()
        };

        let body = serde_json::json!({
            "class": "dataset",
            "id": ["Region", "ContentsCode", "Tid"],
            "size": [regions.len(), contents.len(), periods.len()],
            "dimension": {
                "Region": {"category": {"index": index(regions)}},
                "ContentsCode": {"category": {"index": index(contents)}},
                "Tid": {"category": {"index": index(periods)}}
            },
            "value": values
        });
        Ok(body.to_string())
    }
}

struct FixedBody(&'static str);

impl DatasetSource for FixedBody {
    fn fetch(&self, _query: &PxQuery) -> Result<String, PopError> {
        Ok(self.0.to_string())
    }
}

fn p(s: &str) -> Period {
    s.parse().expect("valid test period")
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[test]
fn test_well_formed_response_has_one_entry_per_entity_and_period() {
    let codes = municipalities::all_codes();
    let periods = ["2023K4", "2024K1", "2024K2", "2024K3"];
    let query = ssb::build_query("agg:KommSummer", &codes, &[METRIC_POPULATION], &periods).unwrap();

    let body = SyntheticSource.fetch(&query).unwrap();
    let dataset = ssb::parse_dataset(&body).unwrap();
    let table = reshape::reshape(&dataset, DimensionRoles::default()).unwrap();

    assert_eq!(table.len(), codes.len() * periods.len());
    assert_eq!(table.len(), 23 * 4);
    for (r, code) in codes.iter().enumerate() {
        assert_eq!(
            table.value(code, "2024K2", METRIC_POPULATION),
            Some(base(r) + 20.0),
            "wrong cell for {}",
            code
        );
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[test]
fn test_snapshot_for_all_municipalities() {
    let codes = municipalities::all_codes();
    let snap = pipeline::run_snapshot(
        &SyntheticSource,
        &PopstatConfig::default(),
        &codes,
        METRIC_POPULATION,
        p("2024K1"),
        p("2024K2"),
    )
    .expect("synthetic pipeline should succeed");

    assert_eq!(snap.rows.len(), MUNICIPALITY_REGISTRY.len());

    // Non-increasing by latest value, ties by code.
    for pair in snap.rows.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let (va, vb) = (a.value_latest.unwrap(), b.value_latest.unwrap());
        assert!(va > vb || (va == vb && a.entity_code < b.entity_code));
    }

    // Every municipality grew by exactly 10 in the synthetic cube.
    assert!(snap.rows.iter().all(|r| r.absolute_change == Some(10.0)));
    let sum_changes: f64 = snap.rows.iter().filter_map(|r| r.absolute_change).sum();
    assert_eq!(snap.summary.absolute_change, sum_changes);
    assert_eq!(snap.summary.absolute_change, 230.0);

    let sum_previous: f64 = snap.rows.iter().filter_map(|r| r.value_previous).sum();
    let expected_pct = 230.0 / sum_previous * 100.0;
    assert!((snap.summary.percent_change.unwrap() - expected_pct).abs() < 1e-9);

    // Labels fall back to registry names when SSB sends none.
    assert!(snap.rows.iter().any(|r| r.label == "Stavanger"));
}

#[test]
fn test_snapshot_csv_round_trip_through_file() {
    let codes = municipalities::all_codes();
    let snap = pipeline::run_snapshot(
        &SyntheticSource,
        &PopstatConfig::default(),
        &codes,
        METRIC_POPULATION,
        p("2024K1"),
        p("2024K2"),
    )
    .unwrap();
    let table = render::snapshot_table(&snap);

    let dir = tempfile::tempdir().expect("temp dir");
    let name = export::csv_file_name("Rogaland", "2024K1", "2024K2");
    let path = export::write_csv_file(&table, dir.path(), &name).expect("write CSV");
    assert!(path.ends_with("rogaland_befolkning_2024K1_2024K2.csv"));

    let file = std::fs::File::open(&path).unwrap();
    let back = export::read_csv(file).unwrap();
    assert_eq!(back.columns, table.columns);
    assert_eq!(back.rows, table.rows);
    assert_eq!(back.rows.len(), 24, "23 municipalities plus the total row");
    assert_eq!(back.rows.last().unwrap()[1], "Totalt Rogaland");
}

// ---------------------------------------------------------------------------
// Trend and quarter report
// ---------------------------------------------------------------------------

#[test]
fn test_trend_for_one_municipality() {
    let range = popstat_service::periods::period_range(p("2023K3"), p("2024K2")).unwrap();
    let series = pipeline::run_trend(
        &SyntheticSource,
        &PopstatConfig::default(),
        "K-1103",
        METRIC_POPULATION,
        &range,
    )
    .unwrap();

    assert_eq!(series.points.len(), 4);
    assert_eq!(series.label, "Stavanger");
    assert_eq!(series.points[0].period, "2023K3");
    assert!(series.points[1..].iter().all(|pt| pt.absolute_change == Some(10.0)));
    assert_eq!(series.total_change().map(|(c, _)| c), Some(30.0));

    let table = render::trend_table(&series);
    assert_eq!(table.rows.len(), 4);
    assert_eq!(table.columns[0], "Periode");
}

#[test]
fn test_quarter_report_requests_both_content_codes() {
    let codes = municipalities::all_codes();
    let report = pipeline::run_quarter_report(
        &SyntheticSource,
        &PopstatConfig::default(),
        &codes,
        p("2024K2"),
    )
    .unwrap();

    assert_eq!(report.rows.len(), 23);
    // growth is content index 0, population index 1 in the synthetic cube
    let first = &report.rows[0];
    assert_eq!(first.entity_code, "K-1101");
    assert_eq!(first.population.unwrap() - first.growth.unwrap(), 1.0);

    let total_pop: f64 = report.rows.iter().filter_map(|r| r.population).sum();
    assert_eq!(report.total.population, Some(total_pop));
    assert_eq!(report.total.label, "Totalt Rogaland");

    let table = render::quarter_report_table(&report);
    assert_eq!(table.columns, ["Kommune", "Folketall endring", "Summer folketall"]);
    assert_eq!(table.rows.len(), 24);
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

#[test]
fn test_api_error_payload_surfaces_as_api_error() {
    let result = pipeline::run_snapshot(
        &FixedBody(r#"{"error": "Table 01222 is being updated"}"#),
        &PopstatConfig::default(),
        &["K-1103"],
        METRIC_POPULATION,
        p("2024K1"),
        p("2024K2"),
    );
    assert_eq!(
        result.unwrap_err(),
        PopError::ApiError("Table 01222 is being updated".to_string())
    );
}

#[test]
fn test_malformed_body_surfaces_as_shape_error() {
    let result = pipeline::run_quarter_report(
        &FixedBody("Service Unavailable"),
        &PopstatConfig::default(),
        &["K-1103"],
        p("2024K2"),
    );
    assert!(matches!(result, Err(PopError::DataShapeError(_))));
}
