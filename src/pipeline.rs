/// One pipeline run per user action: query, fetch, decode, compute.
///
/// Each function either returns a complete result or the first error; a
/// failed run never hands back a partially built table.

use crate::analysis::metrics::{self, QuarterReport, Snapshot, TrendSeries};
use crate::analysis::reshape::{self, DimensionRoles};
use crate::config::PopstatConfig;
use crate::ingest::ssb::{self, DatasetSource};
use crate::logging::{self, DataSource};
use crate::model::{ObservationTable, Period, PopError, METRIC_GROWTH, METRIC_POPULATION};
use crate::municipalities;

/// Query `source` for every (entity, metric, period) combination and decode
/// the answer into an `ObservationTable`.
pub fn fetch_observations(
    source: &dyn DatasetSource,
    config: &PopstatConfig,
    entities: &[&str],
    metrics: &[&str],
    periods: &[String],
) -> Result<ObservationTable, PopError> {
    let query = ssb::build_query(&config.api.region_filter, entities, metrics, periods)?;
    let body = source.fetch(&query)?;
    let dataset = ssb::parse_dataset(&body)?;
    let mut table = reshape::reshape(&dataset, DimensionRoles::default())?;
    reshape::ensure_complete(&table, entities, periods, metrics)?;

    // Fall back to registry names where SSB sent no label.
    for code in entities {
        if !table.entity_labels.contains_key(*code) {
            if let Some(m) = municipalities::find_municipality(code) {
                table.entity_labels.insert(code.to_string(), m.name.to_string());
            }
        }
    }

    let requested = entities.len() * metrics.len() * periods.len();
    let received = table.values.values().filter(|v| v.is_some()).count();
    logging::log_fetch_summary("fetch", requested, received);

    Ok(table)
}

/// All entities, `previous` vs. `latest`, with a region total.
pub fn run_snapshot(
    source: &dyn DatasetSource,
    config: &PopstatConfig,
    entities: &[&str],
    metric: &str,
    previous: Period,
    latest: Period,
) -> Result<Snapshot, PopError> {
    if previous >= latest {
        return Err(PopError::InvalidQuery(format!(
            "previous period {} must come before {}",
            previous, latest
        )));
    }

    logging::info(
        DataSource::Ssb,
        None,
        &format!("snapshot of {} municipalities, {} -> {}", entities.len(), previous, latest),
    );

    let periods = vec![previous.to_string(), latest.to_string()];
    let table = fetch_observations(source, config, entities, &[metric], &periods)?;

    Ok(metrics::snapshot(
        &table,
        entities,
        metric,
        &periods[0],
        &periods[1],
        &config.total_label(),
    ))
}

/// One entity over a contiguous run of quarters.
pub fn run_trend(
    source: &dyn DatasetSource,
    config: &PopstatConfig,
    entity: &str,
    metric: &str,
    periods: &[Period],
) -> Result<TrendSeries, PopError> {
    if periods.windows(2).any(|w| w[1] != w[0].next()) {
        return Err(PopError::InvalidQuery(
            "trend periods must be consecutive quarters".to_string(),
        ));
    }

    logging::info(
        DataSource::Ssb,
        Some(entity),
        &format!("trend over {} quarters", periods.len()),
    );

    let periods: Vec<String> = periods.iter().map(|p| p.to_string()).collect();
    let table = fetch_observations(source, config, &[entity], &[metric], &periods)?;

    Ok(metrics::trend(&table, entity, metric, &periods))
}

/// Reported growth and population for one quarter, as the classic
/// single-quarter view.
pub fn run_quarter_report(
    source: &dyn DatasetSource,
    config: &PopstatConfig,
    entities: &[&str],
    period: Period,
) -> Result<QuarterReport, PopError> {
    logging::info(
        DataSource::Ssb,
        None,
        &format!("quarter report for {}", period),
    );

    let periods = vec![period.to_string()];
    let table = fetch_observations(
        source,
        config,
        entities,
        &[METRIC_GROWTH, METRIC_POPULATION],
        &periods,
    )?;

    Ok(metrics::quarter_report(
        &table,
        entities,
        METRIC_GROWTH,
        METRIC_POPULATION,
        &periods[0],
        &config.total_label(),
    ))
}
