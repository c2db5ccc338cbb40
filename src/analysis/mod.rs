/// Data reshaping and derived metrics for the population dashboard.
///
/// Submodules:
/// - `reshape` — decodes a json-stat2 dataset into an `ObservationTable`.
/// - `metrics` — snapshot deltas, trend series and the quarter report.

pub mod metrics;
pub mod reshape;
