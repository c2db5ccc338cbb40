/// Population dashboard for the municipalities of Rogaland.
///
/// Queries Statistics Norway's table 01222, decodes the json-stat2 answer,
/// computes quarter-over-quarter changes and renders tables, charts and CSV.

pub mod analysis;
pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod municipalities;
pub mod periods;
pub mod pipeline;
pub mod render;
