/// Data retrieval from external statistics APIs.
///
/// Submodules:
/// - `ssb` — query builder, json-stat2 response types and HTTP client for
///   Statistics Norway's PxWeb API.

pub mod ssb;
