/// SSB (Statistics Norway) PxWeb API client
///
/// Queries table 01222 ("Population and population changes, by quarter")
/// through the PxWeb v0 interface. A request is a JSON POST naming one
/// selection per dimension; the answer is a json-stat2 dataset.
///
/// API Documentation: https://www.ssb.no/en/api/pxwebapi
/// Table: https://www.ssb.no/en/statbank/table/01222

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::{self, DataSource};
use crate::model::{PopError, DIM_CONTENTS, DIM_REGION, DIM_TIME};

pub const SSB_TABLE_URL: &str = "https://data.ssb.no/api/v0/no/table/01222/";

/// Region grouping that exposes municipalities as `K-xxxx` codes.
pub const DEFAULT_REGION_FILTER: &str = "agg:KommSummer";

// ============================================================================
// Query payload
// ============================================================================

/// Body of a PxWeb table query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PxQuery {
    pub query: Vec<PxSelection>,
    pub response: PxResponseFormat,
}

/// Selection for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PxSelection {
    pub code: String,
    pub selection: PxFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PxFilter {
    pub filter: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PxResponseFormat {
    pub format: String,
}

/// Build a query selecting exactly the given regions, content codes and
/// periods.
///
/// Every list must be non-empty; PxWeb treats a missing selection as
/// "everything", which is never what the dashboard wants.
pub fn build_query<R, M, P>(
    region_filter: &str,
    regions: &[R],
    metrics: &[M],
    periods: &[P],
) -> Result<PxQuery, PopError>
where
    R: AsRef<str>,
    M: AsRef<str>,
    P: AsRef<str>,
{
    fn values<T: AsRef<str>>(dimension: &str, items: &[T]) -> Result<Vec<String>, PopError> {
        if items.is_empty() {
            return Err(PopError::InvalidQuery(format!(
                "no values selected for dimension {}",
                dimension
            )));
        }
        Ok(items.iter().map(|s| s.as_ref().to_string()).collect())
    }

    let clause = |code: &str, filter: &str, values: Vec<String>| PxSelection {
        code: code.to_string(),
        selection: PxFilter {
            filter: filter.to_string(),
            values,
        },
    };

    Ok(PxQuery {
        query: vec![
            clause(DIM_REGION, region_filter, values(DIM_REGION, regions)?),
            clause(DIM_CONTENTS, "item", values(DIM_CONTENTS, metrics)?),
            clause(DIM_TIME, "item", values(DIM_TIME, periods)?),
        ],
        response: PxResponseFormat {
            format: "json-stat2".to_string(),
        },
    })
}

// ============================================================================
// json-stat2 Response Structures
// ============================================================================

/// A json-stat2 dataset as returned by PxWeb.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonStatDataset {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    /// Dimension names in storage order (outermost first).
    pub id: Vec<String>,
    /// Category count per dimension, parallel to `id`.
    pub size: Vec<usize>,
    pub dimension: BTreeMap<String, JsonStatDimension>,
    /// Row-major over `id`; `null` marks a missing cell.
    pub value: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonStatDimension {
    #[serde(default)]
    pub label: Option<String>,
    pub category: JsonStatCategory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonStatCategory {
    pub index: CategoryIndex,
    #[serde(default)]
    pub label: BTreeMap<String, String>,
}

/// json-stat2 allows either `{"key": ordinal}` or `["key", ...]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryIndex {
    Ordinals(BTreeMap<String, usize>),
    Keys(Vec<String>),
}

impl CategoryIndex {
    /// Category keys paired with their ordinal, ordered by ordinal.
    pub fn entries(&self) -> Vec<(String, usize)> {
        match self {
            CategoryIndex::Ordinals(map) => {
                let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
                entries.sort_by_key(|(_, ordinal)| *ordinal);
                entries
            }
            CategoryIndex::Keys(keys) => keys
                .iter()
                .enumerate()
                .map(|(i, k)| (k.clone(), i))
                .collect(),
        }
    }

    pub fn ordinal(&self, key: &str) -> Option<usize> {
        match self {
            CategoryIndex::Ordinals(map) => map.get(key).copied(),
            CategoryIndex::Keys(keys) => keys.iter().position(|k| k == key),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CategoryIndex::Ordinals(map) => map.len(),
            CategoryIndex::Keys(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extract the message from an error payload such as
/// `{"error": "Bad request"}` or `{"error": {"message": "..."}}`.
pub fn api_error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;
    match error {
        serde_json::Value::String(msg) => Some(msg.clone()),
        other => Some(
            other
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| other.to_string()),
        ),
    }
}

/// Parse a response body into a json-stat2 dataset.
///
/// An error payload becomes `ApiError`; anything else that is not a
/// well-formed dataset becomes `DataShapeError`.
pub fn parse_dataset(body: &str) -> Result<JsonStatDataset, PopError> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| PopError::DataShapeError(format!("malformed JSON: {}", e)))?;

    if json.get("error").is_some() {
        let msg = api_error_message(body).unwrap_or_else(|| "unknown API error".to_string());
        return Err(PopError::ApiError(msg));
    }

    serde_json::from_value(json)
        .map_err(|e| PopError::DataShapeError(format!("not a json-stat2 dataset: {}", e)))
}

// ============================================================================
// API Client
// ============================================================================

/// Anything that can answer a PxWeb query with a response body.
///
/// The pipeline only talks to this trait, so tests can substitute a canned
/// response for the live API.
pub trait DatasetSource {
    fn fetch(&self, query: &PxQuery) -> Result<String, PopError>;
}

/// Blocking HTTP client for the SSB table endpoint.
pub struct SsbClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl SsbClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, PopError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PopError::TransportError(e.to_string()))?;

        Ok(SsbClient {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DatasetSource for SsbClient {
    fn fetch(&self, query: &PxQuery) -> Result<String, PopError> {
        logging::debug(
            DataSource::Ssb,
            None,
            &format!("POST {} ({} dimensions)", self.url, query.query.len()),
        );

        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(query)
            .send()
            .map_err(|e| PopError::TransportError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| PopError::TransportError(e.to_string()))?;

        if !status.is_success() {
            return Err(match api_error_message(&body) {
                Some(msg) => PopError::ApiError(msg),
                None => PopError::HttpError(status.as_u16()),
            });
        }

        logging::debug(
            DataSource::Ssb,
            None,
            &format!("received {} bytes", body.len()),
        );
        Ok(body)
    }
}

// ============================================================================
// Tests
// ============================================================================
