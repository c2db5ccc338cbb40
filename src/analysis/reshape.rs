/// Decoding of json-stat2 datasets into an `ObservationTable`.
///
/// json-stat2 stores every value of the dataset in one flat array, in
/// row-major order over the dimensions listed in `id`. A value's position is
/// `Σ ordinal_d * stride_d`, where a dimension's stride is the product of the
/// sizes of every dimension after it.

use std::collections::BTreeSet;

use crate::ingest::ssb::JsonStatDataset;
use crate::model::{ObservationTable, PopError, RawObservation};

/// Which dataset dimension plays which role in the observation key.
#[derive(Debug, Clone, Copy)]
pub struct DimensionRoles<'a> {
    pub entity: &'a str,
    pub period: &'a str,
    pub metric: &'a str,
}

impl Default for DimensionRoles<'static> {
    fn default() -> Self {
        use crate::model::{DIM_CONTENTS, DIM_REGION, DIM_TIME};
        DimensionRoles {
            entity: DIM_REGION,
            period: DIM_TIME,
            metric: DIM_CONTENTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Stride arithmetic
// ---------------------------------------------------------------------------

/// Row-major strides for dimensions of the given sizes.
///
/// The last dimension varies fastest and has stride 1.
pub fn strides(sizes: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; sizes.len()];
    for d in (0..sizes.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * sizes[d + 1];
    }
    strides
}

/// Flat position of the cell at `ordinals`.
pub fn flat_offset(ordinals: &[usize], strides: &[usize]) -> usize {
    ordinals.iter().zip(strides).map(|(o, s)| o * s).sum()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode every cell of `dataset` into an `ObservationTable`.
///
/// Dimensions other than the three roles must have exactly one category;
/// otherwise the (entity, period, metric) key would not be unique.
pub fn reshape(
    dataset: &JsonStatDataset,
    roles: DimensionRoles<'_>,
) -> Result<ObservationTable, PopError> {
    if dataset.id.len() != dataset.size.len() {
        return Err(PopError::DataShapeError(format!(
            "dataset lists {} dimensions but {} sizes",
            dataset.id.len(),
            dataset.size.len()
        )));
    }

    let role_of = |name: &str| -> Option<usize> {
        if name == roles.entity {
            Some(0)
        } else if name == roles.period {
            Some(1)
        } else if name == roles.metric {
            Some(2)
        } else {
            None
        }
    };

    // Per dimension: its (key, ordinal) list, validated against `size`.
    let mut categories: Vec<Vec<(String, usize)>> = Vec::with_capacity(dataset.id.len());
    let mut role_position = [None; 3];

    for (d, name) in dataset.id.iter().enumerate() {
        let dimension = dataset.dimension.get(name).ok_or_else(|| {
            PopError::DataShapeError(format!("dimension {} listed in id but not described", name))
        })?;

        let entries = dimension.category.index.entries();
        if entries.len() != dataset.size[d] {
            return Err(PopError::DataShapeError(format!(
                "dimension {} has {} categories but size {}",
                name,
                entries.len(),
                dataset.size[d]
            )));
        }
        // Sorted by ordinal, so a valid index reads 0, 1, 2, ...
        if let Some((i, (key, ordinal))) =
            entries.iter().enumerate().find(|(i, (_, o))| o != i)
        {
            let problem = if *ordinal >= dataset.size[d] {
                format!("outside size {}", dataset.size[d])
            } else if i > 0 && entries[i - 1].1 == *ordinal {
                "shared with another category".to_string()
            } else {
                format!("leaving ordinal {} unused", i)
            };
            return Err(PopError::DataShapeError(format!(
                "category {} of {} has ordinal {} {}",
                key, name, ordinal, problem
            )));
        }
        {
            let mut seen = BTreeSet::new();
            if let Some((key, _)) = entries.iter().find(|(k, _)| !seen.insert(k.as_str())) {
                return Err(PopError::DataShapeError(format!(
                    "category {} appears more than once in {}",
                    key, name
                )));
            }
        }

        match role_of(name) {
            Some(r) => role_position[r] = Some(d),
            None if entries.len() != 1 => {
                return Err(PopError::DataShapeError(format!(
                    "unexpected dimension {} with {} categories",
                    name,
                    entries.len()
                )));
            }
            None => {}
        }

        categories.push(entries);
    }

    let position = |r: usize, name: &str| {
        role_position[r].ok_or_else(|| {
            PopError::DataShapeError(format!("dimension {} missing from response", name))
        })
    };
    let entity_dim = position(0, roles.entity)?;
    let period_dim = position(1, roles.period)?;
    let metric_dim = position(2, roles.metric)?;

    let strides = strides(&dataset.size);
    let mut table = ObservationTable {
        entity_labels: labels(dataset, roles.entity),
        period_labels: labels(dataset, roles.period),
        metric_labels: labels(dataset, roles.metric),
        ..Default::default()
    };

    // Walk the cross product of all dimensions with an odometer.
    let total: usize = dataset.size.iter().product();
    let mut cursor = vec![0usize; dataset.size.len()];
    for _ in 0..total {
        let ordinals: Vec<usize> = cursor
            .iter()
            .enumerate()
            .map(|(d, &i)| categories[d][i].1)
            .collect();
        let offset = flat_offset(&ordinals, &strides);
        let value = *dataset.value.get(offset).ok_or_else(|| {
            PopError::DataShapeError(format!(
                "value index {} outside value array of length {}",
                offset,
                dataset.value.len()
            ))
        })?;

        table.insert(RawObservation {
            entity_code: categories[entity_dim][cursor[entity_dim]].0.clone(),
            period: categories[period_dim][cursor[period_dim]].0.clone(),
            metric: categories[metric_dim][cursor[metric_dim]].0.clone(),
            value,
        });

        for d in (0..cursor.len()).rev() {
            cursor[d] += 1;
            if cursor[d] < dataset.size[d] {
                break;
            }
            cursor[d] = 0;
        }
    }

    Ok(table)
}

fn labels(
    dataset: &JsonStatDataset,
    name: &str,
) -> std::collections::BTreeMap<String, String> {
    dataset
        .dimension
        .get(name)
        .map(|d| d.category.label.clone())
        .unwrap_or_default()
}

/// Confirm that every requested (entity, period, metric) came back.
pub fn ensure_complete<E, P, M>(
    table: &ObservationTable,
    entities: &[E],
    periods: &[P],
    metrics: &[M],
) -> Result<(), PopError>
where
    E: AsRef<str>,
    P: AsRef<str>,
    M: AsRef<str>,
{
    for e in entities {
        for p in periods {
            for m in metrics {
                if table.get(e.as_ref(), p.as_ref(), m.as_ref()).is_none() {
                    return Err(PopError::DataShapeError(format!(
                        "response has no cell for {} / {} / {}",
                        e.as_ref(),
                        p.as_ref(),
                        m.as_ref()
                    )));
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
