//! FRED observation normalizers
//!
//! FRED reports missing observations as `"."`, so values are coerced
//! tolerantly: anything that is not a number becomes a null cell.

use serde_json::Value;
use tracing::warn;

use super::{
    coerce_values, project, record_from_json, Cell, DatasetContext, NormalizeError,
    NormalizeResult, NormalizedTable, NumericPolicy, Record,
};
use crate::decode::XmlElement;

const OBSERVATIONS: &str = "observations";
const OBSERVATION: &str = "observation";

/// Normalize a FRED `series/observations` JSON response
pub fn normalize_fred_json(
    payload: &Value,
    required_fields: &[String],
    ctx: &DatasetContext<'_>,
) -> NormalizeResult<NormalizedTable> {
    let observations = payload
        .get(OBSERVATIONS)
        .ok_or_else(|| NormalizeError::Structure(missing_observations(payload)))?
        .as_array()
        .ok_or_else(|| NormalizeError::Structure("'observations' is not a list".to_string()))?;

    if observations.is_empty() {
        warn!("Empty response from FRED API for dataset {}.", ctx.dataset_name);
        return Ok(NormalizedTable::empty(required_fields));
    }

    let mut records = observations
        .iter()
        .enumerate()
        .map(|(row, entry)| record_from_json(entry, row))
        .collect::<NormalizeResult<Vec<_>>>()?;

    coerce_values(&mut records, NumericPolicy::Tolerant)?;
    project(records, required_fields)
}

/// Normalize a FRED XML response: each `<observation>` element's attributes
/// become one row
pub fn normalize_fred_xml(
    root: &XmlElement,
    required_fields: &[String],
    ctx: &DatasetContext<'_>,
) -> NormalizeResult<NormalizedTable> {
    if root.name != OBSERVATIONS {
        let detail = root
            .attribute("message")
            .map(|m| format!(": {m}"))
            .unwrap_or_default();
        return Err(NormalizeError::Structure(format!(
            "expected <{OBSERVATIONS}> root, got <{}>{detail}",
            root.name
        )));
    }

    let mut records: Vec<Record> = root
        .children_named(OBSERVATION)
        .map(|obs| {
            obs.attributes
                .iter()
                .map(|(key, value)| (key.clone(), Cell::Text(value.clone())))
                .collect()
        })
        .collect();

    if records.is_empty() {
        warn!("Empty response from FRED API for dataset {}.", ctx.dataset_name);
        return Ok(NormalizedTable::empty(required_fields));
    }

    coerce_values(&mut records, NumericPolicy::Tolerant)?;
    project(records, required_fields)
}

fn missing_observations(payload: &Value) -> String {
    match payload.get("error_message").and_then(Value::as_str) {
        Some(message) => format!("missing 'observations' ({message})"),
        None => "missing 'observations'".to_string(),
    }
}
