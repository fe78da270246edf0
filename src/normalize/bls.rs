//! BLS timeseries normalizers
//!
//! Response shape (v2 API):
//!
//! ```json
//! {"status": "REQUEST_SUCCEEDED",
//!  "Results": {"series": [{"seriesID": "CUUR0000SA0",
//!                          "data": [{"year": "2024", "period": "M01",
//!                                    "periodName": "January", "value": "308.417",
//!                                    "footnotes": [{}]}]}]}}
//! ```
//!
//! Only the first series is read. Values are coerced strictly: a value that is
//! not a number fails the dataset.

use serde_json::{Map, Value};
use tracing::warn;

use super::{
    coerce_values, project, record_from_json, Cell, DatasetContext, NormalizeError,
    NormalizeResult, NormalizedTable, NumericPolicy, Record, SERIES_ID_COLUMN,
};

/// Normalize a BLS series response.
///
/// When `ctx.stamp_series_id` is set and the series carries an identifier,
/// every row gets a `seriesID` column.
pub fn normalize_bls(
    payload: &Value,
    required_fields: &[String],
    ctx: &DatasetContext<'_>,
) -> NormalizeResult<NormalizedTable> {
    let Some((series, data)) = first_series(payload)? else {
        warn!("Empty response from BLS API for dataset {}.", ctx.dataset_name);
        return Ok(NormalizedTable::empty(required_fields));
    };

    let mut records = records_from(data)?;
    if ctx.stamp_series_id {
        if let Some(series_id) = series.get(SERIES_ID_COLUMN).and_then(Value::as_str) {
            stamp(&mut records, series_id);
        }
    }

    coerce_values(&mut records, NumericPolicy::Strict)?;
    project(records, required_fields)
}

/// Normalize a CES series response. The series identifier is mandatory and is
/// stamped onto every row.
pub fn normalize_ces(
    payload: &Value,
    required_fields: &[String],
    ctx: &DatasetContext<'_>,
) -> NormalizeResult<NormalizedTable> {
    let Some((series, data)) = first_series(payload)? else {
        warn!("Empty response from BLS API for dataset {}.", ctx.dataset_name);
        return Ok(NormalizedTable::empty(required_fields));
    };

    let series_id = series
        .get(SERIES_ID_COLUMN)
        .and_then(Value::as_str)
        .ok_or_else(|| NormalizeError::Structure("CES series has no seriesID".to_string()))?;

    let mut records = records_from(data)?;
    stamp(&mut records, series_id);

    coerce_values(&mut records, NumericPolicy::Strict)?;
    project(records, required_fields)
}

/// First series and its non-empty data list; `None` when there is no data.
fn first_series(payload: &Value) -> NormalizeResult<Option<(&Map<String, Value>, &Vec<Value>)>> {
    let results = payload
        .get("Results")
        .and_then(Value::as_object)
        .ok_or_else(|| NormalizeError::Structure(missing_results(payload)))?;

    let series = results
        .get("series")
        .ok_or_else(|| NormalizeError::Structure("missing 'Results.series'".to_string()))?
        .as_array()
        .ok_or_else(|| NormalizeError::Structure("'Results.series' is not a list".to_string()))?;

    let Some(first) = series.first() else {
        return Ok(None);
    };
    let first = first
        .as_object()
        .ok_or_else(|| NormalizeError::Structure("'Results.series[0]' is not an object".to_string()))?;

    match first.get("data") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(data)) if data.is_empty() => Ok(None),
        Some(Value::Array(data)) => Ok(Some((first, data))),
        Some(_) => Err(NormalizeError::Structure(
            "'Results.series[0].data' is not a list".to_string(),
        )),
    }
}

/// Error text for a response without `Results`, including the API's own
/// status and messages when it sent them.
fn missing_results(payload: &Value) -> String {
    let mut text = "missing 'Results'".to_string();

    let status = payload.get("status").and_then(Value::as_str);
    let messages: Vec<&str> = payload
        .get("message")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    if let Some(status) = status {
        text.push_str(&format!(" (status: {status}"));
        if !messages.is_empty() {
            text.push_str(&format!("; message: {}", messages.join(" ")));
        }
        text.push(')');
    }
    text
}

fn records_from(data: &[Value]) -> NormalizeResult<Vec<Record>> {
    data.iter()
        .enumerate()
        .map(|(row, entry)| record_from_json(entry, row))
        .collect()
}

fn stamp(records: &mut [Record], series_id: &str) {
    for record in records {
        record.insert(SERIES_ID_COLUMN.to_string(), Cell::Text(series_id.to_string()));
    }
}
