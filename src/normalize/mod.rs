//! Provider response normalizers
//!
//! Each provider nests its data differently. The normalizers flatten a decoded
//! response into a [`NormalizedTable`] whose columns are exactly the caller's
//! `required_fields`, in order, whatever extra fields the provider sends.
//!
//! | Kind        | Path                         | Numeric policy |
//! |-------------|------------------------------|----------------|
//! | `bls`       | `Results.series[0].data`     | strict         |
//! | `ces`       | `Results.series[0].data`     | strict         |
//! | `fred_json` | `observations`               | tolerant       |
//! | `fred_xml`  | `<observation>` attributes   | tolerant       |
//!
//! An empty series or observation list is not an error: the result is a
//! zero-row table that still carries every required column.

use crate::decode::DecodedPayload;
use crate::ProviderKind;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub mod bls;
pub mod fred;

/// Column that holds the observation value in every provider
pub const VALUE_COLUMN: &str = "value";

/// Column that carries the series identifier when it is stamped onto rows
pub const SERIES_ID_COLUMN: &str = "seriesID";

/// Normalization errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    /// Expected keys or lists absent from an otherwise decodable response
    #[error("unexpected response structure: {0}")]
    Structure(String),

    /// Strict numeric coercion failed
    #[error("invalid numeric {column} '{value}' in row {row}")]
    InvalidValue {
        /// Column being coerced
        column: String,
        /// Zero-based row index
        row: usize,
        /// Offending raw value
        value: String,
    },

    /// A required column appears in no record
    #[error("required column '{0}' not present in response")]
    MissingColumn(String),
}

/// Result type for normalization
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// One table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Text as received
    Text(String),
    /// Coerced numeric value
    Number(f64),
    /// Absent or uncoercible value
    Null,
}

impl Cell {
    /// Convert a JSON scalar. Nested arrays/objects are kept as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::String(s) => Cell::Text(s.clone()),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            Value::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }

    /// Numeric view of the cell
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view of the cell
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the cell is null
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Null => Ok(()),
        }
    }
}

/// Rectangular table with a fixed, ordered column set
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Borrowed view of one row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    /// Cell by column name
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.cells[i])
    }

    /// Cells in column order
    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }
}

impl NormalizedTable {
    /// Zero-row table with the given columns
    pub fn empty(columns: &[String]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Build a table from rows already in column order.
    ///
    /// # Errors
    /// Returns [`NormalizeError::Structure`] if a row's width differs from the column count
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> NormalizeResult<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(NormalizeError::Structure(format!(
                "row {i} has {} cells, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw rows in column order
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Row view by index
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|cells| Row {
            columns: &self.columns,
            cells,
        })
    }

    /// Iterate row views
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row {
            columns: &self.columns,
            cells,
        })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Per-dataset information some normalizers need
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetContext<'a> {
    /// Dataset name, for log lines
    pub dataset_name: &'a str,
    /// Attach the series identifier to every BLS row
    pub stamp_series_id: bool,
}

/// What to do with a `value` that does not parse as a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericPolicy {
    /// Fail the whole dataset
    Strict,
    /// Store a null and carry on
    Tolerant,
}

/// Unprojected record: every field the provider sent for one observation
pub(crate) type Record = HashMap<String, Cell>;

/// Normalize a decoded payload with the normalizer for `kind`
pub fn normalize(
    kind: ProviderKind,
    payload: &DecodedPayload,
    required_fields: &[String],
    ctx: &DatasetContext<'_>,
) -> NormalizeResult<NormalizedTable> {
    match (kind, payload) {
        (ProviderKind::Bls, DecodedPayload::Json(json)) => {
            bls::normalize_bls(json, required_fields, ctx)
        }
        (ProviderKind::Ces, DecodedPayload::Json(json)) => {
            bls::normalize_ces(json, required_fields, ctx)
        }
        (ProviderKind::FredJson, DecodedPayload::Json(json)) => {
            fred::normalize_fred_json(json, required_fields, ctx)
        }
        (ProviderKind::FredXml, DecodedPayload::Xml(root)) => {
            fred::normalize_fred_xml(root, required_fields, ctx)
        }
        (kind, payload) => Err(NormalizeError::Structure(format!(
            "{kind} datasets cannot be read from a {} response",
            payload.format_name()
        ))),
    }
}

pub(crate) fn record_from_json(entry: &Value, row: usize) -> NormalizeResult<Record> {
    let object: &Map<String, Value> = entry.as_object().ok_or_else(|| {
        NormalizeError::Structure(format!("entry {row} is not an object"))
    })?;
    Ok(object
        .iter()
        .map(|(key, value)| (key.clone(), Cell::from_json(value)))
        .collect())
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Coerce the `value` column of every record to a number
pub(crate) fn coerce_values(records: &mut [Record], policy: NumericPolicy) -> NormalizeResult<()> {
    for (row, record) in records.iter_mut().enumerate() {
        let Some(cell) = record.get_mut(VALUE_COLUMN) else {
            continue;
        };

        let raw = match cell {
            Cell::Text(raw) => raw.clone(),
            Cell::Number(_) | Cell::Null => continue,
        };

        *cell = match (parse_number(&raw), policy) {
            (Some(n), _) => Cell::Number(n),
            (None, NumericPolicy::Tolerant) => Cell::Null,
            (None, NumericPolicy::Strict) => {
                return Err(NormalizeError::InvalidValue {
                    column: VALUE_COLUMN.to_string(),
                    row,
                    value: raw,
                })
            }
        };
    }
    Ok(())
}

/// Project records onto exactly `required_fields`.
///
/// A required column that no record carries is an error; a column missing
/// from only some records becomes null in those rows.
pub(crate) fn project(
    records: Vec<Record>,
    required_fields: &[String],
) -> NormalizeResult<NormalizedTable> {
    if records.is_empty() {
        return Ok(NormalizedTable::empty(required_fields));
    }

    if let Some(missing) = required_fields
        .iter()
        .find(|field| !records.iter().any(|r| r.contains_key(field.as_str())))
    {
        return Err(NormalizeError::MissingColumn(missing.clone()));
    }

    let rows = records
        .into_iter()
        .map(|mut record| {
            required_fields
                .iter()
                .map(|field| record.remove(field.as_str()).unwrap_or(Cell::Null))
                .collect()
        })
        .collect();

    NormalizedTable::from_rows(required_fields.to_vec(), rows)
}
