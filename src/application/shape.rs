//! Upstream payload shapes and field access.
//!
//! Providers answer with one of three layouts. Each endpoint states which it
//! accepts and gets uniform records back.

use crate::domain::error::ShapeError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamShape {
    /// `[["time_tag", "bz_gsm"], ["2024-05-10 00:00:00.000", "-3.1"], ...]`
    HeaderedRows {
        header: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    /// `[{"time_tag": ..., "flux": ...}, ...]`
    Records(Vec<Record>),
    /// `{"title": ...}`
    Record(Record),
}

impl UpstreamShape {
    pub fn parse(value: &Value) -> Result<Self, ShapeError> {
        match value {
            Value::Object(map) => Ok(Self::Record(map.clone())),
            Value::Array(items) => match items.first() {
                None => Ok(Self::Records(Vec::new())),
                Some(Value::Array(first)) => {
                    let header = first
                        .iter()
                        .map(|cell| cell.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .filter(|h| !h.is_empty())
                        .ok_or(ShapeError::BadHeader)?;
                    let rows = items[1..]
                        .iter()
                        .map(|row| match row {
                            Value::Array(cells) => Ok(cells.clone()),
                            other => Err(ShapeError::Unexpected {
                                expected: "array row",
                                found: value_kind(other),
                            }),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Self::HeaderedRows { header, rows })
                }
                Some(_) => items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => Ok(map.clone()),
                        other => Err(ShapeError::Unexpected {
                            expected: "object record",
                            found: value_kind(other),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Self::Records),
            },
            other => Err(ShapeError::Unexpected {
                expected: "array or object",
                found: value_kind(other),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::HeaderedRows { .. } => "headered rows",
            Self::Records(_) => "records",
            Self::Record(_) => "record",
        }
    }

    /// Uniform records; header rows are keyed by column name
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::HeaderedRows { header, rows } => rows
                .into_iter()
                .map(|row| header.iter().cloned().zip(row).collect())
                .collect(),
            Self::Records(records) => records,
            Self::Record(record) => vec![record],
        }
    }
}

/// Tabular endpoints: header rows or records
pub fn expect_table(value: &Value) -> Result<Vec<Record>, ShapeError> {
    match UpstreamShape::parse(value)? {
        UpstreamShape::Record(_) => Err(ShapeError::Unexpected {
            expected: "table",
            found: "record",
        }),
        shape => Ok(shape.into_records()),
    }
}

/// Event lists: records only
pub fn expect_records(value: &Value) -> Result<Vec<Record>, ShapeError> {
    match UpstreamShape::parse(value)? {
        UpstreamShape::Records(records) => Ok(records),
        shape => Err(ShapeError::Unexpected {
            expected: "records",
            found: shape.kind(),
        }),
    }
}

pub fn expect_record(value: &Value) -> Result<Record, ShapeError> {
    match UpstreamShape::parse(value)? {
        UpstreamShape::Record(record) => Ok(record),
        shape => Err(ShapeError::Unexpected {
            expected: "record",
            found: shape.kind(),
        }),
    }
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Non-empty string field
pub fn field_str<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
    record
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Numeric field; SWPC tables send numbers as strings
pub fn field_f64(record: &Record, name: &str) -> Option<f64> {
    record.get(name).and_then(as_f64)
}

pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

pub fn field_time(record: &Record, name: &str) -> Option<DateTime<Utc>> {
    field_str(record, name).and_then(parse_instant)
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an upstream timestamp as UTC.
///
/// Unparseable input is `None`, never "now".
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
