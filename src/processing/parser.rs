//! Raw collector payloads
//!
//! A collector posts one GPS fix with every cell it can hear:
//! `{timestamp, lat, lon, cells: [{type, rssi, cell_id}]}`. Field types are
//! loose in practice (numeric ids, stringly RSSI), so every field is decoded
//! leniently and anything unusable becomes `None` for the grouping stage to
//! skip.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::validation::error::IngestError;

/// One cell heard during a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellReading {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rssi: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cell_id: Option<String>,
}

/// One collector post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogBatch {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient_cells")]
    pub cells: Vec<CellReading>,
}

/// Flattened row: one cell reading with its batch's fix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: Option<i64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub rssi: Option<f64>,
    pub cell_id: Option<String>,
}

impl LogBatch {
    pub fn records(&self) -> impl Iterator<Item = LogRecord> + '_ {
        self.cells.iter().map(move |cell| LogRecord {
            timestamp: self.timestamp,
            lat: self.lat,
            lon: self.lon,
            kind: cell.kind.clone(),
            rssi: cell.rssi,
            cell_id: cell.cell_id.clone(),
        })
    }
}

/// Parse a single batch object or an array of batches.
///
/// Array elements that are not batch objects are dropped; only a document
/// that is not JSON, or a top-level value that is neither, is an error.
pub fn parse_batches(json: &str) -> Result<Vec<LogBatch>, IngestError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<LogBatch>(item) {
                Ok(batch) => Some(batch),
                Err(e) => {
                    warn!(index, error = %e, "dropping malformed log batch");
                    None
                }
            })
            .collect()),
        other => Ok(vec![serde_json::from_value::<LogBatch>(other)?]),
    }
}

/// Flatten batches into rows, batch order then cell order
pub fn flatten(batches: &[LogBatch]) -> Vec<LogRecord> {
    batches.iter().flat_map(LogBatch::records).collect()
}

pub fn parse_records(json: &str) -> Result<Vec<LogRecord>, IngestError> {
    Ok(flatten(&parse_batches(json)?))
}

pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<LogRecord>, IngestError> {
    let content = fs::read_to_string(&path).map_err(|source| IngestError::Io {
        path: path.as_ref().to_string_lossy().to_string(),
        source,
    })?;
    parse_records(&content)
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_cells<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<CellReading>, D::Error> {
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(value = %other, "cells is not an array, ignoring");
            return Ok(Vec::new());
        }
        None => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<CellReading>(item) {
            Ok(cell) => Some(cell),
            Err(e) => {
                warn!(error = %e, "dropping malformed cell reading");
                None
            }
        })
        .collect())
}
