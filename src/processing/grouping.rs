//! Turn flattened log rows into per-transmitter observation sets
//!
//! Order of operations: skip unusable rows, apply the time window, keep the
//! latest row per (cell id, type, lat, lon), then group by (cell id, type).
//! Every stage preserves first-appearance order so downstream estimates are
//! reproducible.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::core::{Observation, ObservationSet};
use crate::processing::parser::LogRecord;
use crate::utils::config::TimeWindow;
use crate::validation::error::SkipReason;

/// Outcome of grouping a batch of rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingReport {
    pub sets: Vec<ObservationSet>,
    /// Input index and reason of every skipped row
    pub skipped: Vec<(usize, SkipReason)>,
    pub duplicates_removed: usize,
    pub outside_window: usize,
}

impl GroupingReport {
    pub fn skipped_by_reason(&self) -> HashMap<SkipReason, usize> {
        let mut counts = HashMap::new();
        for (_, reason) in &self.skipped {
            *counts.entry(*reason).or_insert(0) += 1;
        }
        counts
    }

    pub fn observation_count(&self) -> usize {
        self.sets.iter().map(ObservationSet::len).sum()
    }
}

/// A row that passed validation
#[derive(Debug, Clone)]
struct UsableRow {
    cell_id: String,
    kind: String,
    timestamp: Option<i64>,
    observation: Observation,
}

fn usable(record: &LogRecord) -> Result<UsableRow, SkipReason> {
    let cell_id = record.cell_id.clone().ok_or(SkipReason::MissingTransmitterId)?;
    let (lat, lon) = match (record.lat, record.lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Err(SkipReason::MissingCoordinates),
    };
    if !lat.is_finite() || !lon.is_finite() {
        return Err(SkipReason::NonFiniteCoordinates);
    }
    let rssi = record.rssi.filter(|r| r.is_finite()).ok_or(SkipReason::NonNumericRssi)?;

    Ok(UsableRow {
        cell_id,
        kind: record.kind.clone().unwrap_or_default(),
        timestamp: record.timestamp,
        observation: Observation::new(lat, lon, rssi),
    })
}

pub fn group_records(records: &[LogRecord], window: Option<&TimeWindow>) -> GroupingReport {
    let mut report = GroupingReport::default();

    // Latest row per (cell id, type, position), held in first-occurrence slots
    let mut slots: Vec<UsableRow> = Vec::new();
    let mut slot_of: HashMap<(String, String, u64, u64), usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let row = match usable(record) {
            Ok(row) => row,
            Err(reason) => {
                warn!(index, %reason, "skipping log record");
                report.skipped.push((index, reason));
                continue;
            }
        };

        if let Some(window) = window {
            if !window.contains(row.timestamp) {
                report.outside_window += 1;
                continue;
            }
        }

        let key = (
            row.cell_id.clone(),
            row.kind.clone(),
            row.observation.lat.to_bits(),
            row.observation.lon.to_bits(),
        );
        match slot_of.get(&key) {
            Some(&slot) => {
                report.duplicates_removed += 1;
                if row.timestamp >= slots[slot].timestamp {
                    slots[slot] = row;
                }
            }
            None => {
                slot_of.insert(key, slots.len());
                slots.push(row);
            }
        }
    }

    let mut set_of: HashMap<(String, String), usize> = HashMap::new();
    for row in slots {
        let key = (row.cell_id, row.kind);
        match set_of.get(&key) {
            Some(&set) => report.sets[set].observations.push(row.observation),
            None => {
                set_of.insert(key.clone(), report.sets.len());
                report.sets.push(ObservationSet::new(key.0, key.1, vec![row.observation]));
            }
        }
    }

    debug!(
        transmitters = report.sets.len(),
        observations = report.observation_count(),
        skipped = report.skipped.len(),
        duplicates = report.duplicates_removed,
        outside_window = report.outside_window,
        "grouped log records"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: Option<i64>, lat: f64, lon: f64, kind: &str, rssi: f64, cell_id: &str) -> LogRecord {
        LogRecord {
            timestamp: ts,
            lat: Some(lat),
            lon: Some(lon),
            kind: Some(kind.to_string()),
            rssi: Some(rssi),
            cell_id: Some(cell_id.to_string()),
        }
    }

    #[test]
    fn test_groups_by_cell_and_type_in_first_appearance_order() {
        let records = vec![
            record(Some(1), 35.0, 135.0, "LTE", -70.0, "b"),
            record(Some(1), 35.0, 135.0, "LTE", -80.0, "a"),
            record(Some(2), 35.1, 135.0, "LTE", -75.0, "b"),
            record(Some(2), 35.1, 135.0, "NR", -75.0, "b"),
        ];
        let report = group_records(&records, None);
        let keys: Vec<(&str, &str, usize)> = report
            .sets
            .iter()
            .map(|s| (s.transmitter_id.as_str(), s.kind.as_str(), s.len()))
            .collect();
        assert_eq!(keys, vec![("b", "LTE", 2), ("a", "LTE", 1), ("b", "NR", 1)]);
    }

    #[test]
    fn test_duplicates_keep_latest_reading_in_first_slot() {
        let records = vec![
            record(Some(10), 35.0, 135.0, "LTE", -70.0, "a"),
            record(Some(11), 35.2, 135.0, "LTE", -90.0, "a"),
            record(Some(30), 35.0, 135.0, "LTE", -60.0, "a"),
            record(Some(20), 35.0, 135.0, "LTE", -65.0, "a"),
        ];
        let report = group_records(&records, None);
        assert_eq!(report.duplicates_removed, 2);
        let set = &report.sets[0];
        assert_eq!(set.len(), 2);
        assert_eq!(set.observations[0], Observation::new(35.0, 135.0, -60.0));
        assert_eq!(set.observations[1], Observation::new(35.2, 135.0, -90.0));
    }

    #[test]
    fn test_timestamp_tie_keeps_later_record() {
        let records = vec![
            record(Some(5), 1.0, 1.0, "GSM", -70.0, "x"),
            record(Some(5), 1.0, 1.0, "GSM", -75.0, "x"),
        ];
        let report = group_records(&records, None);
        assert_eq!(report.sets[0].observations, vec![Observation::new(1.0, 1.0, -75.0)]);
    }

    #[test]
    fn test_unusable_records_are_skipped_with_reason() {
        let mut no_coords = record(Some(1), 0.0, 0.0, "LTE", -70.0, "a");
        no_coords.lon = None;
        let nan_coords = record(Some(1), f64::NAN, 0.0, "LTE", -70.0, "a");
        let mut no_rssi = record(Some(1), 1.0, 1.0, "LTE", -70.0, "a");
        no_rssi.rssi = None;
        let mut no_id = record(Some(1), 1.0, 1.0, "LTE", -70.0, "a");
        no_id.cell_id = None;
        let good = record(Some(1), 2.0, 2.0, "LTE", -70.0, "a");

        let report = group_records(&[no_coords, nan_coords, no_rssi, no_id, good], None);
        assert_eq!(
            report.skipped,
            vec![
                (0, SkipReason::MissingCoordinates),
                (1, SkipReason::NonFiniteCoordinates),
                (2, SkipReason::NonNumericRssi),
                (3, SkipReason::MissingTransmitterId),
            ]
        );
        assert_eq!(report.skipped_by_reason()[&SkipReason::NonNumericRssi], 1);
        assert_eq!(report.observation_count(), 1);
    }

    #[test]
    fn test_time_window_filters_before_dedup() {
        let records = vec![
            record(Some(100), 1.0, 1.0, "LTE", -70.0, "a"),
            record(Some(250), 1.0, 1.0, "LTE", -99.0, "a"),
            record(None, 2.0, 2.0, "LTE", -70.0, "a"),
            record(Some(150), 3.0, 3.0, "LTE", -70.0, "a"),
        ];
        let window = TimeWindow::new(Some(100), Some(200));
        let report = group_records(&records, Some(&window));
        assert_eq!(report.outside_window, 2);
        assert_eq!(report.duplicates_removed, 0);
        assert_eq!(
            report.sets[0].observations,
            vec![Observation::new(1.0, 1.0, -70.0), Observation::new(3.0, 3.0, -70.0)]
        );

        // Untimestamped rows survive when no window is set
        assert_eq!(group_records(&records, None).observation_count(), 3);
    }

    #[test]
    fn test_empty_input() {
        let report = group_records(&[], None);
        assert!(report.sets.is_empty());
        assert!(report.skipped.is_empty());
    }
}
