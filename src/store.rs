use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::{DataLoadError, PredictError};
use crate::level::QuantileThresholds;

/// One observation from the source dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficRecord {
    pub junction: u32,
    pub timestamp: NaiveDateTime,
    pub vehicles: f64,
    pub id: i64,
}

/// Raw CSV row. Column names are fixed by the source dataset; the load fails
/// outright if any of them is missing.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "DateTime")]
    datetime: String,
    #[serde(rename = "Junction")]
    junction: u32,
    #[serde(rename = "Vehicles")]
    vehicles: f64,
    #[serde(rename = "ID")]
    id: i64,
}

#[derive(Debug)]
struct JunctionSeries {
    /// Id of the first row seen for this junction in original file order,
    /// before time sorting. The trained artifact carries an ID column, so
    /// this exact pick is reproduced as a passthrough feature.
    first_id: i64,
    /// Records sorted by timestamp.
    records: Vec<TrafficRecord>,
}

/// Immutable snapshot of the historical dataset, indexed per junction and
/// sorted by timestamp. Loaded once at startup; every later query borrows it
/// read-only.
#[derive(Debug)]
pub struct DataStore {
    series: HashMap<u32, JunctionSeries>,
    /// Vehicle counts across all junctions, sorted; backs the pooled
    /// quantile queries.
    sorted_vehicles: Vec<f64>,
    thresholds: QuantileThresholds,
}

/// Accepted timestamp formats: the dataset's `%Y-%m-%d %H:%M:%S` plus the
/// ISO-ish variants an HTML datetime input produces.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

impl DataStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataLoadError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Parse CSV records from any reader. Rows may arrive in any order; each
    /// junction's series is time-sorted after ingest.
    pub fn from_reader(reader: impl Read) -> Result<Self, DataLoadError> {
        let mut csv = csv::Reader::from_reader(reader);
        let mut series: HashMap<u32, JunctionSeries> = HashMap::new();
        let mut all_vehicles: Vec<f64> = Vec::new();

        for (i, row) in csv.deserialize::<RawRow>().enumerate() {
            let line = i + 2; // 1-based, after the header
            let row = row?;
            let timestamp =
                parse_datetime(&row.datetime).ok_or_else(|| DataLoadError::Timestamp {
                    line,
                    value: row.datetime.clone(),
                })?;
            // Written as a negated `>=` so NaN is rejected too; a NaN count
            // would poison the junction means and both thresholds.
            if !(row.vehicles >= 0.0) {
                return Err(DataLoadError::InvalidCount {
                    line,
                    value: row.vehicles,
                });
            }

            let entry = series.entry(row.junction).or_insert_with(|| JunctionSeries {
                first_id: row.id,
                records: Vec::new(),
            });
            entry.records.push(TrafficRecord {
                junction: row.junction,
                timestamp,
                vehicles: row.vehicles,
                id: row.id,
            });
            all_vehicles.push(row.vehicles);
        }

        if all_vehicles.is_empty() {
            return Err(DataLoadError::Empty);
        }

        for s in series.values_mut() {
            s.records.sort_by_key(|r| r.timestamp);
        }

        // Pooled across all junctions, matching how the training pipeline
        // derived its level cutoffs.
        all_vehicles.sort_by(f64::total_cmp);
        let thresholds = QuantileThresholds {
            p70: percentile(&all_vehicles, 0.70),
            p90: percentile(&all_vehicles, 0.90),
        };

        Ok(Self {
            series,
            sorted_vehicles: all_vehicles,
            thresholds,
        })
    }

    pub fn contains(&self, junction: u32) -> bool {
        self.series.contains_key(&junction)
    }

    /// Known junctions, sorted. Drives the selection input on the caller side.
    pub fn junctions(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.series.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn record_count(&self) -> usize {
        self.sorted_vehicles.len()
    }

    /// Exact-timestamp lookup, O(log n). A miss is expected for timestamps
    /// outside or between observations and is not an error.
    pub fn lookup_exact(&self, junction: u32, ts: NaiveDateTime) -> Option<&TrafficRecord> {
        let s = self.series.get(&junction)?;
        s.records
            .binary_search_by_key(&ts, |r| r.timestamp)
            .ok()
            .map(|i| &s.records[i])
    }

    /// Records with `start <= timestamp < end`. The exclusive upper bound
    /// keeps the prediction point itself out of trailing-window queries.
    pub fn lookup_range(
        &self,
        junction: u32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> &[TrafficRecord] {
        match self.series.get(&junction) {
            Some(s) => {
                let lo = s.records.partition_point(|r| r.timestamp < start);
                let hi = s.records.partition_point(|r| r.timestamp < end);
                &s.records[lo..hi]
            }
            None => &[],
        }
    }

    /// Mean vehicle count over the junction's full history; the fallback for
    /// missed exact lag lookups.
    pub fn mean_vehicles(&self, junction: u32) -> Result<f64, PredictError> {
        let s = self
            .series
            .get(&junction)
            .ok_or(PredictError::UnknownJunction(junction))?;
        if s.records.is_empty() {
            return Err(PredictError::EmptyJunction(junction));
        }
        let sum: f64 = s.records.iter().map(|r| r.vehicles).sum();
        Ok(sum / s.records.len() as f64)
    }

    /// Passthrough id for the ID feature column (§ pre-sort file order).
    pub fn first_record_id(&self, junction: u32) -> Option<i64> {
        self.series.get(&junction).map(|s| s.first_id)
    }

    /// p-th percentile of vehicle counts over ALL records, junctions pooled.
    /// `p` in `[0, 1]`.
    pub fn global_quantile(&self, p: f64) -> f64 {
        percentile(&self.sorted_vehicles, p)
    }

    pub fn thresholds(&self) -> QuantileThresholds {
        self.thresholds
    }
}

/// Linear-interpolated percentile over a sorted slice, matching the quantile
/// definition the training pipeline used to derive the level cutoffs.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
    }
}
