//! Benchmark result records
//!
//! Raw rows (`Sample`, `MetricRecord`, `PlatformRecord`) are what the storage
//! layer hands over, each tagged with the set and run it was read from.
//! `SetRecord` is derived by the set reducer and is read-only downstream.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One benchmark execution (a row of benchmark-results.csv)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub benchmark_name: String,
    /// Component that produced the measurement (e.g. "deephaven-engine")
    pub origin: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub test_duration: f64,
    pub op_duration: f64,
    /// Throughput, rows per second. Negative values are invalid sentinels.
    pub op_rate: i64,
    pub row_count: i64,
    pub set_id: String,
    pub run_id: String,
}

/// A named metric sampled during a benchmark (a row of benchmark-metrics.csv)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub benchmark_name: String,
    pub origin: String,
    pub timestamp: i64,
    pub name: String,
    pub value: f64,
    pub note: String,
    pub set_id: String,
    pub run_id: String,
}

/// A platform property of a run (a row of benchmark-platform.csv)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRecord {
    pub origin: String,
    pub name: String,
    pub value: String,
    pub set_id: String,
    pub run_id: String,
}

/// The representative run of one (benchmark, origin, set)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub benchmark_name: String,
    pub origin: String,
    pub set_id: String,
    /// Run id of the median run
    pub run_id: String,
    pub timestamp: i64,
    pub test_duration: f64,
    pub op_duration: f64,
    /// Rate of the median run
    pub op_rate: i64,
    pub row_count: i64,
    /// All run rates of the set, ascending
    pub set_op_rates: Vec<i64>,
    /// Coefficient of variation of `set_op_rates` (fraction, not percent)
    pub variability: f64,
    /// Version label of the set (see `properties::attach_labels`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Attached platform properties, keyed by normalized name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub platform: BTreeMap<String, String>,
    /// Attached metric values, keyed by normalized name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
}

impl SetRecord {
    /// Number of runs collapsed into this record
    pub fn set_count(&self) -> usize {
        self.set_op_rates.len()
    }

    /// Key identifying the benchmark history this record belongs to
    pub fn series_key(&self) -> (&str, &str) {
        (&self.benchmark_name, &self.origin)
    }
}
