// Cross-set comparison: side-by-side rates of independently computed datasets
//
// Datasets are joined in the order given. The first dataset fixes both the
// benchmark universe and the reference rate for every `Change__` column.
// Joins are inner joins: a benchmark missing from any later dataset is
// dropped from the table, and benchmarks only present in later datasets
// never appear.

use crate::error::{Result, ScoreError};
use crate::record::SetRecord;
use crate::scoring::statistics::gain;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Normalize a label into a column-safe name
///
/// Path separators become `__`; every other character outside
/// `[A-Za-z0-9_$]` becomes `_`.
///
/// # Example
/// ```
/// use benchscore::scoring::normalize_name;
///
/// assert_eq!(normalize_name("user1/full-set.140M"), "user1__full_set_140M");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.replace('/', "__")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Column label of a set id relative to a shared prefix
///
/// Strips `prefix`, then any leading path components, normalizes, and
/// removes leading underscores.
pub fn set_label(prefix: &str, set_id: &str) -> String {
    let rest = set_id.strip_prefix(prefix).unwrap_or(set_id);
    let rest = rest.rsplit('/').next().unwrap_or(rest);
    normalize_name(rest).trim_start_matches('_').to_string()
}

/// Longest common character prefix of all names
pub fn common_prefix<S: AsRef<str>>(names: &[S]) -> String {
    let Some((first, rest)) = names.split_first() else {
        return String::new();
    };
    let mut prefix: Vec<char> = first.as_ref().chars().collect();
    for name in rest {
        let shared = prefix
            .iter()
            .zip(name.as_ref().chars())
            .take_while(|(a, b)| *a == b)
            .count();
        prefix.truncate(shared);
    }
    prefix.into_iter().collect()
}

/// Assigns unique normalized labels, suffixing `_2`, `_3`, ... on collision
#[derive(Debug, Default)]
pub struct ColumnNamer {
    used: HashSet<String>,
}

impl ColumnNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `label`; repeated results get the next free numeric suffix
    pub fn assign(&mut self, label: &str) -> String {
        let base = normalize_name(label);
        let mut candidate = base.clone();
        let mut n = 2;
        while !self.used.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        candidate
    }
}

/// One benchmark row of a labeled dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetRow {
    pub benchmark_name: String,
    pub variability: f64,
    pub rate: f64,
}

/// Per-benchmark metrics of one set/version
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledDataset {
    pub label: String,
    pub rows: Vec<DatasetRow>,
}

impl LabeledDataset {
    pub fn new(label: impl Into<String>, rows: Vec<DatasetRow>) -> Self {
        Self {
            label: label.into(),
            rows,
        }
    }

    /// Dataset of representative rates and set variability
    pub fn from_set_records(label: impl Into<String>, records: &[&SetRecord]) -> Self {
        let rows = records
            .iter()
            .map(|r| DatasetRow {
                benchmark_name: r.benchmark_name.clone(),
                variability: r.variability,
                rate: r.op_rate as f64,
            })
            .collect();
        Self::new(label, rows)
    }

    fn index(&self) -> Result<HashMap<&str, &DatasetRow>> {
        let mut index = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            if index.insert(row.benchmark_name.as_str(), row).is_some() {
                return Err(ScoreError::DuplicateBenchmark {
                    label: self.label.clone(),
                    benchmark: row.benchmark_name.clone(),
                });
            }
        }
        Ok(index)
    }
}

/// Order in which per-set datasets are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SetOrder {
    OldestFirst,
    NewestFirst,
}

/// Split set records into one dataset per set id
///
/// Labels are the set ids with their common prefix removed. Records of every
/// origin are included; pass records of a single origin to avoid duplicate
/// benchmark names (`Pipeline::compare_sets` filters to one origin).
pub fn datasets_by_set(records: &[SetRecord], order: SetOrder) -> Vec<LabeledDataset> {
    let mut by_set: BTreeMap<&str, Vec<&SetRecord>> = BTreeMap::new();
    for record in records {
        by_set.entry(record.set_id.as_str()).or_default().push(record);
    }

    let mut set_ids: Vec<&str> = by_set.keys().copied().collect();
    if order == SetOrder::NewestFirst {
        set_ids.reverse();
    }
    let prefix = if set_ids.len() > 1 {
        common_prefix(&set_ids)
    } else {
        String::new()
    };

    set_ids
        .into_iter()
        .map(|set_id| {
            let mut label = set_label(&prefix, set_id);
            if label.is_empty() {
                label = normalize_name(set_id);
            }
            LabeledDataset::from_set_records(label, &by_set[set_id])
        })
        .collect()
}

/// Values of one dataset for one benchmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonCell {
    pub variability: f64,
    pub rate: f64,
    /// Percent change from the first dataset's rate; `None` for the first dataset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub benchmark: String,
    /// One cell per dataset, in dataset order
    pub cells: Vec<ComparisonCell>,
}

/// Wide comparison table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    /// Unique normalized labels, in dataset order
    pub labels: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Column names: `Benchmark`, then `Variability__<l>`, `Rate__<l>` and
    /// (after the first dataset) `Change__<l>` for each label
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = vec!["Benchmark".to_string()];
        for (i, label) in self.labels.iter().enumerate() {
            columns.push(format!("Variability__{}", label));
            columns.push(format!("Rate__{}", label));
            if i > 0 {
                columns.push(format!("Change__{}", label));
            }
        }
        columns
    }
}

/// Join datasets into one wide table keyed by benchmark name
///
/// # Errors
/// Returns `ScoreError::DuplicateBenchmark` if a dataset lists a benchmark twice.
pub fn compare(datasets: &[LabeledDataset]) -> Result<ComparisonTable> {
    let mut namer = ColumnNamer::new();
    let labels: Vec<String> = datasets.iter().map(|d| namer.assign(&d.label)).collect();

    let Some((first, rest)) = datasets.split_first() else {
        return Ok(ComparisonTable {
            labels,
            rows: Vec::new(),
        });
    };
    first.index()?;

    let mut rows: Vec<ComparisonRow> = first
        .rows
        .iter()
        .map(|row| ComparisonRow {
            benchmark: row.benchmark_name.clone(),
            cells: vec![ComparisonCell {
                variability: row.variability,
                rate: row.rate,
                change: None,
            }],
        })
        .collect();

    for dataset in rest {
        let index = dataset.index()?;
        let before = rows.len();
        rows.retain(|row| index.contains_key(row.benchmark.as_str()));
        if rows.len() < before {
            tracing::warn!(
                "Dataset {} is missing {} benchmarks of the first dataset; dropped from comparison",
                dataset.label,
                before - rows.len()
            );
        }

        for row in &mut rows {
            let joined = index[row.benchmark.as_str()];
            let first_rate = row.cells[0].rate;
            row.cells.push(ComparisonCell {
                variability: joined.variability,
                rate: joined.rate,
                change: Some(gain(first_rate, joined.rate) * 100.0),
            });
        }
    }

    Ok(ComparisonTable { labels, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(label: &str, rows: &[(&str, f64)]) -> LabeledDataset {
        LabeledDataset::new(
            label,
            rows.iter()
                .map(|(name, rate)| DatasetRow {
                    benchmark_name: name.to_string(),
                    variability: 0.01,
                    rate: *rate,
                })
                .collect(),
        )
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("A"), "A");
        assert_eq!(normalize_name("0.36.1"), "0_36_1");
        assert_eq!(normalize_name("stanbrub/full-set"), "stanbrub__full_set");
        assert_eq!(normalize_name("rate$ok"), "rate$ok");
    }

    #[test]
    fn test_change_is_percent_of_first() {
        let table = compare(&[
            dataset("A", &[("Bench1", 100.0)]),
            dataset("B", &[("Bench1", 120.0)]),
        ])
        .unwrap();
        assert_eq!(table.rows.len(), 1);
        let cells = &table.rows[0].cells;
        assert_eq!(cells[0].change, None);
        assert!((cells[1].change.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_inner_join_drops_non_matching_keys() {
        let table = compare(&[
            dataset("A", &[("Bench1", 100.0), ("OnlyInA", 5.0)]),
            dataset("B", &[("Bench1", 120.0), ("OnlyInB", 7.0)]),
        ])
        .unwrap();
        let names: Vec<&str> = table.rows.iter().map(|r| r.benchmark.as_str()).collect();
        assert_eq!(names, vec!["Bench1"]);
    }

    #[test]
    fn test_change_always_relative_to_first_dataset() {
        let table = compare(&[
            dataset("v1", &[("Bench1", 100.0)]),
            dataset("v2", &[("Bench1", 200.0)]),
            dataset("v3", &[("Bench1", 50.0)]),
        ])
        .unwrap();
        let cells = &table.rows[0].cells;
        assert!((cells[1].change.unwrap() - 100.0).abs() < 1e-9);
        assert!((cells[2].change.unwrap() + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_column_names() {
        let table = compare(&[
            dataset("user/set-a", &[("Bench1", 1.0)]),
            dataset("user/set-b", &[("Bench1", 1.0)]),
        ])
        .unwrap();
        assert_eq!(
            table.column_names(),
            vec![
                "Benchmark",
                "Variability__user__set_a",
                "Rate__user__set_a",
                "Variability__user__set_b",
                "Rate__user__set_b",
                "Change__user__set_b",
            ]
        );
    }

    #[test]
    fn test_label_collisions_are_suffixed() {
        let table = compare(&[
            dataset("set.1", &[("Bench1", 1.0)]),
            dataset("set-1", &[("Bench1", 1.0)]),
            dataset("set_1", &[("Bench1", 1.0)]),
        ])
        .unwrap();
        assert_eq!(table.labels, vec!["set_1", "set_1_2", "set_1_3"]);
    }

    #[test]
    fn test_duplicate_benchmark_rejected() {
        let err = compare(&[dataset("A", &[("Bench1", 1.0), ("Bench1", 2.0)])]).unwrap_err();
        assert!(matches!(err, ScoreError::DuplicateBenchmark { .. }));
    }

    #[test]
    fn test_zero_first_rate_change_is_zero() {
        let table = compare(&[
            dataset("A", &[("Bench1", 0.0)]),
            dataset("B", &[("Bench1", 10.0)]),
        ])
        .unwrap();
        assert_eq!(table.rows[0].cells[1].change, Some(0.0));
    }

    #[test]
    fn test_empty_input() {
        let table = compare(&[]).unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.column_names(), vec!["Benchmark"]);
    }

    #[test]
    fn test_set_label_and_prefix() {
        let ids = ["stanbrub/full-set-140M-a", "stanbrub/full-set-140M-b"];
        let prefix = common_prefix(&ids);
        assert_eq!(prefix, "stanbrub/full-set-140M-");
        assert_eq!(set_label(&prefix, ids[0]), "a");
        assert_eq!(set_label("", "user/_nightly"), "nightly");
    }

    #[test]
    fn test_datasets_by_set_order() {
        let record = |set_id: &str, rate: i64| SetRecord {
            benchmark_name: "Bench1".to_string(),
            origin: "deephaven-engine".to_string(),
            set_id: set_id.to_string(),
            run_id: "run-1".to_string(),
            timestamp: 0,
            test_duration: 1.0,
            op_duration: 1.0,
            op_rate: rate,
            row_count: 1,
            set_op_rates: vec![rate],
            variability: 0.0,
            label: None,
            platform: Default::default(),
            metrics: Default::default(),
        };
        let records = vec![record("me/run-2024-01", 100), record("me/run-2024-02", 150)];

        let oldest = datasets_by_set(&records, SetOrder::OldestFirst);
        // Common prefix is "me/run-2024-0"
        assert_eq!(oldest[0].label, "1");
        assert_eq!(oldest[1].label, "2");

        let newest = datasets_by_set(&records, SetOrder::NewestFirst);
        assert_eq!(newest[0].label, "2");
        let table = compare(&newest).unwrap();
        assert!((table.rows[0].cells[1].change.unwrap() + 100.0 / 3.0).abs() < 1e-9);
    }
}
