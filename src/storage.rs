//! Local benchmark storage
//!
//! Results are stored one directory per run:
//!
//! ```text
//! <root>/<category>/<actor>/<set_label>/<run_id>/benchmark-results.csv
//!                                               /benchmark-metrics.csv
//!                                               /benchmark-platform.csv
//! ```
//!
//! Every loaded row is tagged with `set_id = "<actor>/<set_label>"` and the
//! run directory name as `run_id`.

use crate::record::{MetricRecord, PlatformRecord, Sample};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const RESULTS_FILE: &str = "benchmark-results.csv";
pub const METRICS_FILE: &str = "benchmark-metrics.csv";
pub const PLATFORM_FILE: &str = "benchmark-platform.csv";

/// Default maximum number of sets loaded by a query
pub const DEFAULT_MAX_SETS: usize = 100;

const RUN_PATTERN: &str = "run-[0-9A-Za-z]+";

/// Actor filter used when none is given
pub fn default_actor_filter(category: &str) -> &'static str {
    match category {
        "release" | "nightly" | "compare" => "deephaven",
        _ => ".+",
    }
}

/// Set filter used when none is given
///
/// Release sets are zero-padded versions (`00.036.01`), nightly sets are
/// dates (`2024-03-01`).
pub fn default_set_filter(category: &str) -> &'static str {
    match category {
        "release" | "compare" => "[0-9]{2}[.][0-9]{3}[.][0-9]{2}",
        "nightly" => "[0-9]{4}([-][0-9]{2}){2}",
        _ => ".+",
    }
}

/// Regex matching at the start of a name
fn prefix_matcher(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})", pattern))
        .with_context(|| format!("Invalid storage filter: {}", pattern))
}

/// Selection of sets from a storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageQuery {
    pub root: PathBuf,
    pub category: String,
    /// Regex over actor directory names; defaults per category
    pub actor_filter: Option<String>,
    /// Regex over set directory names; defaults per category
    pub set_filter: Option<String>,
    /// Newest sets kept, by descending `actor/set_label`
    pub max_sets: usize,
}

/// One run directory selected by a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPath {
    pub set_id: String,
    pub run_id: String,
    pub dir: PathBuf,
}

/// All rows loaded for a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageData {
    pub samples: Vec<Sample>,
    pub metrics: Vec<MetricRecord>,
    pub platforms: Vec<PlatformRecord>,
}

impl StorageQuery {
    pub fn new(root: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            category: category.into(),
            actor_filter: None,
            set_filter: None,
            max_sets: DEFAULT_MAX_SETS,
        }
    }

    pub fn with_actor_filter(mut self, filter: impl Into<String>) -> Self {
        self.actor_filter = Some(filter.into());
        self
    }

    pub fn with_set_filter(mut self, filter: impl Into<String>) -> Self {
        self.set_filter = Some(filter.into());
        self
    }

    pub fn with_max_sets(mut self, max_sets: usize) -> Self {
        self.max_sets = max_sets;
        self
    }

    pub fn actor_pattern(&self) -> &str {
        match self.actor_filter.as_deref() {
            Some(filter) if !filter.trim().is_empty() => filter,
            _ => default_actor_filter(&self.category),
        }
    }

    pub fn set_pattern(&self) -> &str {
        match self.set_filter.as_deref() {
            Some(filter) if !filter.trim().is_empty() => filter,
            _ => default_set_filter(&self.category),
        }
    }

    fn category_dir(&self) -> PathBuf {
        self.root.join(&self.category)
    }

    /// Run directories of the newest `max_sets` matching sets
    ///
    /// # Errors
    /// Fails when a filter does not compile or the category directory cannot
    /// be listed.
    pub fn run_paths(&self) -> Result<Vec<RunPath>> {
        let actor_matcher = prefix_matcher(self.actor_pattern())?;
        let set_matcher = prefix_matcher(self.set_pattern())?;
        let run_matcher = prefix_matcher(RUN_PATTERN)?;

        let category_dir = self.category_dir();
        let mut sets: Vec<(String, PathBuf)> = Vec::new();
        for actor in child_dirs(&category_dir)? {
            if !actor_matcher.is_match(&actor) {
                continue;
            }
            let actor_dir = category_dir.join(&actor);
            let set_labels = match child_dirs(&actor_dir) {
                Ok(labels) => labels,
                Err(e) => {
                    tracing::warn!("Skipping actor directory {}: {:#}", actor_dir.display(), e);
                    continue;
                }
            };
            for set_label in set_labels {
                if set_matcher.is_match(&set_label) {
                    sets.push((format!("{}/{}", actor, set_label), actor_dir.join(&set_label)));
                }
            }
        }
        sets.sort_by(|a, b| b.0.cmp(&a.0));
        sets.truncate(self.max_sets);

        let mut runs = Vec::new();
        for (set_id, set_dir) in sets {
            let run_ids = match child_dirs(&set_dir) {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!("Skipping set directory {}: {:#}", set_dir.display(), e);
                    continue;
                }
            };
            for run_id in run_ids {
                if run_matcher.is_match(&run_id) {
                    runs.push(RunPath {
                        set_id: set_id.clone(),
                        dir: set_dir.join(&run_id),
                        run_id,
                    });
                }
            }
        }

        tracing::debug!(
            "Storage query {}/{} (actor '{}', set '{}'): {} runs",
            self.root.display(),
            self.category,
            self.actor_pattern(),
            self.set_pattern(),
            runs.len()
        );
        Ok(runs)
    }

    /// Load results, metrics and platform rows of every selected run
    pub fn load(&self) -> Result<StorageData> {
        let runs = self.run_paths()?;
        Ok(StorageData {
            samples: load_results(&runs)?,
            metrics: load_metrics(&runs)?,
            platforms: load_platform(&runs)?,
        })
    }
}

/// Directory names under `dir`, newest (descending) first
fn child_dirs(dir: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list directory: {}", dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort_by(|a, b| b.cmp(a));
    Ok(names)
}

/// Parse integral text, accepting float notation (rounded)
fn parse_i64(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.round() as i64))
}

fn parse_f64(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

fn field<T>(value: Option<T>, column: &str, raw: &str, path: &Path, line: usize) -> Result<T> {
    value.with_context(|| {
        format!(
            "Invalid {} '{}' in {} at record {}",
            column,
            raw,
            path.display(),
            line
        )
    })
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    benchmark_name: String,
    origin: String,
    timestamp: String,
    test_duration: String,
    op_duration: String,
    op_rate: String,
    row_count: String,
}

#[derive(Debug, Deserialize)]
struct MetricRow {
    benchmark_name: String,
    origin: String,
    timestamp: String,
    name: String,
    value: String,
    #[serde(default)]
    note: String,
}

#[derive(Debug, Deserialize)]
struct PlatformRow {
    origin: String,
    name: String,
    value: String,
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for (i, row) in reader.deserialize().enumerate() {
        let row: T = row.with_context(|| {
            format!("Failed to parse {} at record {}", path.display(), i + 1)
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Load `benchmark-results.csv` of every run
///
/// # Errors
/// A run without a results file is an error.
pub fn load_results(runs: &[RunPath]) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();
    for run in runs {
        let path = run.dir.join(RESULTS_FILE);
        for (i, row) in read_rows::<ResultRow>(&path)?.into_iter().enumerate() {
            let line = i + 1;
            samples.push(Sample {
                timestamp: field(parse_i64(&row.timestamp), "timestamp", &row.timestamp, &path, line)?,
                test_duration: field(
                    parse_f64(&row.test_duration),
                    "test_duration",
                    &row.test_duration,
                    &path,
                    line,
                )?,
                op_duration: field(
                    parse_f64(&row.op_duration),
                    "op_duration",
                    &row.op_duration,
                    &path,
                    line,
                )?,
                op_rate: field(parse_i64(&row.op_rate), "op_rate", &row.op_rate, &path, line)?,
                row_count: field(parse_i64(&row.row_count), "row_count", &row.row_count, &path, line)?,
                benchmark_name: row.benchmark_name,
                origin: row.origin,
                set_id: run.set_id.clone(),
                run_id: run.run_id.clone(),
            });
        }
    }
    tracing::debug!("Loaded {} result rows from {} runs", samples.len(), runs.len());
    Ok(samples)
}

/// Load `benchmark-metrics.csv` of every run; runs without one are skipped
pub fn load_metrics(runs: &[RunPath]) -> Result<Vec<MetricRecord>> {
    let mut metrics = Vec::new();
    for run in runs {
        let path = run.dir.join(METRICS_FILE);
        if !path.is_file() {
            tracing::warn!("No metrics file for run {}: {}", run.run_id, path.display());
            continue;
        }
        for (i, row) in read_rows::<MetricRow>(&path)?.into_iter().enumerate() {
            let line = i + 1;
            metrics.push(MetricRecord {
                timestamp: field(parse_i64(&row.timestamp), "timestamp", &row.timestamp, &path, line)?,
                value: field(parse_f64(&row.value), "value", &row.value, &path, line)?,
                benchmark_name: row.benchmark_name,
                origin: row.origin,
                name: row.name,
                note: row.note,
                set_id: run.set_id.clone(),
                run_id: run.run_id.clone(),
            });
        }
    }
    Ok(metrics)
}

/// Load `benchmark-platform.csv` of every run; runs without one are skipped
pub fn load_platform(runs: &[RunPath]) -> Result<Vec<PlatformRecord>> {
    let mut platforms = Vec::new();
    for run in runs {
        let path = run.dir.join(PLATFORM_FILE);
        if !path.is_file() {
            tracing::warn!("No platform file for run {}: {}", run.run_id, path.display());
            continue;
        }
        for row in read_rows::<PlatformRow>(&path)? {
            platforms.push(PlatformRecord {
                origin: row.origin,
                name: row.name,
                value: row.value,
                set_id: run.set_id.clone(),
                run_id: run.run_id.clone(),
            });
        }
    }
    Ok(platforms)
}
