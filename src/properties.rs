//! Platform and metric properties of benchmark sets
//!
//! Platform rows describe the environment of a run (versions, hardware,
//! dependency jars). They are attached to set records by the run that was
//! chosen as the set's median, and compared across sets to show what changed
//! between them.

use crate::record::{MetricRecord, PlatformRecord, SetRecord};
use crate::scoring::{common_prefix, normalize_name, set_label};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Set each record's label from the platform property `property`
///
/// Rows are matched on (set id, run id, origin); the first matching row wins.
/// Records without a matching row keep no label.
pub fn attach_labels(
    records: Vec<SetRecord>,
    platforms: &[PlatformRecord],
    property: &str,
) -> Vec<SetRecord> {
    let values = first_platform_values(platforms, property);
    let mut labeled = 0usize;
    let records: Vec<SetRecord> = records
        .into_iter()
        .map(|mut record| {
            record.label = values
                .get(&(record.set_id.as_str(), record.run_id.as_str(), record.origin.as_str()))
                .map(|v| v.to_string());
            labeled += usize::from(record.label.is_some());
            record
        })
        .collect();
    tracing::debug!(
        "Attached '{}' labels to {} of {} set records",
        property,
        labeled,
        records.len()
    );
    records
}

/// Attach the named platform properties under normalized keys
pub fn attach_platform_values(
    records: Vec<SetRecord>,
    platforms: &[PlatformRecord],
    names: &[&str],
) -> Vec<SetRecord> {
    if names.is_empty() || platforms.is_empty() {
        return records;
    }
    let lookups: Vec<(String, HashMap<(&str, &str, &str), &str>)> = dedup(names)
        .into_iter()
        .map(|name| (normalize_name(name), first_platform_values(platforms, name)))
        .collect();

    records
        .into_iter()
        .map(|mut record| {
            let key = (record.set_id.as_str(), record.run_id.as_str(), record.origin.as_str());
            let found: Vec<(String, String)> = lookups
                .iter()
                .filter_map(|(column, values)| {
                    values.get(&key).map(|v| (column.clone(), v.to_string()))
                })
                .collect();
            record.platform.extend(found);
            record
        })
        .collect()
}

/// Attach the named metric values under normalized keys
///
/// Metrics are matched on (benchmark, set id, run id, origin).
pub fn attach_metric_values(
    records: Vec<SetRecord>,
    metrics: &[MetricRecord],
    names: &[&str],
) -> Vec<SetRecord> {
    if names.is_empty() || metrics.is_empty() {
        return records;
    }
    let mut lookups: Vec<(String, HashMap<(&str, &str, &str, &str), f64>)> = Vec::new();
    for name in dedup(names) {
        let mut values = HashMap::new();
        for metric in metrics.iter().filter(|m| m.name == name) {
            values
                .entry((
                    metric.benchmark_name.as_str(),
                    metric.set_id.as_str(),
                    metric.run_id.as_str(),
                    metric.origin.as_str(),
                ))
                .or_insert(metric.value);
        }
        lookups.push((normalize_name(name), values));
    }

    records
        .into_iter()
        .map(|mut record| {
            let key = (
                record.benchmark_name.as_str(),
                record.set_id.as_str(),
                record.run_id.as_str(),
                record.origin.as_str(),
            );
            let found: Vec<(String, f64)> = lookups
                .iter()
                .filter_map(|(column, values)| values.get(&key).map(|v| (column.clone(), *v)))
                .collect();
            record.metrics.extend(found);
            record
        })
        .collect()
}

fn first_platform_values<'a>(
    platforms: &'a [PlatformRecord],
    name: &str,
) -> HashMap<(&'a str, &'a str, &'a str), &'a str> {
    let mut values = HashMap::new();
    for row in platforms.iter().filter(|p| p.name == name) {
        values
            .entry((row.set_id.as_str(), row.run_id.as_str(), row.origin.as_str()))
            .or_insert(row.value.as_str());
    }
    values
}

fn dedup<'a>(names: &[&'a str]) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    names.iter().copied().filter(|n| seen.insert(*n)).collect()
}

/// Attached property keys present on any record: (platform, metrics), sorted
pub fn attached_keys(records: &[SetRecord]) -> (Vec<String>, Vec<String>) {
    let mut platform = BTreeSet::new();
    let mut metrics = BTreeSet::new();
    for record in records {
        platform.extend(record.platform.keys().cloned());
        metrics.extend(record.metrics.keys().cloned());
    }
    (platform.into_iter().collect(), metrics.into_iter().collect())
}

/// Kind of a platform property in a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyGroup {
    /// Engine version and jar dependencies
    Jar,
    /// Python version and python packages
    Python,
    Other,
}

impl PropertyGroup {
    /// Classify a property name
    ///
    /// # Example
    /// ```
    /// use benchscore::properties::PropertyGroup;
    ///
    /// assert_eq!(PropertyGroup::of("deephaven.version"), PropertyGroup::Jar);
    /// assert_eq!(PropertyGroup::of("numpy.py"), PropertyGroup::Python);
    /// assert_eq!(PropertyGroup::of("java.version"), PropertyGroup::Other);
    /// ```
    pub fn of(name: &str) -> Self {
        if name == "deephaven.version" || name == "dependency.jar.size" || name.ends_with(".jar")
        {
            PropertyGroup::Jar
        } else if name == "python.version"
            || name == "dependency.python.size"
            || name.ends_with(".py")
        {
            PropertyGroup::Python
        } else {
            PropertyGroup::Other
        }
    }

    /// Name as shown in a diff, without the dependency file suffix
    pub fn display_name(self, name: &str) -> String {
        let suffix = match self {
            PropertyGroup::Jar => ".jar",
            PropertyGroup::Python => ".py",
            PropertyGroup::Other => return name.to_string(),
        };
        name.strip_suffix(suffix).unwrap_or(name).to_string()
    }
}

/// One property whose value differs between sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDiff {
    pub group: PropertyGroup,
    /// Raw property name
    pub name: String,
    pub display_name: String,
    /// One value per set, in the diff's set order; `None` when a set lacks it
    pub values: Vec<Option<String>>,
}

/// Platform properties that changed between sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformDiff {
    /// Set ids, newest first
    pub set_ids: Vec<String>,
    /// Column labels of the sets (common prefix removed)
    pub labels: Vec<String>,
    /// Ordered by group (jar, python, other), then name
    pub rows: Vec<PropertyDiff>,
}

impl PlatformDiff {
    pub fn group(&self, group: PropertyGroup) -> impl Iterator<Item = &PropertyDiff> {
        self.rows.iter().filter(move |r| r.group == group)
    }
}

/// Diff the platform properties of one origin across sets
///
/// Each set contributes the first row seen for every property name. A
/// property is reported when it takes more than one distinct value.
pub fn platform_diff(platforms: &[PlatformRecord], origin: &str) -> PlatformDiff {
    let mut per_set: BTreeMap<&str, BTreeMap<&str, &str>> = BTreeMap::new();
    for row in platforms.iter().filter(|p| p.origin == origin) {
        per_set
            .entry(row.set_id.as_str())
            .or_default()
            .entry(row.name.as_str())
            .or_insert(row.value.as_str());
    }

    let set_ids: Vec<&str> = per_set.keys().rev().copied().collect();
    let prefix = if set_ids.len() > 1 {
        common_prefix(&set_ids)
    } else {
        String::new()
    };
    let labels = set_ids
        .iter()
        .map(|id| {
            let label = set_label(&prefix, id);
            if label.is_empty() {
                normalize_name(id)
            } else {
                label
            }
        })
        .collect();

    let mut distinct: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for properties in per_set.values() {
        for (name, value) in properties {
            distinct.entry(*name).or_default().insert(*value);
        }
    }

    let mut rows: Vec<PropertyDiff> = distinct
        .into_iter()
        .filter(|(_, values)| values.len() > 1)
        .map(|(name, _)| {
            let group = PropertyGroup::of(name);
            PropertyDiff {
                group,
                name: name.to_string(),
                display_name: group.display_name(name),
                values: set_ids
                    .iter()
                    .map(|id| per_set[id].get(name).map(|v| v.to_string()))
                    .collect(),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.name.cmp(&b.name)));

    tracing::debug!(
        "Platform diff for {}: {} changed properties across {} sets",
        origin,
        rows.len(),
        set_ids.len()
    );

    PlatformDiff {
        set_ids: set_ids.into_iter().map(str::to_string).collect(),
        labels,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(set_id: &str, run_id: &str, name: &str, value: &str) -> PlatformRecord {
        PlatformRecord {
            origin: "deephaven-engine".to_string(),
            name: name.to_string(),
            value: value.to_string(),
            set_id: set_id.to_string(),
            run_id: run_id.to_string(),
        }
    }

    fn set_record(set_id: &str, run_id: &str) -> SetRecord {
        SetRecord {
            benchmark_name: "Where- 2 Filters".to_string(),
            origin: "deephaven-engine".to_string(),
            set_id: set_id.to_string(),
            run_id: run_id.to_string(),
            timestamp: 0,
            test_duration: 1.0,
            op_duration: 1.0,
            op_rate: 100,
            row_count: 1,
            set_op_rates: vec![100],
            variability: 0.0,
            label: None,
            platform: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn test_attach_labels_matches_median_run() {
        let platforms = vec![
            platform("deephaven/00.036.00", "run-a", "deephaven.version", "0.36.0"),
            platform("deephaven/00.036.00", "run-b", "deephaven.version", "0.36.0-b"),
            platform("deephaven/00.036.00", "run-b", "deephaven.version", "ignored"),
        ];
        let records = vec![
            set_record("deephaven/00.036.00", "run-b"),
            set_record("deephaven/00.037.00", "run-c"),
        ];
        let records = attach_labels(records, &platforms, "deephaven.version");
        assert_eq!(records[0].label.as_deref(), Some("0.36.0-b"));
        assert_eq!(records[1].label, None);
    }

    #[test]
    fn test_attach_labels_requires_same_origin() {
        let mut row = platform("s1", "run-a", "deephaven.version", "0.36.0");
        row.origin = "test-runner".to_string();
        let records = attach_labels(vec![set_record("s1", "run-a")], &[row], "deephaven.version");
        assert_eq!(records[0].label, None);
    }

    #[test]
    fn test_attach_platform_values_normalizes_keys() {
        let platforms = vec![
            platform("s1", "run-a", "java.version", "21.0.1"),
            platform("s1", "run-a", "available.processors", "16"),
        ];
        let records = attach_platform_values(
            vec![set_record("s1", "run-a")],
            &platforms,
            &["java.version", "available.processors", "java.version", "missing"],
        );
        let platform = &records[0].platform;
        assert_eq!(platform.len(), 2);
        assert_eq!(platform["java_version"], "21.0.1");
        assert_eq!(platform["available_processors"], "16");
    }

    #[test]
    fn test_attach_metric_values() {
        let metric = MetricRecord {
            benchmark_name: "Where- 2 Filters".to_string(),
            origin: "deephaven-engine".to_string(),
            timestamp: 0,
            name: "HeapMemoryUsage Used".to_string(),
            value: 1024.0,
            note: String::new(),
            set_id: "s1".to_string(),
            run_id: "run-a".to_string(),
        };
        let records = attach_metric_values(
            vec![set_record("s1", "run-a"), set_record("s1", "run-b")],
            &[metric],
            &["HeapMemoryUsage Used"],
        );
        assert_eq!(records[0].metrics["HeapMemoryUsage_Used"], 1024.0);
        assert!(records[1].metrics.is_empty());
    }

    #[test]
    fn test_missing_optional_inputs_are_noop() {
        let records = vec![set_record("s1", "run-a")];
        assert_eq!(attach_platform_values(records.clone(), &[], &["x"]), records);
        assert_eq!(attach_metric_values(records.clone(), &[], &[]), records);
        let labeled = attach_labels(records, &[], "deephaven.version");
        assert_eq!(labeled[0].label, None);
    }

    #[test]
    fn test_property_groups() {
        assert_eq!(PropertyGroup::of("dependency.jar.size"), PropertyGroup::Jar);
        assert_eq!(PropertyGroup::of("deephaven-engine-table.jar"), PropertyGroup::Jar);
        assert_eq!(PropertyGroup::of("python.version"), PropertyGroup::Python);
        assert_eq!(PropertyGroup::of("dependency.python.size"), PropertyGroup::Python);
        assert_eq!(PropertyGroup::Jar.display_name("guava.jar"), "guava");
        assert_eq!(PropertyGroup::Python.display_name("pandas.py"), "pandas");
        assert_eq!(PropertyGroup::Other.display_name("os.name.py"), "os.name.py");
    }

    #[test]
    fn test_platform_diff_reports_changed_properties() {
        let platforms = vec![
            platform("user/set-a", "run-1", "deephaven.version", "0.36.0"),
            platform("user/set-a", "run-1", "guava.jar", "32.1"),
            platform("user/set-a", "run-1", "os.name", "Linux"),
            platform("user/set-a", "run-1", "numpy.py", "1.26"),
            platform("user/set-b", "run-1", "deephaven.version", "0.37.0"),
            platform("user/set-b", "run-1", "guava.jar", "33.0"),
            platform("user/set-b", "run-1", "os.name", "Linux"),
            platform("user/set-b", "run-1", "java.version", "21"),
            platform("user/set-b", "run-2", "java.version", "17"),
        ];
        let mut other_origin = platform("user/set-b", "run-1", "os.name", "Darwin");
        other_origin.origin = "test-runner".to_string();
        let mut all = platforms;
        all.push(other_origin);

        let diff = platform_diff(&all, "deephaven-engine");
        assert_eq!(diff.set_ids, vec!["user/set-b", "user/set-a"]);
        assert_eq!(diff.labels, vec!["b", "a"]);

        let names: Vec<&str> = diff.rows.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["deephaven.version", "guava"]);
        assert_eq!(
            diff.rows[1].values,
            vec![Some("33.0".to_string()), Some("32.1".to_string())]
        );
        assert_eq!(diff.group(PropertyGroup::Python).count(), 0);
    }

    #[test]
    fn test_platform_diff_single_set_is_empty() {
        let diff = platform_diff(
            &[platform("deephaven/2024-01-01", "run-1", "os.name", "Linux")],
            "deephaven-engine",
        );
        assert!(diff.rows.is_empty());
        assert_eq!(diff.labels, vec!["2024_01_01"]);
    }

    #[test]
    fn test_attached_keys_union() {
        let mut a = set_record("s1", "run-1");
        a.platform.insert("python_version".to_string(), "3.10".to_string());
        let mut b = set_record("s2", "run-1");
        b.platform.insert("os_name".to_string(), "Linux".to_string());
        b.metrics.insert("jvm_heap_used".to_string(), 1.0);

        let (platform, metrics) = attached_keys(&[a, b]);
        assert_eq!(platform, vec!["os_name", "python_version"]);
        assert_eq!(metrics, vec!["jvm_heap_used"]);
    }
}
