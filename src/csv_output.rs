//! CSV output for spreadsheet analysis and machine parsing
//!
//! Values are written unscaled: statistics stay fractions, rates stay plain
//! numbers. The only percent values are comparison `Change__` columns.

use crate::properties::{attached_keys, PlatformDiff, PropertyGroup};
use crate::record::SetRecord;
use crate::scoring::{ComparisonTable, RankedTable, RateChange, TrendSummary};

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Tabular CSV output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvOutput {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvOutput {
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ranked rows in the large or condensed width
    pub fn ranking(table: &RankedTable, condensed: bool) -> Self {
        if condensed {
            let mut out = Self::new([
                "benchmark",
                "change",
                "release_change",
                "variability",
                "rate",
                "probability",
            ]);
            for row in &table.condensed {
                out.add_row(vec![
                    row.benchmark.clone(),
                    row.change.to_string(),
                    optional(row.release_change),
                    row.variability.to_string(),
                    row.rate.to_string(),
                    row.probability.to_string(),
                ]);
            }
            out
        } else {
            let mut out = Self::new([
                "benchmark",
                "origin",
                "set_id",
                "variability",
                "rate",
                "change",
                "release_change",
                "score",
                "probability",
            ]);
            for row in &table.large {
                out.add_row(vec![
                    row.benchmark.clone(),
                    row.origin.clone(),
                    row.set_id.clone(),
                    row.variability.to_string(),
                    row.rate.to_string(),
                    row.change.to_string(),
                    optional(row.release_change),
                    row.score.to_string(),
                    row.probability.to_string(),
                ]);
            }
            out
        }
    }

    pub fn trends(summaries: &[TrendSummary]) -> Self {
        let mut out = Self::new([
            "benchmark",
            "origin",
            "scored_sets",
            "mean_rate",
            "mean_variability",
            "score_min",
            "score_max",
            "score_mean",
            "hits",
        ]);
        for s in summaries {
            out.add_row(vec![
                s.benchmark_name.clone(),
                s.origin.clone(),
                s.scored_sets.to_string(),
                s.mean_rate.to_string(),
                s.mean_variability.to_string(),
                s.score_min.to_string(),
                s.score_max.to_string(),
                s.score_mean.to_string(),
                s.hits.to_string(),
            ]);
        }
        out
    }

    pub fn changes(changes: &[RateChange]) -> Self {
        let mut out = Self::new([
            "benchmark",
            "origin",
            "set_id",
            "label",
            "rate",
            "variability",
            "change",
        ]);
        for c in changes {
            out.add_row(vec![
                c.benchmark_name.clone(),
                c.origin.clone(),
                c.set_id.clone(),
                c.label.clone().unwrap_or_default(),
                c.op_rate.to_string(),
                c.variability.to_string(),
                c.change.to_string(),
            ]);
        }
        out
    }

    pub fn comparison(table: &ComparisonTable) -> Self {
        let mut out = Self::new(table.column_names());
        for row in &table.rows {
            let mut fields = vec![row.benchmark.clone()];
            for cell in &row.cells {
                fields.push(cell.variability.to_string());
                fields.push(cell.rate.to_string());
                if let Some(change) = cell.change {
                    fields.push(change.to_string());
                }
            }
            out.add_row(fields);
        }
        out
    }

    pub fn platform_diff(diff: &PlatformDiff) -> Self {
        let mut header = vec!["group".to_string(), "name".to_string()];
        header.extend(diff.labels.iter().map(|l| format!("Val_{}", l)));
        let mut out = Self::new(header);
        for row in &diff.rows {
            let group = match row.group {
                PropertyGroup::Jar => "jar",
                PropertyGroup::Python => "python",
                PropertyGroup::Other => "other",
            };
            let mut fields = vec![group.to_string(), row.display_name.clone()];
            fields.extend(row.values.iter().map(|v| v.clone().unwrap_or_default()));
            out.add_row(fields);
        }
        out
    }

    /// Set records; attached properties follow the fixed columns
    pub fn records(records: &[SetRecord]) -> Self {
        let (platform_keys, metric_keys) = attached_keys(records);
        let mut header: Vec<String> = [
            "benchmark",
            "origin",
            "set_id",
            "run_id",
            "label",
            "set_count",
            "rate",
            "variability",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        header.extend(platform_keys.iter().cloned());
        header.extend(metric_keys.iter().cloned());

        let mut out = Self::new(header);
        for r in records {
            let mut fields = vec![
                r.benchmark_name.clone(),
                r.origin.clone(),
                r.set_id.clone(),
                r.run_id.clone(),
                r.label.clone().unwrap_or_default(),
                r.set_count().to_string(),
                r.op_rate.to_string(),
                r.variability.to_string(),
            ];
            fields.extend(
                platform_keys
                    .iter()
                    .map(|k| r.platform.get(k).cloned().unwrap_or_default()),
            );
            fields.extend(
                metric_keys
                    .iter()
                    .map(|k| optional(r.metrics.get(k).copied())),
            );
            out.add_row(fields);
        }
        out
    }

    /// Generate CSV text, header first
    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}
