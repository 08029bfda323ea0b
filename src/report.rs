//! Human-readable text reports
//!
//! All percentage scaling happens here: statistics arrive as fractions and
//! are shown as `0.0%` (probability as `0.00%`). Rates are shown as
//! `###,##0`.

use crate::properties::{attached_keys, PlatformDiff, PropertyGroup};
use crate::record::SetRecord;
use crate::scoring::{ComparisonTable, Exclusions, RankOrder, RankedTable, RateChange, TrendSummary};

/// Rate with thousands separators, rounded to an integer
///
/// # Example
/// ```
/// use benchscore::report::format_rate;
///
/// assert_eq!(format_rate(1234567.4), "1,234,567");
/// assert_eq!(format_rate(-999.0), "-999");
/// ```
pub fn format_rate(rate: f64) -> String {
    if !rate.is_finite() {
        return rate.to_string();
    }
    let rounded = rate.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Fraction as a percentage with `decimals` places
///
/// # Example
/// ```
/// use benchscore::report::format_percent;
///
/// assert_eq!(format_percent(0.238, 1), "23.8%");
/// assert_eq!(format_percent(0.00123, 2), "0.12%");
/// ```
pub fn format_percent(fraction: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, fraction * 100.0)
}

fn format_optional_percent(fraction: Option<f64>) -> String {
    fraction.map_or_else(String::new, |f| format_percent(f, 1))
}

/// Column-aligned plain text table
#[derive(Debug, Default)]
struct TextTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Columns aligned to the right (numbers)
    numeric: Vec<bool>,
}

impl TextTable {
    fn new(columns: &[(&str, bool)]) -> Self {
        Self {
            header: columns.iter().map(|(name, _)| name.to_string()).collect(),
            rows: Vec::new(),
            numeric: columns.iter().map(|(_, numeric)| *numeric).collect(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let mut out = String::new();
        self.render_line(&mut out, &self.header, &widths);
        let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(rule_width));
        out.push('\n');
        for row in &self.rows {
            self.render_line(&mut out, row, &widths);
        }
        out
    }

    fn render_line(&self, out: &mut String, cells: &[String], widths: &[usize]) {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                if self.numeric.get(i).copied().unwrap_or(false) {
                    format!("{:>width$}", cell, width = width)
                } else {
                    format!("{:<width$}", cell, width = width)
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
}

fn order_title(order: RankOrder) -> &'static str {
    match order {
        RankOrder::Worst => "Worst",
        RankOrder::Best => "Best",
    }
}

/// Ranked table in its large or condensed width
pub fn render_ranking(table: &RankedTable, condensed: bool) -> String {
    let with_release = if condensed {
        table.condensed.iter().any(|r| r.release_change.is_some())
    } else {
        table.large.iter().any(|r| r.release_change.is_some())
    };

    let mut out = format!("=== {} Benchmarks ===\n", order_title(table.order));
    if condensed {
        let mut columns = vec![("Benchmark", false), ("Change", true)];
        if with_release {
            columns.push(("Since Release", true));
        }
        columns.extend([("Variability", true), ("Rate", true), ("Probability", true)]);
        let mut text = TextTable::new(&columns);
        for row in &table.condensed {
            let mut cells = vec![row.benchmark.clone(), format_percent(row.change, 1)];
            if with_release {
                cells.push(format_optional_percent(row.release_change));
            }
            cells.extend([
                format_percent(row.variability, 1),
                format_rate(row.rate as f64),
                format_percent(row.probability, 2),
            ]);
            text.push(cells);
        }
        out.push_str(&text.render());
    } else {
        let mut columns = vec![
            ("Benchmark", false),
            ("Origin", false),
            ("Set", false),
            ("Variability", true),
            ("Rate", true),
            ("Change", true),
        ];
        if with_release {
            columns.push(("Since Release", true));
        }
        columns.extend([("Score", true), ("Probability", true)]);
        let mut text = TextTable::new(&columns);
        for row in &table.large {
            let mut cells = vec![
                row.benchmark.clone(),
                row.origin.clone(),
                row.set_id.clone(),
                format_percent(row.variability, 1),
                format_rate(row.rate as f64),
                format_percent(row.change, 1),
            ];
            if with_release {
                cells.push(format_optional_percent(row.release_change));
            }
            cells.extend([format!("{:.2}", row.score), format_percent(row.probability, 2)]);
            text.push(cells);
        }
        out.push_str(&text.render());
    }
    out
}

/// One-paragraph summary of what eligibility left out
pub fn render_exclusions(exclusions: &Exclusions) -> String {
    let mut out = String::new();
    if let Some(latest) = &exclusions.latest_set {
        out.push_str(&format!("Latest set: {}\n", latest));
    }
    let list = |pairs: &[(String, String)]| {
        pairs
            .iter()
            .map(|(name, origin)| format!("{} ({})", name, origin))
            .collect::<Vec<_>>()
            .join(", ")
    };
    if !exclusions.obsolete.is_empty() {
        out.push_str(&format!(
            "Excluded as obsolete: {}\n",
            list(&exclusions.obsolete)
        ));
    }
    if !exclusions.new.is_empty() {
        out.push_str(&format!("Excluded as new: {}\n", list(&exclusions.new)));
    }
    out
}

pub fn render_trends(summaries: &[TrendSummary]) -> String {
    let mut text = TextTable::new(&[
        ("Benchmark", false),
        ("Origin", false),
        ("Sets", true),
        ("Mean Rate", true),
        ("Mean Variability", true),
        ("Score Min", true),
        ("Score Max", true),
        ("Score Mean", true),
        ("Hits", true),
    ]);
    for s in summaries {
        text.push(vec![
            s.benchmark_name.clone(),
            s.origin.clone(),
            s.scored_sets.to_string(),
            format_rate(s.mean_rate),
            format_percent(s.mean_variability, 1),
            format!("{:.2}", s.score_min),
            format!("{:.2}", s.score_max),
            format!("{:.2}", s.score_mean),
            s.hits.to_string(),
        ]);
    }
    format!("=== Score Trends ===\n{}", text.render())
}

pub fn render_changes(changes: &[RateChange]) -> String {
    let mut text = TextTable::new(&[
        ("Benchmark", false),
        ("Origin", false),
        ("Set", false),
        ("Label", false),
        ("Rate", true),
        ("Variability", true),
        ("Change", true),
    ]);
    for c in changes {
        text.push(vec![
            c.benchmark_name.clone(),
            c.origin.clone(),
            c.set_id.clone(),
            c.label.clone().unwrap_or_default(),
            format_rate(c.op_rate as f64),
            format_percent(c.variability, 1),
            format_percent(c.change, 1),
        ]);
    }
    format!("=== Rate Changes ===\n{}", text.render())
}

/// Comparison table; `Change__` values are already percent
pub fn render_comparison(table: &ComparisonTable) -> String {
    let names = table.column_names();
    let columns: Vec<(&str, bool)> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i > 0))
        .collect();
    let mut text = TextTable::new(&columns);
    for row in &table.rows {
        let mut cells = vec![row.benchmark.clone()];
        for cell in &row.cells {
            cells.push(format_percent(cell.variability, 1));
            cells.push(format_rate(cell.rate));
            if let Some(change) = cell.change {
                cells.push(format!("{:.1}%", change));
            }
        }
        text.push(cells);
    }
    format!("=== Set Comparison ===\n{}", text.render())
}

/// Set records with one column per attached property
pub fn render_records(records: &[SetRecord]) -> String {
    let (platform_keys, metric_keys) = attached_keys(records);
    let mut columns = vec![
        ("Benchmark", false),
        ("Origin", false),
        ("Set", false),
        ("Label", false),
        ("Runs", true),
        ("Rate", true),
        ("Variability", true),
    ];
    columns.extend(platform_keys.iter().map(|k| (k.as_str(), false)));
    columns.extend(metric_keys.iter().map(|k| (k.as_str(), true)));
    let mut text = TextTable::new(&columns);
    for r in records {
        let mut cells = vec![
            r.benchmark_name.clone(),
            r.origin.clone(),
            r.set_id.clone(),
            r.label.clone().unwrap_or_default(),
            r.set_count().to_string(),
            format_rate(r.op_rate as f64),
            format_percent(r.variability, 1),
        ];
        cells.extend(
            platform_keys
                .iter()
                .map(|k| r.platform.get(k).cloned().unwrap_or_default()),
        );
        cells.extend(
            metric_keys
                .iter()
                .map(|k| r.metrics.get(k).map(|v| v.to_string()).unwrap_or_default()),
        );
        text.push(cells);
    }
    format!("=== Set Records ===\n{}", text.render())
}

/// Platform diff split into jar, python and other changes
pub fn render_platform_diff(diff: &PlatformDiff) -> String {
    let mut out = String::new();
    for (group, title) in [
        (PropertyGroup::Jar, "Jar Changes"),
        (PropertyGroup::Python, "Python Changes"),
        (PropertyGroup::Other, "Other Changes"),
    ] {
        let mut columns = vec![("Name", false)];
        columns.extend(diff.labels.iter().map(|l| (l.as_str(), false)));
        let mut text = TextTable::new(&columns);
        for row in diff.group(group) {
            let mut cells = vec![row.display_name.clone()];
            cells.extend(row.values.iter().map(|v| v.clone().unwrap_or_default()));
            text.push(cells);
        }
        out.push_str(&format!("=== {} ===\n{}", title, text.render()));
    }
    out
}
