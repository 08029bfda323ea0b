//! CLI argument parsing for benchscore

use crate::scoring::{BaselinePolicy, RankOrder, ScoreConfig, SetOrder};
use crate::storage::{StorageQuery, DEFAULT_MAX_SETS};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text tables (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Which report to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Worst or best benchmarks of the latest set
    Ranking,
    /// Score history and hit counts per benchmark
    Trends,
    /// Rolling variability and rate change of every set
    Changes,
    /// Side-by-side rates of the selected sets
    Compare,
    /// Platform properties that differ between the selected sets
    Platform,
    /// Reduced set records with attached platform and metric properties
    Records,
}

impl ReportKind {
    pub fn name(self) -> &'static str {
        match self {
            ReportKind::Ranking => "ranking",
            ReportKind::Trends => "trends",
            ReportKind::Changes => "changes",
            ReportKind::Compare => "compare",
            ReportKind::Platform => "platform",
            ReportKind::Records => "records",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "benchscore")]
#[command(version)]
#[command(
    about = "Score benchmark histories and rank significant throughput regressions",
    long_about = None
)]
pub struct Cli {
    /// Storage root containing <category>/<actor>/<set>/<run> directories
    #[arg(long = "storage", value_name = "DIR")]
    pub storage: PathBuf,

    /// Benchmark category (e.g. nightly, release, compare, adhoc)
    #[arg(long = "category", value_name = "CAT", default_value = "nightly")]
    pub category: String,

    /// Actor directory filter (regex, prefix match); defaults per category
    #[arg(long = "actor", value_name = "REGEX")]
    pub actor: Option<String>,

    /// Set directory filter (regex, prefix match); defaults per category
    #[arg(long = "set", value_name = "REGEX")]
    pub set: Option<String>,

    /// Maximum number of sets loaded, newest first
    #[arg(long = "max-sets", value_name = "N", default_value_t = DEFAULT_MAX_SETS)]
    pub max_sets: usize,

    /// Scoring configuration file (TOML)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of prior sets forming the baseline
    #[arg(long = "history-runs", value_name = "N")]
    pub history_runs: Option<usize>,

    /// Baseline selection policy
    #[arg(long = "baseline", value_enum)]
    pub baseline: Option<BaselinePolicy>,

    /// Rows in the ranked table
    #[arg(long = "top-k", value_name = "N")]
    pub top_k: Option<usize>,

    /// Maximum probability for a benchmark to be ranked
    #[arg(long = "probability-cutoff", value_name = "P")]
    pub probability_cutoff: Option<f64>,

    /// Absolute z-score counted as a hit in trend summaries
    #[arg(long = "score-threshold", value_name = "SIGMA")]
    pub score_threshold: Option<f64>,

    /// Origin compared and diffed by the compare and platform reports
    #[arg(long = "origin", value_name = "NAME")]
    pub origin: Option<String>,

    /// Only score benchmarks whose name matches (regex)
    #[arg(long = "filter", value_name = "REGEX", allow_hyphen_values = true)]
    pub filter: Option<String>,

    /// Platform property shown in the records report (repeatable)
    #[arg(long = "platform-prop", value_name = "NAME")]
    pub platform_props: Vec<String>,

    /// Metric shown in the records report (repeatable)
    #[arg(long = "metric-prop", value_name = "NAME")]
    pub metric_props: Vec<String>,

    /// Report to produce
    #[arg(long = "report", value_enum, default_value = "ranking")]
    pub report: ReportKind,

    /// Ranking order
    #[arg(long = "order", value_enum, default_value = "worst")]
    pub order: RankOrder,

    /// Order of the compared sets; the first set is the reference
    #[arg(long = "set-order", value_enum, default_value = "oldest-first")]
    pub set_order: SetOrder,

    /// Show the condensed ranking (truncated names, fewer columns)
    #[arg(long = "condensed")]
    pub condensed: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Storage selection from the command line
    pub fn storage_query(&self) -> StorageQuery {
        let mut query =
            StorageQuery::new(&self.storage, self.category.as_str()).with_max_sets(self.max_sets);
        if let Some(actor) = &self.actor {
            query = query.with_actor_filter(actor.as_str());
        }
        if let Some(set) = &self.set {
            query = query.with_set_filter(set.as_str());
        }
        query
    }

    /// Command-line values take precedence over the configuration file
    pub fn apply_overrides(&self, mut config: ScoreConfig) -> ScoreConfig {
        if let Some(n) = self.history_runs {
            config.history_runs = n;
        }
        if let Some(baseline) = self.baseline {
            config.baseline = baseline;
        }
        if let Some(k) = self.top_k {
            config.top_k = k;
        }
        if let Some(p) = self.probability_cutoff {
            config.probability_cutoff = p;
        }
        if let Some(s) = self.score_threshold {
            config.score_threshold = s;
        }
        if let Some(origin) = &self.origin {
            config.origin = origin.clone();
        }
        if let Some(filter) = &self.filter {
            config.benchmark_filter = Some(filter.clone());
        }
        if !self.platform_props.is_empty() {
            config.platform_properties = self.platform_props.clone();
        }
        if !self.metric_props.is_empty() {
            config.metric_properties = self.metric_props.clone();
        }
        config
    }
}
