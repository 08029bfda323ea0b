//! JSON output format for analysis reports
//!
//! Statistics are serialized as fractions; comparison `change` values are
//! percent.

use crate::properties::PlatformDiff;
use crate::record::SetRecord;
use crate::scoring::{ComparisonTable, Exclusions, RankedTable, RateChange, TrendSummary};
use serde::Serialize;

/// A (benchmark, origin) history left out of scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonSeries {
    pub benchmark: String,
    pub origin: String,
}

/// Eligibility decisions of an analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonExclusions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_set: Option<String>,
    pub obsolete: Vec<JsonSeries>,
    pub new: Vec<JsonSeries>,
}

impl From<&Exclusions> for JsonExclusions {
    fn from(exclusions: &Exclusions) -> Self {
        let series = |pairs: &[(String, String)]| {
            pairs
                .iter()
                .map(|(benchmark, origin)| JsonSeries {
                    benchmark: benchmark.clone(),
                    origin: origin.clone(),
                })
                .collect::<Vec<_>>()
        };
        Self {
            latest_set: exclusions.latest_set.clone(),
            obsolete: series(&exclusions.obsolete),
            new: series(&exclusions.new),
        }
    }
}

/// Comparison table with its derived column names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonComparison {
    pub columns: Vec<String>,
    #[serde(flatten)]
    pub table: ComparisonTable,
}

/// Root JSON output structure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Report kind (ranking, trends, changes, compare, platform)
    pub report: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusions: Option<JsonExclusions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<RankedTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<Vec<TrendSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<RateChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<JsonComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_diff: Option<PlatformDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<SetRecord>>,
}

impl JsonOutput {
    /// Create an empty output for `report`
    pub fn new(report: impl Into<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "benchscore-json-v1".to_string(),
            report: report.into(),
            exclusions: None,
            ranking: None,
            trends: None,
            changes: None,
            comparison: None,
            platform_diff: None,
            records: None,
        }
    }

    pub fn with_ranking(mut self, ranking: RankedTable, exclusions: &Exclusions) -> Self {
        self.ranking = Some(ranking);
        self.exclusions = Some(exclusions.into());
        self
    }

    pub fn with_trends(mut self, trends: Vec<TrendSummary>) -> Self {
        self.trends = Some(trends);
        self
    }

    pub fn with_changes(mut self, changes: Vec<RateChange>) -> Self {
        self.changes = Some(changes);
        self
    }

    pub fn with_comparison(mut self, table: ComparisonTable) -> Self {
        self.comparison = Some(JsonComparison {
            columns: table.column_names(),
            table,
        });
        self
    }

    pub fn with_platform_diff(mut self, diff: PlatformDiff) -> Self {
        self.platform_diff = Some(diff);
        self
    }

    pub fn with_records(mut self, records: Vec<SetRecord>) -> Self {
        self.records = Some(records);
        self
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
