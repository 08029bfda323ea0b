// Configuration for benchmark regression scoring
//
// Two cutoffs coexist and are tuned independently: the absolute z-score used
// for trend hit counting and the probability used for ranking eligibility.

use crate::error::{Result, ScoreError};
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How the baseline of the current sample is selected from its history
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum BaselinePolicy {
    /// The N sets immediately preceding the current one (current excluded)
    #[default]
    Exclusive,
    /// Up to N sets carrying the previous distinct label (version), falling
    /// back to the most recent N sets of the current label (current included)
    PreviousLabel,
}

/// Configuration for regression scoring
///
/// # Example
/// ```
/// use benchscore::scoring::ScoreConfig;
///
/// let config = ScoreConfig::default();
/// assert_eq!(config.history_runs, 5);
/// assert_eq!(config.probability_cutoff, 0.10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Number of prior sets forming the baseline (N)
    pub history_runs: usize,

    /// Baseline selection for the primary score
    pub baseline: BaselinePolicy,

    /// Absolute z-score at or above which a sample counts as a hit
    ///
    /// Default: 10.0. Only used for trend summaries.
    pub score_threshold: f64,

    /// Maximum probability for a sample to be ranked
    ///
    /// Probability is two-tailed: lower means the deviation is less likely
    /// to be run-to-run noise. Default: 0.10
    pub probability_cutoff: f64,

    /// Apply the probability cutoff; when false every scored sample is ranked
    pub apply_probability_cutoff: bool,

    /// Rows in the large ranked table
    pub top_k: usize,

    /// Rows in the condensed ranked table
    pub condensed_top_k: usize,

    /// Width benchmark names are truncated to in the condensed table
    pub name_truncate_length: usize,

    /// Minimum number of prior sets before a trend score is computed
    pub trend_min_baseline: usize,

    /// Platform property carrying the version label of a set
    pub label_property: String,

    /// Origin whose sets are compared and whose platform properties are diffed
    pub origin: String,

    /// Only benchmarks whose name matches are scored
    pub benchmark_filter: Option<String>,

    /// Suffix removed from benchmark names in ranked output (e.g. " -Static")
    pub strip_suffix: Option<String>,

    /// Platform properties attached to set records in the records report
    pub platform_properties: Vec<String>,

    /// Metrics attached to set records in the records report
    pub metric_properties: Vec<String>,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            history_runs: 5,
            baseline: BaselinePolicy::Exclusive,
            score_threshold: 10.0,
            probability_cutoff: 0.10,
            apply_probability_cutoff: true,
            top_k: 20,
            condensed_top_k: 10,
            name_truncate_length: 50,
            trend_min_baseline: 3,
            label_property: "deephaven.version".to_string(),
            origin: "deephaven-engine".to_string(),
            benchmark_filter: None,
            strip_suffix: None,
            platform_properties: Vec::new(),
            metric_properties: Vec::new(),
        }
    }
}

impl ScoreConfig {
    /// Load a configuration from a TOML file
    ///
    /// Missing keys take their default values.
    ///
    /// # Example TOML
    /// ```toml
    /// history_runs = 5
    /// baseline = "previous-label"
    /// probability_cutoff = 0.05
    /// benchmark_filter = "-Static$"
    /// strip_suffix = " -Static"
    /// ```
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read score config: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse TOML score config")
    }

    /// Compile the benchmark filter, if any
    pub fn benchmark_matcher(&self) -> Result<Option<Regex>> {
        self.benchmark_filter
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(ScoreError::from)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.history_runs < 1 {
            return Err(ScoreError::InvalidConfig(format!(
                "history_runs must be >= 1, got {}",
                self.history_runs
            )));
        }

        if !(0.0..=1.0).contains(&self.probability_cutoff) {
            return Err(ScoreError::InvalidConfig(format!(
                "probability_cutoff must be in [0, 1], got {}",
                self.probability_cutoff
            )));
        }

        if !self.score_threshold.is_finite() || self.score_threshold < 0.0 {
            return Err(ScoreError::InvalidConfig(format!(
                "score_threshold must be finite and non-negative, got {}",
                self.score_threshold
            )));
        }

        if self.top_k < 1 || self.condensed_top_k < 1 {
            return Err(ScoreError::InvalidConfig(format!(
                "top_k and condensed_top_k must be >= 1, got {} and {}",
                self.top_k, self.condensed_top_k
            )));
        }

        if self.name_truncate_length < 4 {
            return Err(ScoreError::InvalidConfig(format!(
                "name_truncate_length must be >= 4, got {}",
                self.name_truncate_length
            )));
        }

        if self.trend_min_baseline < 2 {
            return Err(ScoreError::InvalidConfig(format!(
                "trend_min_baseline must be >= 2, got {}",
                self.trend_min_baseline
            )));
        }

        if self.origin.is_empty() {
            return Err(ScoreError::InvalidConfig(
                "origin must not be empty".to_string(),
            ));
        }

        self.benchmark_matcher()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScoreConfig::default();
        assert_eq!(config.history_runs, 5);
        assert_eq!(config.baseline, BaselinePolicy::Exclusive);
        assert_eq!(config.score_threshold, 10.0);
        assert_eq!(config.probability_cutoff, 0.10);
        assert_eq!(config.top_k, 20);
        assert_eq!(config.condensed_top_k, 10);
        assert_eq!(config.name_truncate_length, 50);
        assert!(config.apply_probability_cutoff);
        assert_eq!(config.origin, "deephaven-engine");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_thresholds_are_independent() {
        let config = ScoreConfig {
            score_threshold: 3.0,
            ..ScoreConfig::default()
        };
        assert_eq!(config.probability_cutoff, 0.10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ScoreConfig::from_toml_str(
            r#"
            history_runs = 8
            baseline = "previous-label"
            strip_suffix = " -Static"
            "#,
        )
        .unwrap();
        assert_eq!(config.history_runs, 8);
        assert_eq!(config.baseline, BaselinePolicy::PreviousLabel);
        assert_eq!(config.strip_suffix.as_deref(), Some(" -Static"));
        assert_eq!(config.top_k, 20);
    }

    #[test]
    fn test_from_toml_property_lists() {
        let config = ScoreConfig::from_toml_str(
            r#"
            platform_properties = ["python.version", "deephaven.version"]
            metric_properties = ["jvm.heap.used"]
            "#,
        )
        .unwrap();
        assert_eq!(config.platform_properties.len(), 2);
        assert_eq!(config.metric_properties, vec!["jvm.heap.used"]);
        assert!(ScoreConfig::default().platform_properties.is_empty());
    }

    #[test]
    fn test_from_toml_rejects_unknown_policy() {
        assert!(ScoreConfig::from_toml_str("baseline = \"median\"").is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_history_runs() {
        let mut config = ScoreConfig::default();
        config.history_runs = 0;
        assert!(matches!(config.validate(), Err(ScoreError::InvalidConfig(_))));
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_probability_cutoff() {
        let mut config = ScoreConfig::default();
        config.probability_cutoff = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_score_threshold() {
        let mut config = ScoreConfig::default();
        config.score_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_empty_origin_rejected() {
        let mut config = ScoreConfig::default();
        config.origin = String::new();
        assert!(matches!(config.validate(), Err(ScoreError::InvalidConfig(_))));
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_truncate_length() {
        let mut config = ScoreConfig::default();
        config.name_truncate_length = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_benchmark_filter() {
        let mut config = ScoreConfig::default();
        config.benchmark_filter = Some("(unclosed".to_string());
        assert!(matches!(config.validate(), Err(ScoreError::InvalidFilter(_))));
    }
}
