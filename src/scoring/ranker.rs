// Ranking of scored samples into worst/best tables
//
// Ranking only orders and truncates. Eligibility (obsolete/new benchmarks)
// has already been decided by the window filter; here only the probability
// cutoff can drop a sample.

use crate::scoring::config::ScoreConfig;
use crate::scoring::scorer::ScoredSample;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which end of the score distribution to surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RankOrder {
    /// Most negative scores first (regressions)
    Worst,
    /// Most positive scores first (improvements)
    Best,
}

/// Full-precision ranked row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub benchmark: String,
    pub origin: String,
    pub set_id: String,
    pub variability: f64,
    pub rate: i64,
    pub change: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_change: Option<f64>,
    pub score: f64,
    pub probability: f64,
}

/// Compact ranked row for narrow displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CondensedRow {
    /// Benchmark name truncated to `name_truncate_length`
    pub benchmark: String,
    pub change: f64,
    pub variability: f64,
    pub rate: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_change: Option<f64>,
    pub probability: f64,
}

/// Ranked output in both widths
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTable {
    pub order: RankOrder,
    pub large: Vec<RankedRow>,
    pub condensed: Vec<CondensedRow>,
}

/// Truncate `text` to at most `width` characters, ending with "..." when cut
///
/// # Example
/// ```
/// use benchscore::scoring::truncate_name;
///
/// assert_eq!(truncate_name("Where- 2 Filters", 50), "Where- 2 Filters");
/// assert_eq!(truncate_name("RollingGroupTick- 3 Ops", 10), "Rolling...");
/// ```
pub fn truncate_name(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let mut truncated: String = text.chars().take(width - 3).collect();
    truncated.push_str("...");
    truncated
}

/// Benchmark name as displayed, without the configured suffix
pub fn display_name(name: &str, strip_suffix: Option<&str>) -> String {
    match strip_suffix {
        Some(suffix) if !suffix.is_empty() => name.strip_suffix(suffix).unwrap_or(name).to_string(),
        _ => name.to_string(),
    }
}

fn compare_scores(a: &ScoredSample, b: &ScoredSample, order: RankOrder) -> Ordering {
    let by_score = match order {
        RankOrder::Worst => a.score.zscore.total_cmp(&b.score.zscore),
        RankOrder::Best => b.score.zscore.total_cmp(&a.score.zscore),
    };
    by_score
        .then_with(|| a.score.probability.total_cmp(&b.score.probability))
        .then_with(|| a.benchmark_name.cmp(&b.benchmark_name))
        .then_with(|| a.origin.cmp(&b.origin))
}

/// Rank scored samples and truncate to the configured table sizes
pub fn rank(scored: &[ScoredSample], order: RankOrder, config: &ScoreConfig) -> RankedTable {
    let mut candidates: Vec<&ScoredSample> = scored
        .iter()
        .filter(|s| {
            !config.apply_probability_cutoff || s.score.probability <= config.probability_cutoff
        })
        .collect();
    candidates.sort_by(|a, b| compare_scores(a, b, order));

    tracing::debug!(
        "Ranking {:?}: {} of {} scored samples pass the probability cutoff",
        order,
        candidates.len(),
        scored.len()
    );

    let strip = config.strip_suffix.as_deref();
    let large = candidates
        .iter()
        .take(config.top_k)
        .map(|s| RankedRow {
            benchmark: display_name(&s.benchmark_name, strip),
            origin: s.origin.clone(),
            set_id: s.set_id.clone(),
            variability: s.score.variability,
            rate: s.op_rate,
            change: s.score.change,
            release_change: s.release_change,
            score: s.score.zscore,
            probability: s.score.probability,
        })
        .collect();

    let condensed = candidates
        .iter()
        .take(config.condensed_top_k)
        .map(|s| CondensedRow {
            benchmark: truncate_name(
                &display_name(&s.benchmark_name, strip),
                config.name_truncate_length,
            ),
            change: s.score.change,
            variability: s.score.variability,
            rate: s.op_rate,
            release_change: s.release_change,
            probability: s.score.probability,
        })
        .collect();

    RankedTable {
        order,
        large,
        condensed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::scorer::Score;

    fn scored(name: &str, zscore: f64) -> ScoredSample {
        ScoredSample {
            benchmark_name: name.to_string(),
            origin: "deephaven-engine".to_string(),
            set_id: "2024-01-05".to_string(),
            label: None,
            op_rate: 1000,
            op_duration: 1.0,
            baseline_rates: vec![900, 1100],
            score: Score {
                variability: 0.1,
                change: zscore / 10.0,
                zscore,
                probability: crate::scoring::statistics::probability(zscore),
            },
            release_change: None,
        }
    }

    fn sample_set() -> Vec<ScoredSample> {
        vec![
            scored("Sort- 2 Cols -Static", -4.0),
            scored("Where- 2 Filters -Static", 0.5),
            scored("Join- 1 Match -Static", -2.0),
            scored("AvgBy- 2 Groups -Static", 3.0),
            scored("CumSum- 1 Group -Static", -1.0),
        ]
    }

    #[test]
    fn test_worst_sorted_ascending_and_filtered() {
        let table = rank(&sample_set(), RankOrder::Worst, &ScoreConfig::default());
        let names: Vec<&str> = table.large.iter().map(|r| r.benchmark.as_str()).collect();
        // |z| < 1.645 has probability > 0.10
        assert_eq!(
            names,
            vec![
                "Sort- 2 Cols -Static",
                "Join- 1 Match -Static",
                "AvgBy- 2 Groups -Static"
            ]
        );
    }

    #[test]
    fn test_best_sorted_descending() {
        let table = rank(&sample_set(), RankOrder::Best, &ScoreConfig::default());
        assert_eq!(table.large[0].benchmark, "AvgBy- 2 Groups -Static");
        assert_eq!(table.large.last().unwrap().benchmark, "Sort- 2 Cols -Static");
    }

    #[test]
    fn test_cutoff_can_be_disabled() {
        let config = ScoreConfig {
            apply_probability_cutoff: false,
            ..ScoreConfig::default()
        };
        let table = rank(&sample_set(), RankOrder::Worst, &config);
        assert_eq!(table.large.len(), 5);
        assert_eq!(table.large[2].benchmark, "CumSum- 1 Group -Static");
    }

    #[test]
    fn test_top_k_truncation() {
        let config = ScoreConfig {
            apply_probability_cutoff: false,
            top_k: 3,
            condensed_top_k: 2,
            ..ScoreConfig::default()
        };
        let table = rank(&sample_set(), RankOrder::Worst, &config);
        assert_eq!(table.large.len(), 3);
        assert_eq!(table.condensed.len(), 2);
    }

    #[test]
    fn test_condensed_names_truncated_and_stripped() {
        let config = ScoreConfig {
            name_truncate_length: 10,
            strip_suffix: Some(" -Static".to_string()),
            ..ScoreConfig::default()
        };
        let table = rank(&sample_set(), RankOrder::Worst, &config);
        assert_eq!(table.large[0].benchmark, "Sort- 2 Cols");
        assert_eq!(table.condensed[0].benchmark, "Sort- 2...");
        assert_eq!(table.condensed[0].benchmark.chars().count(), 10);
    }

    #[test]
    fn test_truncate_name_edges() {
        assert_eq!(truncate_name("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_name("eleven chars", 11), "eleven c...");
        assert_eq!(truncate_name("ÄÖÜäöüß", 5), "ÄÖ...");
        assert_eq!(truncate_name("abcdef", 2), "ab");
    }

    #[test]
    fn test_display_name_keeps_unsuffixed() {
        assert_eq!(display_name("Where- 2 Filters", Some(" -Static")), "Where- 2 Filters");
        assert_eq!(display_name("Where- 2 Filters -Static", None), "Where- 2 Filters -Static");
    }

    #[test]
    fn test_ties_broken_by_name() {
        let scored = vec![scored("b", -3.0), scored("a", -3.0)];
        let table = rank(&scored, RankOrder::Worst, &ScoreConfig::default());
        assert_eq!(table.large[0].benchmark, "a");
    }
}
