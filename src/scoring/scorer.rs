// Significance scoring of the current sample against its baseline
//
// A score bundles four fractions: baseline variability, change of the current
// rate against the baseline mean, the z-score, and the two-tailed probability
// of a deviation at least that large under a normal model.

use crate::record::SetRecord;
use crate::scoring::config::{BaselinePolicy, ScoreConfig};
use crate::scoring::statistics::{
    as_f64, change, is_hit, mean, probability, rchange, variability, zscore,
};
use crate::scoring::window::{rates_of, HistoryWindow};
use serde::Serialize;

/// Derived significance of one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    /// Coefficient of variation of the baseline
    pub variability: f64,
    /// Fractional change against the baseline mean
    pub change: f64,
    pub zscore: f64,
    /// Two-tailed probability; lower is more significant
    pub probability: f64,
}

impl Score {
    /// Score `current` against `baseline`
    ///
    /// # Example
    /// ```
    /// use benchscore::scoring::Score;
    ///
    /// let score = Score::compute(130.0, &[100.0, 110.0]);
    /// assert!((score.zscore - 5.0).abs() < 1e-9);
    /// assert!(score.probability < 1e-5);
    /// ```
    pub fn compute(current: f64, baseline: &[f64]) -> Self {
        let z = zscore(current, baseline);
        Self {
            variability: variability(baseline),
            change: change(current, baseline),
            zscore: z,
            probability: probability(z),
        }
    }
}

/// The current sample of a history window with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSample {
    pub benchmark_name: String,
    pub origin: String,
    pub set_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub op_rate: i64,
    pub op_duration: f64,
    /// Rates the score was computed against, oldest first
    pub baseline_rates: Vec<i64>,
    pub score: Score,
    /// Change against the previous label's baseline ("since release")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_change: Option<f64>,
}

/// Score the current sample of `window`
///
/// Returns `None` when the window has no baseline (fewer than two records).
pub fn score_window(window: &HistoryWindow, config: &ScoreConfig) -> Option<ScoredSample> {
    if !window.is_scorable() {
        return None;
    }

    let current = window.current();
    let baseline = window.baseline(config.baseline, config.history_runs);
    if baseline.is_empty() {
        return None;
    }
    let score = Score::compute(current.op_rate as f64, &rates_of(&baseline));

    let release_change = current.label.as_ref().and_then(|_| {
        let release = window.baseline(BaselinePolicy::PreviousLabel, config.history_runs);
        (!release.is_empty()).then(|| change(current.op_rate as f64, &rates_of(&release)))
    });

    Some(ScoredSample {
        benchmark_name: current.benchmark_name.clone(),
        origin: current.origin.clone(),
        set_id: current.set_id.clone(),
        label: current.label.clone(),
        op_rate: current.op_rate,
        op_duration: current.op_duration,
        baseline_rates: baseline.iter().map(|r| r.op_rate).collect(),
        score,
        release_change,
    })
}

/// Score every window that has a baseline
pub fn score_windows(windows: &[HistoryWindow], config: &ScoreConfig) -> Vec<ScoredSample> {
    let scored: Vec<ScoredSample> = windows
        .iter()
        .filter_map(|w| score_window(w, config))
        .collect();
    tracing::debug!("Scored {} of {} windows", scored.len(), windows.len());
    scored
}

/// Score history of one benchmark across all of its sets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub benchmark_name: String,
    pub origin: String,
    /// Number of sets that had enough history to be scored
    pub scored_sets: usize,
    pub mean_rate: f64,
    pub mean_variability: f64,
    pub score_min: f64,
    pub score_max: f64,
    pub score_mean: f64,
    /// Scored sets with `|score| >= score_threshold`
    pub hits: usize,
}

/// Score every set of every history against the sets before it
///
/// Each position needs `trend_min_baseline` prior sets and is scored against
/// at most `history_runs` of them. Windows should be built unbounded.
pub fn trend_summaries(windows: &[HistoryWindow], config: &ScoreConfig) -> Vec<TrendSummary> {
    let mut summaries = Vec::new();

    for window in windows {
        let records: Vec<&SetRecord> = window.records().collect();
        let mut rates = Vec::new();
        let mut variabilities = Vec::new();
        let mut scores = Vec::new();

        for (i, record) in records.iter().enumerate() {
            let prior = &records[..i];
            if prior.len() < config.trend_min_baseline {
                continue;
            }
            let start = prior.len().saturating_sub(config.history_runs);
            let baseline = rates_of(&prior[start..]);
            rates.push(record.op_rate as f64);
            variabilities.push(variability(&baseline));
            scores.push(zscore(record.op_rate as f64, &baseline));
        }

        if scores.is_empty() {
            continue;
        }

        summaries.push(TrendSummary {
            benchmark_name: window.benchmark_name().to_string(),
            origin: window.origin().to_string(),
            scored_sets: scores.len(),
            mean_rate: mean(&rates),
            mean_variability: mean(&variabilities),
            score_min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            score_max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            score_mean: mean(&scores),
            hits: scores
                .iter()
                .filter(|s| is_hit(**s, config.score_threshold))
                .count(),
        });
    }

    summaries
}

/// Variability and sequential change of one set over its trailing rates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateChange {
    pub benchmark_name: String,
    pub origin: String,
    pub set_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub op_rate: i64,
    /// Up to `history_runs` rates ending with this set, oldest first
    pub trailing_rates: Vec<i64>,
    pub variability: f64,
    pub change: f64,
}

/// Rolling variability and `rchange` for every set of a history
pub fn rolling_changes(window: &HistoryWindow, history_runs: usize) -> Vec<RateChange> {
    let records: Vec<&SetRecord> = window.records().collect();
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let start = (i + 1).saturating_sub(history_runs);
            let trailing_rates: Vec<i64> = records[start..=i].iter().map(|r| r.op_rate).collect();
            let values = as_f64(&trailing_rates);
            RateChange {
                benchmark_name: record.benchmark_name.clone(),
                origin: record.origin.clone(),
                set_id: record.set_id.clone(),
                label: record.label.clone(),
                op_rate: record.op_rate,
                variability: variability(&values),
                change: rchange(&values),
                trailing_rates,
            }
        })
        .collect()
}
