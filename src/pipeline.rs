// Scoring pipeline over one immutable snapshot of benchmark data
//
// Stages run in a fixed order and hand owned collections to the next stage:
//   samples → (benchmark filter) → set records → labels → eligibility
//           → history windows → scores → worst/best tables
//
// The configuration is validated once in `Pipeline::new`; nothing downstream
// re-checks it.

use crate::error::Result;
use crate::properties::{attach_labels, attach_metric_values, attach_platform_values};
use crate::record::{MetricRecord, PlatformRecord, Sample, SetRecord};
use crate::scoring::{
    compare, datasets_by_set, filter_eligible, rank, reduce_sets, rolling_changes, score_windows,
    trend_summaries, ComparisonTable, Exclusions, HistoryWindow, RankOrder, RankedTable,
    RateChange, ScoreConfig, ScoredSample, SetOrder, TrendSummary, WindowBuilder,
};
use regex::Regex;

/// Output of one analysis run
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Set records after filtering and labeling, before eligibility
    pub set_records: Vec<SetRecord>,
    pub exclusions: Exclusions,
    pub scored: Vec<ScoredSample>,
    pub worst: RankedTable,
    pub best: RankedTable,
}

/// Validated configuration plus the stages that use it
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ScoreConfig,
    matcher: Option<Regex>,
}

impl Pipeline {
    /// Validate `config` and build a pipeline
    ///
    /// # Errors
    /// Returns `ScoreError::InvalidConfig` or `ScoreError::InvalidFilter`.
    pub fn new(config: ScoreConfig) -> Result<Self> {
        config.validate()?;
        let matcher = config.benchmark_matcher()?;
        Ok(Self { config, matcher })
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    fn selected(&self, samples: &[Sample]) -> Vec<Sample> {
        match &self.matcher {
            Some(matcher) => samples
                .iter()
                .filter(|s| matcher.is_match(&s.benchmark_name))
                .cloned()
                .collect(),
            None => samples.to_vec(),
        }
    }

    /// Filtered, reduced and labeled set records
    pub fn set_records(
        &self,
        samples: &[Sample],
        platforms: &[PlatformRecord],
    ) -> Result<Vec<SetRecord>> {
        let selected = self.selected(samples);
        if selected.len() < samples.len() {
            tracing::debug!(
                "Benchmark filter kept {} of {} samples",
                selected.len(),
                samples.len()
            );
        }
        let records = reduce_sets(&selected)?;
        Ok(attach_labels(records, platforms, &self.config.label_property))
    }

    /// Set records with the configured platform and metric properties attached
    pub fn annotated_records(
        &self,
        samples: &[Sample],
        platforms: &[PlatformRecord],
        metrics: &[MetricRecord],
    ) -> Result<Vec<SetRecord>> {
        let platform_names: Vec<&str> = self
            .config
            .platform_properties
            .iter()
            .map(String::as_str)
            .collect();
        let metric_names: Vec<&str> = self
            .config
            .metric_properties
            .iter()
            .map(String::as_str)
            .collect();
        let records = self.set_records(samples, platforms)?;
        let records = attach_platform_values(records, platforms, &platform_names);
        Ok(attach_metric_values(records, metrics, &metric_names))
    }

    fn window_builder(&self, records: &[SetRecord]) -> WindowBuilder {
        let builder = WindowBuilder::new(self.config.history_runs, self.config.baseline);
        // Release change may reach past the exclusive window
        if records.iter().any(|r| r.label.is_some()) {
            builder.unbounded()
        } else {
            builder
        }
    }

    /// Windows of every history, eligible or not, with complete history
    pub fn all_windows(&self, records: Vec<SetRecord>) -> Result<Vec<HistoryWindow>> {
        WindowBuilder::new(self.config.history_runs, self.config.baseline)
            .unbounded()
            .build(records)
    }

    /// Score and rank the most recent set of every eligible history
    pub fn analyze(&self, samples: &[Sample], platforms: &[PlatformRecord]) -> Result<Analysis> {
        let set_records = self.set_records(samples, platforms)?;
        let (eligible, exclusions) = filter_eligible(set_records.clone());
        let windows = self.window_builder(&eligible).build(eligible)?;
        let scored = score_windows(&windows, &self.config);

        let worst = rank(&scored, RankOrder::Worst, &self.config);
        let best = rank(&scored, RankOrder::Best, &self.config);
        tracing::info!(
            "Scored {} benchmarks: {} worst, {} best ranked",
            scored.len(),
            worst.large.len(),
            best.large.len()
        );

        Ok(Analysis {
            set_records,
            exclusions,
            scored,
            worst,
            best,
        })
    }

    /// Trend summaries over the complete history of every benchmark
    pub fn trends(
        &self,
        samples: &[Sample],
        platforms: &[PlatformRecord],
    ) -> Result<Vec<TrendSummary>> {
        let windows = self.all_windows(self.set_records(samples, platforms)?)?;
        Ok(trend_summaries(&windows, &self.config))
    }

    /// Rolling variability and sequential change for every set of every history
    pub fn changes(
        &self,
        samples: &[Sample],
        platforms: &[PlatformRecord],
    ) -> Result<Vec<RateChange>> {
        let windows = self.all_windows(self.set_records(samples, platforms)?)?;
        Ok(windows
            .iter()
            .flat_map(|w| rolling_changes(w, self.config.history_runs))
            .collect())
    }

    /// Side-by-side comparison of every set in the input, for the configured origin
    pub fn compare_sets(&self, samples: &[Sample], order: SetOrder) -> Result<ComparisonTable> {
        let records: Vec<SetRecord> = reduce_sets(&self.selected(samples))?
            .into_iter()
            .filter(|r| r.origin == self.config.origin)
            .collect();
        tracing::debug!(
            "Comparing {} set records of origin '{}'",
            records.len(),
            self.config.origin
        );
        compare(&datasets_by_set(&records, order))
    }
}
