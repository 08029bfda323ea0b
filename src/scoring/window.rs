// History windows: per (benchmark, origin) sequences of set records
//
// Records are ordered by set id ascending, so the last record is the current
// sample and everything before it is candidate baseline. Set ids are expected
// to sort chronologically (dates or zero-padded versions).

use crate::error::{Result, ScoreError};
use crate::record::SetRecord;
use crate::scoring::config::BaselinePolicy;
use crate::scoring::statistics::as_f64;
use std::collections::{BTreeMap, BTreeSet};

/// Why a benchmark history was left out of scoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    /// Most recent set id seen in the input
    pub latest_set: Option<String>,
    /// (benchmark, origin) pairs missing from the latest set
    pub obsolete: Vec<(String, String)>,
    /// (benchmark, origin) pairs with fewer than two sets
    pub new: Vec<(String, String)>,
}

/// Drop histories that cannot or should not be scored
///
/// A pair is obsolete when it has no record in the most recent set, and new
/// when it has fewer than two records overall. Obsolete takes precedence.
pub fn filter_eligible(records: Vec<SetRecord>) -> (Vec<SetRecord>, Exclusions) {
    let latest_set = records.iter().map(|r| r.set_id.clone()).max();

    let mut counts: BTreeMap<(String, String), (usize, bool)> = BTreeMap::new();
    for record in &records {
        let entry = counts
            .entry((record.benchmark_name.clone(), record.origin.clone()))
            .or_insert((0, false));
        entry.0 += 1;
        entry.1 |= Some(&record.set_id) == latest_set.as_ref();
    }

    let mut exclusions = Exclusions {
        latest_set,
        ..Exclusions::default()
    };
    let mut excluded = BTreeSet::new();
    for (key, (count, in_latest)) in counts {
        if !in_latest {
            exclusions.obsolete.push(key.clone());
            excluded.insert(key);
        } else if count < 2 {
            exclusions.new.push(key.clone());
            excluded.insert(key);
        }
    }

    let eligible: Vec<SetRecord> = records
        .into_iter()
        .filter(|r| !excluded.contains(&(r.benchmark_name.clone(), r.origin.clone())))
        .collect();

    tracing::debug!(
        "Eligible set records: {} (obsolete pairs: {}, new pairs: {})",
        eligible.len(),
        exclusions.obsolete.len(),
        exclusions.new.len()
    );
    (eligible, exclusions)
}

/// Ordered set records of one (benchmark, origin)
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryWindow {
    benchmark_name: String,
    origin: String,
    prior: Vec<SetRecord>,
    current: SetRecord,
}

impl HistoryWindow {
    pub fn benchmark_name(&self) -> &str {
        &self.benchmark_name
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The most recent record
    pub fn current(&self) -> &SetRecord {
        &self.current
    }

    /// Records older than the current one, ascending
    pub fn prior(&self) -> &[SetRecord] {
        &self.prior
    }

    /// Number of records, current included
    pub fn len(&self) -> usize {
        self.prior.len() + 1
    }

    /// A window always holds its current record
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All records ascending, current last
    pub fn records(&self) -> impl Iterator<Item = &SetRecord> {
        self.prior.iter().chain(std::iter::once(&self.current))
    }

    /// Whether a baseline can be formed (at least two records)
    pub fn is_scorable(&self) -> bool {
        !self.prior.is_empty()
    }

    /// Baseline records for the current sample under `policy`, ascending
    ///
    /// Fewer than `n` candidates means all candidates are used. A baseline
    /// always contains a prior record; when none qualifies it is empty.
    pub fn baseline(&self, policy: BaselinePolicy, n: usize) -> Vec<&SetRecord> {
        match policy {
            BaselinePolicy::Exclusive => {
                let start = self.prior.len().saturating_sub(n);
                self.prior[start..].iter().collect()
            }
            BaselinePolicy::PreviousLabel => self.previous_label_baseline(n),
        }
    }

    fn previous_label_baseline(&self, n: usize) -> Vec<&SetRecord> {
        let current_label = &self.current.label;
        let previous_label = current_label.as_ref().and_then(|current| {
            self.prior
                .iter()
                .rev()
                .filter_map(|r| r.label.as_ref())
                .find(|label| *label != current)
        });

        let wanted = match previous_label {
            Some(label) => Some(label),
            None => current_label.as_ref(),
        };
        let pool: Vec<&SetRecord> = if previous_label.is_some() {
            self.prior.iter().collect()
        } else {
            self.records().collect()
        };

        let mut selected: Vec<&SetRecord> = pool
            .into_iter()
            .rev()
            .filter(|r| r.label.as_ref() == wanted)
            .take(n)
            .collect();
        // The current record alone is not a history
        if selected.len() == 1 && std::ptr::eq(selected[0], &self.current) {
            return Vec::new();
        }
        selected.reverse();
        selected
    }
}

/// Representative rates of a record list
pub fn rates_of(records: &[&SetRecord]) -> Vec<f64> {
    as_f64(&records.iter().map(|r| r.op_rate).collect::<Vec<_>>())
}

/// Groups set records into history windows
#[derive(Debug, Clone, Copy)]
pub struct WindowBuilder {
    history_runs: usize,
    bounded: bool,
}

impl WindowBuilder {
    /// Windows sized for `policy` with a baseline of `history_runs` sets
    ///
    /// Exclusive baselines keep only the last `history_runs + 1` records.
    /// Previous-label baselines may reach further back and keep everything.
    pub fn new(history_runs: usize, policy: BaselinePolicy) -> Self {
        Self {
            history_runs,
            bounded: policy == BaselinePolicy::Exclusive,
        }
    }

    /// Keep the complete history in every window
    pub fn unbounded(mut self) -> Self {
        self.bounded = false;
        self
    }

    /// Build one window per (benchmark, origin), ordered by benchmark then origin
    ///
    /// # Errors
    /// Returns `ScoreError::DuplicateSet` if a history contains a set id twice.
    pub fn build(&self, records: Vec<SetRecord>) -> Result<Vec<HistoryWindow>> {
        let mut groups: BTreeMap<(String, String), Vec<SetRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry((record.benchmark_name.clone(), record.origin.clone()))
                .or_default()
                .push(record);
        }

        let mut windows = Vec::with_capacity(groups.len());
        for ((benchmark_name, origin), mut history) in groups {
            history.sort_by(|a, b| a.set_id.cmp(&b.set_id));

            if let Some(pair) = history.windows(2).find(|w| w[0].set_id == w[1].set_id) {
                return Err(ScoreError::DuplicateSet {
                    benchmark: benchmark_name,
                    origin,
                    set_id: pair[0].set_id.clone(),
                });
            }

            if self.bounded {
                let keep = self.history_runs + 1;
                let start = history.len().saturating_sub(keep);
                history.drain(..start);
            }

            let Some(current) = history.pop() else {
                continue;
            };
            windows.push(HistoryWindow {
                benchmark_name,
                origin,
                prior: history,
                current,
            });
        }

        tracing::debug!("Built {} history windows", windows.len());
        Ok(windows)
    }
}
