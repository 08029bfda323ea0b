// Set reduction: collapse the repeated runs of a set into its median run
//
// The median is positional. Runs are sorted by rate and the run at index
// `len / 2` is kept whole, so for an even number of runs the upper-middle run
// is chosen instead of averaging two runs into a record that never happened.

use crate::error::{Result, ScoreError};
use crate::record::{Sample, SetRecord};
use crate::scoring::statistics::{as_f64, variability};
use std::collections::BTreeMap;

/// Index of the representative element of an ascending run list
pub fn mid_index(len: usize) -> usize {
    len / 2
}

/// Build the set record for the runs of one (benchmark, origin, set)
///
/// # Errors
/// Returns `ScoreError::EmptySet` when `runs` is empty.
pub fn reduce_set(runs: &[&Sample]) -> Result<SetRecord> {
    let Some(first) = runs.first() else {
        return Err(ScoreError::EmptySet);
    };

    let mut sorted: Vec<&Sample> = runs.to_vec();
    // Stable sort keeps input order among equal rates
    sorted.sort_by_key(|s| s.op_rate);

    let median = sorted[mid_index(sorted.len())];
    let set_op_rates: Vec<i64> = sorted.iter().map(|s| s.op_rate).collect();
    let variability = variability(&as_f64(&set_op_rates));

    Ok(SetRecord {
        benchmark_name: first.benchmark_name.clone(),
        origin: first.origin.clone(),
        set_id: first.set_id.clone(),
        run_id: median.run_id.clone(),
        timestamp: median.timestamp,
        test_duration: median.test_duration,
        op_duration: median.op_duration,
        op_rate: median.op_rate,
        row_count: median.row_count,
        set_op_rates,
        variability,
        label: None,
        platform: BTreeMap::new(),
        metrics: BTreeMap::new(),
    })
}

/// Reduce all samples to one set record per (benchmark, origin, set)
///
/// Output is ordered by benchmark name, origin, then set id.
pub fn reduce_sets(samples: &[Sample]) -> Result<Vec<SetRecord>> {
    let mut groups: BTreeMap<(&str, &str, &str), Vec<&Sample>> = BTreeMap::new();
    for sample in samples {
        groups
            .entry((
                sample.benchmark_name.as_str(),
                sample.origin.as_str(),
                sample.set_id.as_str(),
            ))
            .or_default()
            .push(sample);
    }

    let records = groups
        .values()
        .map(|runs| reduce_set(runs))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        "Reduced {} samples to {} set records",
        samples.len(),
        records.len()
    );
    Ok(records)
}
