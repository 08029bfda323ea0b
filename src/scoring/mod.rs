// Regression scoring for benchmark histories
//
// Stages, each a pure transform over the previous stage's output:
// - reducer: repeated runs of a set → one median set record
// - window: eligibility filter and per-benchmark history windows
// - scorer: variability, change, z-score and probability of the current set
// - ranker: worst/best tables in full and condensed widths
// - compare: side-by-side comparison of labeled datasets
//
// Statistics are fractions throughout; percentage display is done by the
// report layer.

mod compare;
mod config;
mod ranker;
mod reducer;
pub mod statistics;
mod scorer;
mod window;

pub use compare::{
    common_prefix, compare, datasets_by_set, normalize_name, set_label, ColumnNamer,
    ComparisonCell, ComparisonRow, ComparisonTable, DatasetRow, LabeledDataset, SetOrder,
};
pub use config::{BaselinePolicy, ScoreConfig};
pub use ranker::{
    display_name, rank, truncate_name, CondensedRow, RankOrder, RankedRow, RankedTable,
};
pub use reducer::{mid_index, reduce_set, reduce_sets};
pub use scorer::{
    rolling_changes, score_window, score_windows, trend_summaries, RateChange, Score,
    ScoredSample, TrendSummary,
};
pub use window::{filter_eligible, rates_of, Exclusions, HistoryWindow, WindowBuilder};
