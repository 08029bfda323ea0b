//! benchscore - regression scoring for continuously run benchmark suites
//!
//! Repeated runs of each benchmark set are reduced to a median record, laid
//! out as per-benchmark histories, and the latest set is scored against its
//! baseline (variability, change, z-score, two-tailed probability). Scores are
//! ranked into worst/best tables, and independent sets can be compared side by
//! side.

pub mod cli;
pub mod csv_output;
pub mod error;
pub mod json_output;
pub mod pipeline;
pub mod properties;
pub mod record;
pub mod report;
pub mod scoring;
pub mod storage;

pub use error::{Result, ScoreError};
pub use pipeline::{Analysis, Pipeline};
pub use record::{MetricRecord, PlatformRecord, Sample, SetRecord};
