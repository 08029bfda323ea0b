//! Error types for the scoring core
//!
//! Division by zero inside the statistics is not an error (those ratios are
//! defined as 0). Errors here are precondition violations and bad configuration.

use thiserror::Error;

/// Errors that can occur while reducing, windowing, scoring or comparing results
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid regular expression: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("Cannot reduce a set without runs")]
    EmptySet,

    #[error("Set {set_id} appears more than once in the history of {benchmark} ({origin})")]
    DuplicateSet {
        benchmark: String,
        origin: String,
        set_id: String,
    },

    #[error("Benchmark {benchmark} appears more than once in dataset {label}")]
    DuplicateBenchmark { label: String, benchmark: String },
}

/// Result type for scoring operations
pub type Result<T> = std::result::Result<T, ScoreError>;
