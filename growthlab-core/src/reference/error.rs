use std::path::PathBuf;
use thiserror::Error;

use crate::domain::PercentileRank;

/// Errors raised while building or loading reference tables.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("reference table is empty")]
    Empty,

    #[error("row {index}: invalid month {month}")]
    InvalidMonth { index: usize, month: f64 },

    #[error("row {index}: month {month} does not follow {previous} (months must strictly increase)")]
    MonthsNotIncreasing {
        index: usize,
        previous: f64,
        month: f64,
    },

    #[error("month {month}: p{rank} has non-finite value {value}")]
    InvalidValue {
        month: f64,
        rank: PercentileRank,
        value: f64,
    },

    #[error("month {month}: p{upper} is below p{lower}")]
    NotMonotonic {
        month: f64,
        lower: PercentileRank,
        upper: PercentileRank,
    },

    #[error("month {month}: at least two percentile points required, found {count}")]
    TooFewPoints { month: f64, count: usize },

    #[error("unknown column '{0}' (expected 'month' or p<rank>)")]
    UnknownColumn(String),

    #[error("percentile rank {0} is outside 0..=100")]
    RankOutOfRange(u32),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported table format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),
}
