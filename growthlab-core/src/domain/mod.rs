//! Domain types: metrics, growth standards, measurements.

pub mod measurement;
pub mod metric;
pub mod standard;

pub use measurement::{deserialize_iso_date, parse_iso_date, Measurement};
pub use metric::{Metric, MetricParseError};
pub use standard::{GrowthStandard, StandardParseError};

/// Percentile rank in `0..=100`.
pub type PercentileRank = u8;
