use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::Measurement;

/// A measured growth quantity. Each metric has its own reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Body weight in kilograms.
    Weight,
    /// Length/height in centimetres.
    Height,
    /// Head circumference in centimetres.
    Head,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Weight, Metric::Height, Metric::Head];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Weight => "weight",
            Metric::Height => "height",
            Metric::Head => "head",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Weight => "kg",
            Metric::Height | Metric::Head => "cm",
        }
    }

    /// The value a measurement carries for this metric, if any.
    pub fn value_of(self, measurement: &Measurement) -> Option<f64> {
        match self {
            Metric::Weight => measurement.weight,
            Metric::Height => measurement.height,
            Metric::Head => measurement.head,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric '{0}' (expected weight, height or head)")]
pub struct MetricParseError(pub String);

impl FromStr for Metric {
    type Err = MetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weight" | "poids" => Ok(Metric::Weight),
            "height" | "length" | "taille" => Ok(Metric::Height),
            "head" | "head_circumference" => Ok(Metric::Head),
            other => Err(MetricParseError(other.to_string())),
        }
    }
}
