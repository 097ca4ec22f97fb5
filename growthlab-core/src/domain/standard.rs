use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Published growth reference a table set comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthStandard {
    /// WHO Child Growth Standards (3/15/50/85/97).
    #[default]
    #[serde(alias = "oms")]
    Who,
    /// CDC growth charts (3/50/97).
    Cdc,
}

impl GrowthStandard {
    pub fn as_str(self) -> &'static str {
        match self {
            GrowthStandard::Who => "who",
            GrowthStandard::Cdc => "cdc",
        }
    }
}

impl fmt::Display for GrowthStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GrowthStandard::Who => "WHO",
            GrowthStandard::Cdc => "CDC",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown growth standard '{0}' (expected who or cdc)")]
pub struct StandardParseError(pub String);

impl FromStr for GrowthStandard {
    type Err = StandardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "who" | "oms" => Ok(GrowthStandard::Who),
            "cdc" => Ok(GrowthStandard::Cdc),
            other => Err(StandardParseError(other.to_string())),
        }
    }
}
