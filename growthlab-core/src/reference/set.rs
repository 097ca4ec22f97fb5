use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{ReferenceTable, TableError};
use crate::domain::{GrowthStandard, Metric, PercentileRank};

const WHO_GIRLS: &str = include_str!("../../data/who_girls.toml");
const CDC_GIRLS: &str = include_str!("../../data/cdc_girls.toml");

/// The weight, height and head tables of one growth standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSet {
    pub standard: GrowthStandard,
    pub weight: ReferenceTable,
    pub height: ReferenceTable,
    pub head: ReferenceTable,
}

impl ReferenceSet {
    /// Tables shipped with the crate (girls, WHO 0-24 months, CDC 0-36 months).
    pub fn builtin(standard: GrowthStandard) -> Result<Self, TableError> {
        let text = match standard {
            GrowthStandard::Who => WHO_GIRLS,
            GrowthStandard::Cdc => CDC_GIRLS,
        };
        let set = Self::from_toml(text)?;
        if set.standard != standard {
            return Err(TableError::Parse(format!(
                "embedded {standard} tables are labelled {}",
                set.standard
            )));
        }
        Ok(set)
    }

    pub fn from_toml(text: &str) -> Result<Self, TableError> {
        toml::from_str(text).map_err(|e| TableError::Parse(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, TableError> {
        serde_json::from_str(text).map_err(|e| TableError::Parse(e.to_string()))
    }

    /// Load from a `.toml` or `.json` file.
    pub fn from_file(path: &Path) -> Result<Self, TableError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, TableError> = match ext.as_deref() {
            Some("toml") => Self::from_toml,
            Some("json") => Self::from_json,
            _ => return Err(TableError::UnsupportedFormat(path.to_path_buf())),
        };
        let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let set = parse(&text)?;
        log::debug!(
            "loaded {} reference tables from {}",
            set.standard,
            path.display()
        );
        Ok(set)
    }

    pub fn table(&self, metric: Metric) -> &ReferenceTable {
        match metric {
            Metric::Weight => &self.weight,
            Metric::Height => &self.height,
            Metric::Head => &self.head,
        }
    }

    pub fn percentile(
        &self,
        metric: Metric,
        value: Option<f64>,
        age_months: f64,
    ) -> Option<PercentileRank> {
        self.table(metric).percentile(value, age_months)
    }
}
