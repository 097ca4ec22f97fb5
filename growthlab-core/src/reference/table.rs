use serde::{Deserialize, Serialize};

use super::{ReferenceRow, TableError};
use crate::domain::PercentileRank;
use crate::percentile;

/// A validated reference curve for one metric.
///
/// Non-empty, months finite, non-negative and strictly increasing, every row
/// with at least two finite points that do not decrease with rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ReferenceRow>", into = "Vec<ReferenceRow>")]
pub struct ReferenceTable {
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn new(rows: Vec<ReferenceRow>) -> Result<Self, TableError> {
        if rows.is_empty() {
            return Err(TableError::Empty);
        }
        for (index, row) in rows.iter().enumerate() {
            row.validate(index)?;
            if index > 0 {
                let previous = rows[index - 1].month;
                if row.month <= previous {
                    return Err(TableError::MonthsNotIncreasing {
                        index,
                        previous,
                        month: row.month,
                    });
                }
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    /// First and last month covered. Ages outside are clamped to the edges.
    pub fn month_range(&self) -> (f64, f64) {
        // Non-empty by construction.
        let first = self.rows.first().map_or(0.0, |r| r.month);
        let last = self.rows.last().map_or(0.0, |r| r.month);
        (first, last)
    }

    /// The reference curve interpolated at `age_months`.
    pub fn curve_at(&self, age_months: f64) -> Option<ReferenceRow> {
        percentile::curve_at(age_months, &self.rows)
    }

    /// Percentile rank of `value` at `age_months`.
    pub fn percentile(&self, value: Option<f64>, age_months: f64) -> Option<PercentileRank> {
        percentile::compute_percentile(value, age_months, &self.rows)
    }
}

impl TryFrom<Vec<ReferenceRow>> for ReferenceTable {
    type Error = TableError;

    fn try_from(rows: Vec<ReferenceRow>) -> Result<Self, Self::Error> {
        ReferenceTable::new(rows)
    }
}

impl From<ReferenceTable> for Vec<ReferenceRow> {
    fn from(table: ReferenceTable) -> Self {
        table.rows
    }
}
