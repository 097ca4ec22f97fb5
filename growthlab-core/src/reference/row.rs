use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::TableError;
use crate::domain::PercentileRank;

/// One reference value at a given percentile rank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentilePoint {
    pub rank: PercentileRank,
    pub value: f64,
}

/// Reference values at one age.
///
/// Points are kept sorted by rank with no duplicate ranks. Rows built with
/// [`ReferenceRow::new`] are not validated; [`ReferenceTable`](super::ReferenceTable)
/// does that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRow", into = "RawRow")]
pub struct ReferenceRow {
    pub month: f64,
    points: Vec<PercentilePoint>,
}

impl ReferenceRow {
    /// Build a row from `(rank, value)` pairs. A repeated rank keeps its last value.
    pub fn new(month: f64, points: impl IntoIterator<Item = (PercentileRank, f64)>) -> Self {
        let mut by_rank: BTreeMap<PercentileRank, f64> = BTreeMap::new();
        for (rank, value) in points {
            by_rank.insert(rank, value);
        }
        Self {
            month,
            points: by_rank
                .into_iter()
                .map(|(rank, value)| PercentilePoint { rank, value })
                .collect(),
        }
    }

    pub fn points(&self) -> &[PercentilePoint] {
        &self.points
    }

    pub fn value(&self, rank: PercentileRank) -> Option<f64> {
        self.points
            .binary_search_by_key(&rank, |p| p.rank)
            .ok()
            .map(|i| self.points[i].value)
    }

    pub fn ranks(&self) -> impl Iterator<Item = PercentileRank> + '_ {
        self.points.iter().map(|p| p.rank)
    }

    pub(crate) fn validate(&self, index: usize) -> Result<(), TableError> {
        if !self.month.is_finite() || self.month < 0.0 {
            return Err(TableError::InvalidMonth {
                index,
                month: self.month,
            });
        }
        if self.points.len() < 2 {
            return Err(TableError::TooFewPoints {
                month: self.month,
                count: self.points.len(),
            });
        }
        for p in &self.points {
            if !p.value.is_finite() {
                return Err(TableError::InvalidValue {
                    month: self.month,
                    rank: p.rank,
                    value: p.value,
                });
            }
        }
        for pair in self.points.windows(2) {
            if pair[1].value < pair[0].value {
                return Err(TableError::NotMonotonic {
                    month: self.month,
                    lower: pair[0].rank,
                    upper: pair[1].rank,
                });
            }
        }
        Ok(())
    }
}

/// Text form of a row: `{ month = 6, p3 = 5.8, p50 = 7.3, p97 = 9.2 }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRow {
    month: f64,
    #[serde(flatten)]
    values: BTreeMap<String, f64>,
}

fn parse_rank_key(key: &str) -> Result<PercentileRank, TableError> {
    let digits = key
        .strip_prefix('p')
        .or_else(|| key.strip_prefix('P'))
        .ok_or_else(|| TableError::UnknownColumn(key.to_string()))?;
    let rank: u32 = digits
        .parse()
        .map_err(|_| TableError::UnknownColumn(key.to_string()))?;
    if rank > 100 {
        return Err(TableError::RankOutOfRange(rank));
    }
    Ok(rank as PercentileRank)
}

impl TryFrom<RawRow> for ReferenceRow {
    type Error = TableError;

    fn try_from(raw: RawRow) -> Result<Self, Self::Error> {
        let points = raw
            .values
            .iter()
            .map(|(key, value)| parse_rank_key(key).map(|rank| (rank, *value)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReferenceRow::new(raw.month, points))
    }
}

impl From<ReferenceRow> for RawRow {
    fn from(row: ReferenceRow) -> Self {
        RawRow {
            month: row.month,
            values: row
                .points
                .iter()
                .map(|p| (format!("p{}", p.rank), p.value))
                .collect(),
        }
    }
}
