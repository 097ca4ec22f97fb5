//! Growth report: measurements enriched with age and percentile ranks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use growthlab_core::{
    age_in_months, round_age, GrowthStandard, Measurement, Metric, PercentileRank, ReferenceSet,
};

/// One measurement with its age and a rank per metric present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRow {
    pub date: NaiveDate,
    /// Age in months, rounded to two decimals.
    pub age_months: f64,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub head: Option<f64>,
    pub weight_percentile: Option<PercentileRank>,
    pub height_percentile: Option<PercentileRank>,
    pub head_percentile: Option<PercentileRank>,
}

impl GrowthRow {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Weight => self.weight,
            Metric::Height => self.height,
            Metric::Head => self.head,
        }
    }

    pub fn percentile(&self, metric: Metric) -> Option<PercentileRank> {
        match metric {
            Metric::Weight => self.weight_percentile,
            Metric::Height => self.height_percentile,
            Metric::Head => self.head_percentile,
        }
    }
}

/// A point of a single-metric series, as charted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub age_months: f64,
    pub value: f64,
    pub percentile: Option<PercentileRank>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthReport {
    pub birth_date: NaiveDate,
    pub standard: GrowthStandard,
    /// Sorted by date.
    pub rows: Vec<GrowthRow>,
}

impl GrowthReport {
    /// Rows carrying `metric`, in date order.
    pub fn series(&self, metric: Metric) -> Vec<SeriesPoint> {
        self.rows
            .iter()
            .filter_map(|row| {
                row.value(metric).map(|value| SeriesPoint {
                    date: row.date,
                    age_months: row.age_months,
                    value,
                    percentile: row.percentile(metric),
                })
            })
            .collect()
    }

    /// Most recent point for `metric`.
    pub fn latest(&self, metric: Metric) -> Option<SeriesPoint> {
        self.series(metric).pop()
    }
}

/// Rank every measurement against `set`.
///
/// Measurements dated before `birth` are kept at age 0 and logged.
pub fn build_growth_report(
    birth: NaiveDate,
    measurements: &[Measurement],
    set: &ReferenceSet,
) -> GrowthReport {
    let mut sorted: Vec<&Measurement> = measurements.iter().collect();
    sorted.sort_by_key(|m| m.date);

    let rows = sorted
        .into_iter()
        .map(|m| {
            if m.date < birth {
                log::warn!("measurement on {} precedes birth date {birth}", m.date);
            }
            let age = round_age(age_in_months(birth, m.date));
            let rank = |metric: Metric| set.percentile(metric, metric.value_of(m), age);
            GrowthRow {
                date: m.date,
                age_months: age,
                weight: m.weight,
                height: m.height,
                head: m.head,
                weight_percentile: rank(Metric::Weight),
                height_percentile: rank(Metric::Height),
                head_percentile: rank(Metric::Head),
            }
        })
        .collect();

    GrowthReport {
        birth_date: birth,
        standard: set.standard,
        rows,
    }
}
