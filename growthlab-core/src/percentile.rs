//! Percentile interpolation.
//!
//! Two stages:
//! 1. Age axis: find the rows bracketing the requested age and linearly
//!    interpolate every rank present in both, giving the reference curve at
//!    that exact age. Ages outside the table clamp to the edge row.
//! 2. Value axis: place the observed value between the curve's points and
//!    linearly interpolate the rank. Values outside clamp to the extreme rank.
//!
//! Works on raw row slices so malformed data degrades to `None` instead of
//! failing. Sparse rank sets (WHO five-point, CDC three-point) need no special
//! casing.

use crate::domain::PercentileRank;
use crate::reference::{PercentilePoint, ReferenceRow};

/// Percentile rank of `value` at `age_months`, or `None` when there is
/// nothing usable to rank against.
///
/// Returns `None` if `value` is absent or not finite, if `age_months` is
/// negative or not finite, if `rows` is empty, or if fewer than two
/// percentile points survive interpolation at that age.
pub fn compute_percentile(
    value: Option<f64>,
    age_months: f64,
    rows: &[ReferenceRow],
) -> Option<PercentileRank> {
    let value = value.filter(|v| v.is_finite())?;
    let curve = curve_at(age_months, rows)?;
    invert(value, curve.points())
}

/// Reference curve at `age_months`: the row itself on an exact match,
/// otherwise a synthetic row interpolated between the bracketing rows.
pub fn curve_at(age_months: f64, rows: &[ReferenceRow]) -> Option<ReferenceRow> {
    if !age_months.is_finite() || age_months < 0.0 {
        return None;
    }
    let (lower, upper) = bracket(age_months, rows)?;

    let points: Vec<(PercentileRank, f64)> = if lower.month == upper.month {
        lower.points().iter().map(|p| (p.rank, p.value)).collect()
    } else {
        let ratio = (age_months - lower.month) / (upper.month - lower.month);
        lower
            .points()
            .iter()
            .filter_map(|lo| {
                upper
                    .value(lo.rank)
                    .map(|hi| (lo.rank, lo.value + (hi - lo.value) * ratio))
            })
            .collect()
    };

    let points: Vec<_> = points.into_iter().filter(|(_, v)| v.is_finite()).collect();
    if points.len() < 2 {
        return None;
    }
    Some(ReferenceRow::new(age_months, points))
}

/// `lower` is the last row with `month <= age`, `upper` the first with
/// `month >= age`. Both collapse onto the edge row outside the table.
fn bracket(age_months: f64, rows: &[ReferenceRow]) -> Option<(&ReferenceRow, &ReferenceRow)> {
    let mut lower = rows.first()?;
    let mut upper = rows.last()?;
    for row in rows {
        if row.month <= age_months {
            lower = row;
        }
        if row.month >= age_months {
            upper = row;
            break;
        }
    }
    Some((lower, upper))
}

fn invert(value: f64, points: &[PercentilePoint]) -> Option<PercentileRank> {
    if points.len() < 2 {
        return None;
    }
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.value.total_cmp(&b.value).then(a.rank.cmp(&b.rank)));

    let first = sorted[0];
    let last = sorted[sorted.len() - 1];
    if value <= first.value {
        return Some(first.rank.min(100));
    }
    if value >= last.value {
        return Some(last.rank.min(100));
    }

    sorted.windows(2).find_map(|pair| {
        let (a, b) = (pair[0], pair[1]);
        if value < a.value || value > b.value {
            return None;
        }
        if a.value == b.value {
            return Some(a.rank);
        }
        let ratio = (value - a.value) / (b.value - a.value);
        let rank = f64::from(a.rank) + (f64::from(b.rank) - f64::from(a.rank)) * ratio;
        Some(rank.round().clamp(0.0, 100.0) as PercentileRank)
    })
}
