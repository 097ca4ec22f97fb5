//! Property tests for the interpolator and age calculator.
//!
//! Uses proptest to verify:
//! 1. Round-trip: a table value at its own age ranks as its own percentile
//! 2. Clamping: values beyond the extreme curves rank at the extreme ranks
//! 3. Monotonicity: at fixed age, a larger value never ranks lower
//! 4. Bounds: any ranked value lands in 0..=100 and between the table's ranks
//! 5. Age: never negative, and non-decreasing in the observation date

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use growthlab_core::{
    age_in_months, compute_percentile, GrowthStandard, Metric, ReferenceSet,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_standard() -> impl Strategy<Value = GrowthStandard> {
    prop_oneof![Just(GrowthStandard::Who), Just(GrowthStandard::Cdc)]
}

fn arb_metric() -> impl Strategy<Value = Metric> {
    prop_oneof![Just(Metric::Weight), Just(Metric::Height), Just(Metric::Head)]
}

fn arb_age() -> impl Strategy<Value = f64> {
    (0.0..40.0_f64).prop_map(|a| (a * 100.0).round() / 100.0)
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn set(standard: GrowthStandard) -> ReferenceSet {
    ReferenceSet::builtin(standard).unwrap()
}

// ── 1. Round-trip at sample points ───────────────────────────────────

proptest! {
    #[test]
    fn sample_points_rank_as_themselves(
        standard in arb_standard(),
        metric in arb_metric(),
        row_pick in any::<prop::sample::Index>(),
    ) {
        let set = set(standard);
        let rows = set.table(metric).rows();
        let row = &rows[row_pick.index(rows.len())];
        for point in row.points() {
            let rank = compute_percentile(Some(point.value), row.month, rows);
            prop_assert_eq!(rank, Some(point.rank));
        }
    }
}

// ── 2. Clamping ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn values_below_lowest_curve_clamp_low(
        standard in arb_standard(),
        metric in arb_metric(),
        age in arb_age(),
        below in 0.0..20.0_f64,
    ) {
        let set = set(standard);
        let curve = set.table(metric).curve_at(age).unwrap();
        let lowest = curve.points()[0];
        let rank = set.percentile(metric, Some(lowest.value - below), age);
        prop_assert_eq!(rank, Some(lowest.rank));
    }

    #[test]
    fn values_above_highest_curve_clamp_high(
        standard in arb_standard(),
        metric in arb_metric(),
        age in arb_age(),
        above in 0.0..20.0_f64,
    ) {
        let set = set(standard);
        let curve = set.table(metric).curve_at(age).unwrap();
        let highest = curve.points()[curve.points().len() - 1];
        let rank = set.percentile(metric, Some(highest.value + above), age);
        prop_assert_eq!(rank, Some(highest.rank));
    }
}

// ── 3. Monotonicity ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn larger_values_never_rank_lower(
        standard in arb_standard(),
        metric in arb_metric(),
        age in arb_age(),
        a in 0.0..110.0_f64,
        b in 0.0..110.0_f64,
    ) {
        let set = set(standard);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let r_lo = set.percentile(metric, Some(lo), age).unwrap();
        let r_hi = set.percentile(metric, Some(hi), age).unwrap();
        prop_assert!(r_lo <= r_hi, "{lo} -> {r_lo}, {hi} -> {r_hi}");
    }
}

// ── 4. Bounds ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn ranks_stay_within_table_ranks(
        standard in arb_standard(),
        metric in arb_metric(),
        age in arb_age(),
        value in 0.0..110.0_f64,
    ) {
        let set = set(standard);
        let rank = set.percentile(metric, Some(value), age).unwrap();
        prop_assert!((3..=97).contains(&rank));
    }

    #[test]
    fn missing_value_is_always_none(
        standard in arb_standard(),
        metric in arb_metric(),
        age in arb_age(),
    ) {
        let set = set(standard);
        prop_assert_eq!(set.percentile(metric, None, age), None);
    }
}

// ── 5. Age ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn age_is_never_negative(birth in arb_date(), observed in arb_date()) {
        let age = age_in_months(birth, observed);
        prop_assert!(age >= 0.0);
        prop_assert!(age.is_finite());
        if observed <= birth {
            prop_assert_eq!(age, 0.0);
        }
    }

    #[test]
    fn age_grows_with_observation_date(
        birth in arb_date(),
        observed in arb_date(),
        extra in 1i64..400,
    ) {
        let later = observed + Duration::days(extra);
        prop_assert!(age_in_months(birth, later) >= age_in_months(birth, observed));
    }
}
