//! GrowthLab Core: percentile interpolation against WHO/CDC growth references.
//!
//! This crate is pure and stateless:
//! - Domain types (metrics, growth standards, measurements)
//! - Reference tables with validation and embedded WHO/CDC sets
//! - Two-stage percentile interpolation (age axis, then value axis)
//! - Fractional age in months from calendar dates
//! - Feeding log aggregation per milk source

pub mod age;
pub mod domain;
pub mod nutrition;
pub mod percentile;
pub mod reference;

pub use age::{age_in_months, age_in_months_from_str, round_age};
pub use domain::{GrowthStandard, Measurement, Metric, PercentileRank};
pub use percentile::{compute_percentile, curve_at};
pub use reference::{ReferenceRow, ReferenceSet, ReferenceTable, TableError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core types can cross thread boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Measurement>();
        require_sync::<Measurement>();
        require_send::<ReferenceRow>();
        require_sync::<ReferenceRow>();
        require_send::<ReferenceTable>();
        require_sync::<ReferenceTable>();
        require_send::<ReferenceSet>();
        require_sync::<ReferenceSet>();
        require_send::<TableError>();
        require_sync::<TableError>();
        require_send::<nutrition::FeedingEntry>();
        require_sync::<nutrition::FeedingEntry>();
        require_send::<nutrition::DailyIntake>();
        require_sync::<nutrition::DailyIntake>();
    }

    #[test]
    fn six_month_weight_row() {
        let table = vec![ReferenceRow::new(6.0, [(3, 6.5), (50, 7.3), (97, 9.2)])];
        assert_eq!(compute_percentile(Some(7.3), 6.0, &table), Some(50));
        assert_eq!(compute_percentile(Some(9.2), 6.0, &table), Some(97));
        assert_eq!(compute_percentile(Some(5.0), 6.0, &table), Some(3));
    }
}
