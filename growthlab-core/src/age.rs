//! Fractional age in months.
//!
//! Whole calendar months since birth, plus the elapsed fraction of the
//! current month measured between two monthly anniversaries. An anniversary
//! that falls on a day the month doesn't have lands on the month's last day
//! (born Jan 31 -> Feb 28/29 -> Mar 31).

use chrono::{Datelike, Months, NaiveDate};

use crate::domain::parse_iso_date;

/// Age in months at `observed` for a child born on `birth`.
///
/// Never negative: an observation before birth yields `0.0`.
pub fn age_in_months(birth: NaiveDate, observed: NaiveDate) -> f64 {
    if observed <= birth {
        return 0.0;
    }
    fractional_months(birth, observed).unwrap_or(0.0).max(0.0)
}

/// [`age_in_months`] over ISO-8601 strings. Malformed or empty input gives `0.0`.
pub fn age_in_months_from_str(birth: &str, observed: &str) -> f64 {
    match (parse_iso_date(birth), parse_iso_date(observed)) {
        (Some(b), Some(o)) => age_in_months(b, o),
        _ => 0.0,
    }
}

/// Round to two decimals, the precision ages are displayed and ranked at.
pub fn round_age(age_months: f64) -> f64 {
    (age_months * 100.0).round() / 100.0
}

fn anniversary(birth: NaiveDate, months: u32) -> Option<NaiveDate> {
    birth.checked_add_months(Months::new(months))
}

fn fractional_months(birth: NaiveDate, observed: NaiveDate) -> Option<f64> {
    let span = (observed.year() - birth.year()) * 12 + observed.month() as i32
        - birth.month() as i32;
    let mut whole = u32::try_from(span.max(0)).ok()?;

    let mut anchor = anniversary(birth, whole)?;
    while anchor > observed && whole > 0 {
        whole -= 1;
        anchor = anniversary(birth, whole)?;
    }
    let next = anniversary(birth, whole + 1)?;

    let elapsed = (observed - anchor).num_days() as f64;
    let month_len = (next - anchor).num_days() as f64;
    if month_len <= 0.0 {
        return None;
    }
    Some(f64::from(whole) + elapsed / month_len)
}
