//! Nutrition report: feeding log rolled up per day and per week.

use serde::{Deserialize, Serialize};

use growthlab_core::nutrition::{
    daily_totals, reconcile_totals, weekly_average, weekly_summaries, DailyIntake, NutritionFeed,
    TotalMismatch, WeeklyIntake,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionReport {
    pub entry_count: usize,
    pub daily: Vec<DailyIntake>,
    pub weekly: Vec<WeeklyIntake>,
    /// Mean daily total over every recorded day.
    pub average_daily_ml: Option<f64>,
    /// The source's own weekly average, when it declares one.
    pub declared_weekly_average: Option<f64>,
    /// Days whose declared total disagrees with the summed feeds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<TotalMismatch>,
}

impl NutritionReport {
    /// Difference between the computed and the declared average, if both exist.
    pub fn average_drift(&self) -> Option<f64> {
        Some(self.average_daily_ml? - self.declared_weekly_average?)
    }
}

pub fn build_nutrition_report(feed: &NutritionFeed) -> NutritionReport {
    let daily = daily_totals(&feed.entries);
    let weekly = weekly_summaries(&daily);
    NutritionReport {
        entry_count: feed.entries.len(),
        average_daily_ml: weekly_average(&daily),
        declared_weekly_average: feed.weekly_average,
        mismatches: reconcile_totals(&feed.entries, &feed.declared_totals),
        daily,
        weekly,
    }
}
