//! Feeding log aggregation.
//!
//! Entries come from the dashboard backend as bottle feeds (`biberon`) or
//! breastfeeds (`tétée`), each with a volume in ml. They are classified by
//! milk source and summed per day, then averaged over 7-day blocks.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::deserialize_iso_date;

/// Tolerance when comparing summed entries against a declared daily total.
pub const TOTAL_TOLERANCE_ML: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedingKind {
    #[serde(alias = "biberon")]
    Bottle,
    #[serde(alias = "tétée", alias = "tetee")]
    Breastfeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilkSource {
    Maternal,
    Goat,
    Cow,
    Unknown,
}

impl MilkSource {
    pub const ALL: [MilkSource; 4] = [
        MilkSource::Maternal,
        MilkSource::Goat,
        MilkSource::Cow,
        MilkSource::Unknown,
    ];

    /// Classify a feed from its kind and the free-text labels the backend attaches.
    pub fn classify(kind: FeedingKind, source: Option<&str>, milk_type: Option<&str>) -> Self {
        if kind == FeedingKind::Breastfeed {
            return MilkSource::Maternal;
        }
        for label in [milk_type, source].into_iter().flatten() {
            let label = label.to_lowercase();
            if ["chèvre", "chevre", "goat"].iter().any(|k| label.contains(k)) {
                return MilkSource::Goat;
            }
            if ["vache", "cow"].iter().any(|k| label.contains(k)) {
                return MilkSource::Cow;
            }
            if ["maternel", "maternal", "breast"].iter().any(|k| label.contains(k)) {
                return MilkSource::Maternal;
            }
        }
        MilkSource::Unknown
    }

    pub fn label(self) -> &'static str {
        match self {
            MilkSource::Maternal => "maternal",
            MilkSource::Goat => "goat",
            MilkSource::Cow => "cow",
            MilkSource::Unknown => "unknown",
        }
    }
}

/// One feed as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingEntry {
    #[serde(deserialize_with = "deserialize_iso_date")]
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: FeedingKind,
    pub ml: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<String>,
    /// Breastfeeding time slots, e.g. `"21:30 à 21:45"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hours: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milk_type: Option<String>,
}

impl FeedingEntry {
    pub fn milk_source(&self) -> MilkSource {
        MilkSource::classify(self.kind, self.source.as_deref(), self.milk_type.as_deref())
    }
}

/// Backend `/nutrition` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionFeed {
    #[serde(default)]
    pub entries: Vec<FeedingEntry>,
    /// Weekly average as declared by the source spreadsheet, if any.
    #[serde(default)]
    pub weekly_average: Option<f64>,
    /// Per-day totals as declared by the source spreadsheet's total row.
    #[serde(default, alias = "daily_totals", skip_serializing_if = "BTreeMap::is_empty")]
    pub declared_totals: BTreeMap<NaiveDate, f64>,
}

/// Volume per source on one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyIntake {
    pub date: NaiveDate,
    pub maternal_ml: f64,
    pub goat_ml: f64,
    pub cow_ml: f64,
    pub unknown_ml: f64,
    pub feeds: usize,
}

impl DailyIntake {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            ..Default::default()
        }
    }

    fn add(&mut self, source: MilkSource, ml: f64) {
        *self.slot_mut(source) += ml;
        self.feeds += 1;
    }

    fn slot_mut(&mut self, source: MilkSource) -> &mut f64 {
        match source {
            MilkSource::Maternal => &mut self.maternal_ml,
            MilkSource::Goat => &mut self.goat_ml,
            MilkSource::Cow => &mut self.cow_ml,
            MilkSource::Unknown => &mut self.unknown_ml,
        }
    }

    pub fn by_source(&self, source: MilkSource) -> f64 {
        match source {
            MilkSource::Maternal => self.maternal_ml,
            MilkSource::Goat => self.goat_ml,
            MilkSource::Cow => self.cow_ml,
            MilkSource::Unknown => self.unknown_ml,
        }
    }

    pub fn total_ml(&self) -> f64 {
        self.maternal_ml + self.goat_ml + self.cow_ml + self.unknown_ml
    }
}

/// Average daily volume per source over a 7-day block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyIntake {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Days in the block that have at least one feed.
    pub days_recorded: usize,
    pub maternal_avg_ml: f64,
    pub goat_avg_ml: f64,
    pub cow_avg_ml: f64,
    pub unknown_avg_ml: f64,
    pub total_avg_ml: f64,
}

impl WeeklyIntake {
    pub fn is_partial(&self) -> bool {
        self.days_recorded < 7
    }
}

/// A day whose entries don't add up to the total the source declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalMismatch {
    pub date: NaiveDate,
    pub declared_ml: f64,
    pub summed_ml: f64,
}

/// Sum entries per day and source, sorted by date. Entries with a negative
/// or non-finite volume are skipped.
pub fn daily_totals(entries: &[FeedingEntry]) -> Vec<DailyIntake> {
    let mut days: BTreeMap<NaiveDate, DailyIntake> = BTreeMap::new();
    for entry in entries {
        if !entry.ml.is_finite() || entry.ml < 0.0 {
            log::warn!("skipping feed on {} with volume {}", entry.date, entry.ml);
            continue;
        }
        days.entry(entry.date)
            .or_insert_with(|| DailyIntake::new(entry.date))
            .add(entry.milk_source(), entry.ml);
    }
    days.into_values().collect()
}

/// Group days into consecutive 7-day blocks starting at the first recorded day.
pub fn weekly_summaries(daily: &[DailyIntake]) -> Vec<WeeklyIntake> {
    let Some(first) = daily.iter().map(|d| d.date).min() else {
        return Vec::new();
    };

    let mut blocks: BTreeMap<i64, Vec<&DailyIntake>> = BTreeMap::new();
    for day in daily {
        let index = (day.date - first).num_days().div_euclid(7);
        blocks.entry(index).or_default().push(day);
    }

    blocks
        .into_iter()
        .map(|(index, days)| {
            let start = first + Duration::days(index * 7);
            let n = days.len() as f64;
            let avg = |source: MilkSource| days.iter().map(|d| d.by_source(source)).sum::<f64>() / n;
            WeeklyIntake {
                start,
                end: start + Duration::days(6),
                days_recorded: days.len(),
                maternal_avg_ml: avg(MilkSource::Maternal),
                goat_avg_ml: avg(MilkSource::Goat),
                cow_avg_ml: avg(MilkSource::Cow),
                unknown_avg_ml: avg(MilkSource::Unknown),
                total_avg_ml: days.iter().map(|d| d.total_ml()).sum::<f64>() / n,
            }
        })
        .collect()
}

/// Mean daily total across all recorded days.
pub fn weekly_average(daily: &[DailyIntake]) -> Option<f64> {
    if daily.is_empty() {
        return None;
    }
    Some(daily.iter().map(DailyIntake::total_ml).sum::<f64>() / daily.len() as f64)
}

/// Compare summed entries against declared per-day totals.
///
/// A declared date with no entries sums to zero.
pub fn reconcile_totals(
    entries: &[FeedingEntry],
    declared: &BTreeMap<NaiveDate, f64>,
) -> Vec<TotalMismatch> {
    let summed: BTreeMap<NaiveDate, f64> = daily_totals(entries)
        .into_iter()
        .map(|d| (d.date, d.total_ml()))
        .collect();

    declared
        .iter()
        .filter_map(|(date, &declared_ml)| {
            let summed_ml = summed.get(date).copied().unwrap_or(0.0);
            if (summed_ml - declared_ml).abs() > TOTAL_TOLERANCE_ML {
                log::warn!("total mismatch on {date}: declared {declared_ml} ml, entries sum to {summed_ml} ml");
                Some(TotalMismatch {
                    date: *date,
                    declared_ml,
                    summed_ml,
                })
            } else {
                None
            }
        })
        .collect()
}
