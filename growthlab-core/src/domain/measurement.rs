use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// A single dated observation. Any subset of the three metrics may be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(deserialize_with = "deserialize_iso_date")]
    pub date: NaiveDate,
    /// Weight in kilograms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Length/height in centimetres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Head circumference in centimetres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<f64>,
}

impl Measurement {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            weight: None,
            height: None,
            head: None,
        }
    }

    pub fn with_weight(mut self, kg: f64) -> Self {
        self.weight = Some(kg);
        self
    }

    pub fn with_height(mut self, cm: f64) -> Self {
        self.height = Some(cm);
        self
    }

    pub fn with_head(mut self, cm: f64) -> Self {
        self.head = Some(cm);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.height.is_none() && self.head.is_none()
    }
}

/// Parse an ISO-8601 date or timestamp, keeping only the calendar date.
///
/// Accepts `2025-05-14`, `2025-05-14T08:30:00`, `2025-05-14 08:30:00` and
/// RFC 3339 timestamps with an offset. Returns `None` for anything else.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

/// Serde adapter for [`parse_iso_date`].
pub fn deserialize_iso_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_iso_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid ISO-8601 date '{raw}'")))
}
