//! GrowthLab Runner: configuration, data sources and reports.
//!
//! This crate builds on `growthlab-core` to provide:
//! - TOML dashboard configuration with an environment override for the backend
//! - Measurement sources: JSON/CSV exports and the dashboard HTTP backend
//! - Growth reports (age + percentile per measurement, per-metric series)
//! - Nutrition reports (daily and weekly intake per milk source)

pub mod config;
pub mod growth;
pub mod nutrition_report;
pub mod runner;
pub mod source;

pub use config::{DashboardConfig, ConfigError, BACKEND_URL_ENV};
pub use growth::{build_growth_report, GrowthReport, GrowthRow, SeriesPoint};
pub use nutrition_report::{build_nutrition_report, NutritionReport};
pub use runner::{run_growth_report, run_nutrition_report, source_from_config, ReportError};
pub use source::{FileSource, HttpSource, MeasurementSource, SourceError};
