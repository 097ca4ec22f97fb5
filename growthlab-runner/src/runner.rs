//! Report runner: wires configuration, sources and the core together.
//!
//! Entry points:
//! - `source_from_config()`: picks files when configured, the backend otherwise.
//! - `run_growth_report()`: fetches measurements and ranks them.
//! - `run_nutrition_report()`: fetches the feeding log and rolls it up.

use thiserror::Error;

use crate::config::{ConfigError, DashboardConfig};
use crate::growth::{build_growth_report, GrowthReport};
use crate::nutrition_report::{build_nutrition_report, NutritionReport};
use crate::source::{FileSource, HttpSource, MeasurementSource, SourceError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("no data source configured: set source.growth_file, source.nutrition_file or source.backend_url")]
    NoSource,
}

/// Build the source a config describes. Local files win over the backend.
pub fn source_from_config(
    config: &DashboardConfig,
) -> Result<Box<dyn MeasurementSource>, ReportError> {
    let growth = config.source.growth_file.as_deref().map(|p| config.resolve(p));
    let nutrition = config
        .source
        .nutrition_file
        .as_deref()
        .map(|p| config.resolve(p));

    if growth.is_some() || nutrition.is_some() {
        return Ok(Box::new(FileSource::new(growth, nutrition)));
    }
    match config.backend_url()? {
        Some(url) => Ok(Box::new(HttpSource::new(&url)?)),
        None => Err(ReportError::NoSource),
    }
}

pub fn run_growth_report(
    config: &DashboardConfig,
    source: &dyn MeasurementSource,
) -> Result<GrowthReport, ReportError> {
    let set = config.reference_set()?;
    let measurements = source.fetch_growth()?;
    log::debug!(
        "ranking {} measurements from {} against {}",
        measurements.len(),
        source.name(),
        set.standard
    );
    Ok(build_growth_report(
        config.child.birth_date,
        &measurements,
        &set,
    ))
}

pub fn run_nutrition_report(
    source: &dyn MeasurementSource,
) -> Result<NutritionReport, ReportError> {
    let feed = source.fetch_nutrition()?;
    let report = build_nutrition_report(&feed);
    if let Some(drift) = report.average_drift() {
        if drift.abs() > 1.0 {
            log::warn!(
                "computed daily average differs from the declared weekly average by {drift:.1} ml"
            );
        }
    }
    Ok(report)
}
