//! GrowthLab CLI: percentile lookups, growth and nutrition reports.
//!
//! Commands:
//! - `percentile`: rank one measurement against a reference table
//! - `age`: fractional age in months between two dates
//! - `table`: print a reference table
//! - `growth`: rank every measurement from a file or the backend
//! - `nutrition`: daily and weekly feeding totals

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use growthlab_core::domain::parse_iso_date;
use growthlab_core::nutrition::MilkSource;
use growthlab_core::{age_in_months, round_age, GrowthStandard, Metric, ReferenceSet};
use growthlab_runner::{
    run_growth_report, run_nutrition_report, source_from_config, DashboardConfig, FileSource,
    GrowthReport, HttpSource, MeasurementSource, NutritionReport,
};

#[derive(Parser)]
#[command(
    name = "growthlab",
    about = "GrowthLab CLI, infant growth percentiles against WHO/CDC references"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank one measurement against a reference table.
    Percentile {
        /// Metric: weight (kg), height (cm) or head (cm).
        #[arg(long)]
        metric: Metric,

        /// Measured value.
        #[arg(long)]
        value: f64,

        /// Age in months. Alternative to --birth/--date.
        #[arg(long, conflicts_with_all = ["birth", "date"])]
        age: Option<f64>,

        /// Birth date (YYYY-MM-DD).
        #[arg(long, requires = "date")]
        birth: Option<String>,

        /// Measurement date (YYYY-MM-DD).
        #[arg(long, requires = "birth")]
        date: Option<String>,

        /// Growth standard: who or cdc.
        #[arg(long, default_value = "who")]
        standard: GrowthStandard,

        /// Custom reference table file (.toml or .json).
        #[arg(long)]
        tables: Option<PathBuf>,
    },
    /// Fractional age in months between two dates.
    Age {
        /// Birth date (YYYY-MM-DD).
        #[arg(long)]
        birth: String,

        /// Observation date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Print a reference table.
    Table {
        #[arg(long)]
        metric: Metric,

        #[arg(long, default_value = "who")]
        standard: GrowthStandard,

        #[arg(long)]
        tables: Option<PathBuf>,
    },
    /// Rank every measurement from a file or the backend.
    Growth {
        #[command(flatten)]
        input: InputArgs,

        /// Print the report as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Daily and weekly feeding totals per milk source.
    Nutrition {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Where report data and settings come from. Flags override the config file.
#[derive(clap::Args)]
struct InputArgs {
    /// Path to a growthlab.toml config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Birth date (YYYY-MM-DD), required without --config.
    #[arg(long)]
    birth: Option<String>,

    /// Growth standard: who or cdc.
    #[arg(long)]
    standard: Option<GrowthStandard>,

    /// Local export (.json or .csv for growth, .json for nutrition).
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Backend base URL.
    #[arg(long)]
    url: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Percentile {
            metric,
            value,
            age,
            birth,
            date,
            standard,
            tables,
        } => run_percentile(metric, value, age, birth, date, standard, tables),
        Commands::Age { birth, date } => run_age(&birth, date.as_deref()),
        Commands::Table {
            metric,
            standard,
            tables,
        } => run_table(metric, standard, tables.as_deref()),
        Commands::Growth { input, json } => run_growth(&input, json),
        Commands::Nutrition { input, json } => run_nutrition(&input, json),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    parse_iso_date(s).with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

fn load_tables(standard: GrowthStandard, tables: Option<&Path>) -> Result<ReferenceSet> {
    match tables {
        Some(path) => ReferenceSet::from_file(path)
            .with_context(|| format!("failed to load reference tables from {}", path.display())),
        None => ReferenceSet::builtin(standard).context("built-in reference tables are invalid"),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_percentile(
    metric: Metric,
    value: f64,
    age: Option<f64>,
    birth: Option<String>,
    date: Option<String>,
    standard: GrowthStandard,
    tables: Option<PathBuf>,
) -> Result<()> {
    let age = match (age, birth, date) {
        (Some(age), _, _) => age,
        (None, Some(birth), Some(date)) => {
            round_age(age_in_months(parse_date(&birth)?, parse_date(&date)?))
        }
        _ => bail!("one of --age or --birth/--date is required"),
    };

    let set = load_tables(standard, tables.as_deref())?;
    let rank = set.percentile(metric, Some(value), age);

    println!(
        "{metric} {value} {} at {age:.2} months ({}): {}",
        metric.unit(),
        set.standard,
        format_rank(rank)
    );
    Ok(())
}

fn run_age(birth: &str, date: Option<&str>) -> Result<()> {
    let birth = parse_date(birth)?;
    let observed = match date {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    println!("{:.2}", age_in_months(birth, observed));
    Ok(())
}

fn run_table(metric: Metric, standard: GrowthStandard, tables: Option<&Path>) -> Result<()> {
    let set = load_tables(standard, tables)?;
    let table = set.table(metric);

    let mut ranks: Vec<u8> = table.rows().iter().flat_map(|r| r.ranks()).collect();
    ranks.sort_unstable();
    ranks.dedup();

    println!("{} {metric} ({})", set.standard, metric.unit());
    print!("{:>6}", "Month");
    for rank in &ranks {
        print!(" {:>7}", format!("p{rank}"));
    }
    println!();
    println!("{}", "-".repeat(6 + 8 * ranks.len()));
    for row in table.rows() {
        print!("{:>6}", row.month);
        for rank in &ranks {
            match row.value(*rank) {
                Some(v) => print!(" {v:>7.1}"),
                None => print!(" {:>7}", "–"),
            }
        }
        println!();
    }
    Ok(())
}

fn build_config(input: &InputArgs) -> Result<DashboardConfig> {
    let mut config = match &input.config {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let Some(birth) = &input.birth else {
                bail!("--birth is required when no --config is given");
            };
            DashboardConfig::for_birth_date(parse_date(birth)?)
        }
    };
    if let (Some(_), Some(birth)) = (&input.config, &input.birth) {
        config.child.birth_date = parse_date(birth)?;
    }
    if let Some(standard) = input.standard {
        config.reference.standard = standard;
    }
    Ok(config)
}

fn build_source(
    input: &InputArgs,
    config: &DashboardConfig,
    nutrition: bool,
) -> Result<Box<dyn MeasurementSource>> {
    if let Some(file) = &input.file {
        let source = if nutrition {
            FileSource::new(None, Some(file.clone()))
        } else {
            FileSource::new(Some(file.clone()), None)
        };
        return Ok(Box::new(source));
    }
    if let Some(url) = &input.url {
        return Ok(Box::new(HttpSource::new(url)?));
    }
    Ok(source_from_config(config)?)
}

fn run_growth(input: &InputArgs, json: bool) -> Result<()> {
    let config = build_config(input)?;
    let source = build_source(input, &config, false)?;
    log::info!("fetching growth data from {}", source.name());
    let report = run_growth_report(&config, source.as_ref())
        .with_context(|| format!("growth report from {} failed", source.name()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_growth(&report, config.child.name.as_deref());
    }
    Ok(())
}

fn run_nutrition(input: &InputArgs, json: bool) -> Result<()> {
    let config = match (&input.config, &input.birth) {
        (None, None) => None,
        _ => Some(build_config(input)?),
    };
    let source: Box<dyn MeasurementSource> = match &config {
        Some(config) => build_source(input, config, true)?,
        None => match (&input.file, &input.url) {
            (Some(file), _) => Box::new(FileSource::new(None, Some(file.clone()))),
            (None, Some(url)) => Box::new(HttpSource::new(url)?),
            (None, None) => bail!("one of --config, --file or --url is required"),
        },
    };
    log::info!("fetching nutrition data from {}", source.name());
    let report = run_nutrition_report(source.as_ref())
        .with_context(|| format!("nutrition report from {} failed", source.name()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_nutrition(&report);
    }
    Ok(())
}

fn format_rank(rank: Option<u8>) -> String {
    match rank {
        Some(r) => format!("P{r}"),
        None => "–".to_string(),
    }
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "–".to_string(), |v| format!("{v:.1}"))
}

fn print_growth(report: &GrowthReport, name: Option<&str>) {
    println!();
    println!("=== Growth Report ===");
    if let Some(name) = name {
        println!("Child:      {name}");
    }
    println!("Born:       {}", report.birth_date);
    println!("Standard:   {}", report.standard);
    println!("Rows:       {}", report.rows.len());
    println!();
    println!(
        "{:<11} {:>6}  {:>6} {:>5}  {:>6} {:>5}  {:>6} {:>5}",
        "Date", "Months", "kg", "%", "cm", "%", "head", "%"
    );
    println!("{}", "-".repeat(62));
    for row in &report.rows {
        println!(
            "{:<11} {:>6.2}  {:>6} {:>5}  {:>6} {:>5}  {:>6} {:>5}",
            row.date.to_string(),
            row.age_months,
            format_value(row.weight),
            format_rank(row.weight_percentile),
            format_value(row.height),
            format_rank(row.height_percentile),
            format_value(row.head),
            format_rank(row.head_percentile),
        );
    }
    println!();
    println!("--- Latest ---");
    for metric in Metric::ALL {
        match report.latest(metric) {
            Some(p) => println!(
                "{:<8} {:.1} {} on {} ({})",
                metric.as_str(),
                p.value,
                metric.unit(),
                p.date,
                format_rank(p.percentile)
            ),
            None => println!("{:<8} –", metric.as_str()),
        }
    }
    println!();
}

fn print_nutrition(report: &NutritionReport) {
    println!();
    println!("=== Nutrition Report ===");
    println!("Entries:    {}", report.entry_count);
    println!("Days:       {}", report.daily.len());
    match report.average_daily_ml {
        Some(avg) => println!("Avg/day:    {avg:.0} ml"),
        None => println!("Avg/day:    –"),
    }
    if let Some(declared) = report.declared_weekly_average {
        println!("Declared:   {declared:.0} ml");
    }
    for m in &report.mismatches {
        println!(
            "Mismatch:   {} declared {:.0} ml, feeds sum to {:.0} ml",
            m.date, m.declared_ml, m.summed_ml
        );
    }
    println!();
    print!("{:<23} {:>4}", "Week", "Days");
    for source in MilkSource::ALL {
        print!(" {:>9}", source.label());
    }
    println!(" {:>9}", "total");
    println!("{}", "-".repeat(28 + 10 * (MilkSource::ALL.len() + 1)));
    for week in &report.weekly {
        print!(
            "{:<23} {:>4}",
            format!("{} to {}", week.start, week.end),
            week.days_recorded
        );
        for avg in [
            week.maternal_avg_ml,
            week.goat_avg_ml,
            week.cow_avg_ml,
            week.unknown_avg_ml,
        ] {
            print!(" {avg:>9.0}");
        }
        println!(" {:>9.0}", week.total_avg_ml);
    }
    println!();
}
