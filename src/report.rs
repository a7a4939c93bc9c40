use std::fmt;

use itertools::Itertools;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::stats::{CountryStats, RegionStats};

/// Attached to the positivity rate when it is at or below 5%.
pub const LOW_POSITIVITY_INDICATOR: &str = "✅";
const LOW_POSITIVITY_MILLIS: i64 = 50;
const NOT_AVAILABLE: &str = "n/a";

#[derive(Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("requested {expected} data but received {actual}")]
    RegionMismatch { expected: String, actual: String },
    #[error("population for {0} is missing or zero")]
    NoPopulation(String),
}

/// `1234567` -> `"1,234,567"`.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .join(",");
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `0.0512` -> `"5.12%"`.
pub fn percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

pub fn positivity(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => percent(r),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Empty unless the ratio, truncated to whole thousandths, is 50 or less.
pub fn positivity_indicator(ratio: Option<f64>) -> &'static str {
    match ratio {
        Some(r) if ((r * 1000.0).trunc() as i64) <= LOW_POSITIVITY_MILLIS => {
            LOW_POSITIVITY_INDICATOR
        }
        _ => "",
    }
}

fn per_100k(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub first_dose_ratio: f64,
    pub completed_ratio: f64,
}

impl DerivedMetrics {
    pub fn from_region(stats: &RegionStats) -> Result<Self, ReportError> {
        let population = match stats.population {
            Some(p) if p > 0 => p as f64,
            _ => return Err(ReportError::NoPopulation(stats.region.clone())),
        };
        Ok(DerivedMetrics {
            first_dose_ratio: stats.actuals.vaccinations_initiated as f64 / population,
            completed_ratio: stats.actuals.vaccinations_completed as f64 / population,
        })
    }
}

/// Label/value rows for the console report.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    pub rows: Vec<(&'static str, String)>,
}

impl Table {
    fn new(title: String) -> Self {
        Table {
            title,
            rows: Vec::new(),
        }
    }

    fn row(mut self, label: &'static str, value: impl Into<String>) -> Self {
        self.rows.push((label, value.into()));
        self
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_w = self
            .rows
            .iter()
            .map(|(l, _)| l.chars().count())
            .chain(std::iter::once("Type".len()))
            .max()
            .unwrap_or_default();
        let value_w = self
            .rows
            .iter()
            .map(|(_, v)| v.chars().count())
            .chain(std::iter::once("Data".len()))
            .max()
            .unwrap_or_default();
        let rule = format!("+-{}-+-{}-+", "-".repeat(label_w), "-".repeat(value_w));

        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "| {:<label_w$} | {:<value_w$} |", "Type", "Data")?;
        writeln!(f, "{}", rule)?;
        for (label, value) in &self.rows {
            writeln!(f, "| {:<label_w$} | {:<value_w$} |", label, value)?;
        }
        write!(f, "{}", rule)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub message: String,
    pub region_table: Table,
    pub country_table: Table,
}

impl Report {
    pub fn build(
        config: &Config,
        region: &RegionStats,
        country: &CountryStats,
    ) -> Result<Self, ReportError> {
        if region.region != config.region {
            return Err(ReportError::RegionMismatch {
                expected: config.region.clone(),
                actual: region.region.clone(),
            });
        }
        let derived = DerivedMetrics::from_region(region)?;

        let a = &region.actuals;
        let ratio = region.metrics.test_positivity_ratio;
        let indicator = positivity_indicator(ratio);
        let posrate = if indicator.is_empty() {
            positivity(ratio)
        } else {
            format!("{} {}", positivity(ratio), indicator)
        };
        let updated = region.last_updated_date.format("%Y-%m-%d").to_string();

        let mut message = String::new();
        message += &format!("\n24-hour #COVID19 data for #{}:\n", config.region_name);
        message += &format!("{} new cases\n", thousands(a.new_cases));
        message += &format!(
            "{} hospitalizations\n",
            thousands(a.hospital_beds.current_usage_covid)
        );
        message += &format!("{} deaths\n", thousands(a.new_deaths));
        message += &format!("{} total cases\n", thousands(a.cases));
        message += &format!("{} total deaths\n", thousands(a.deaths));
        message += &format!("{} state positivity rate\n", posrate);
        message += &format!(
            "{} weekly cases per 100k\n",
            per_100k(region.metrics.weekly_new_cases_per100k)
        );
        message += &format!(
            "{} ({}) fully vaccinated\n",
            thousands(a.vaccinations_completed),
            percent(derived.completed_ratio)
        );
        message += &format!("{} total US deaths\n\n", thousands(country.actuals.deaths));
        message += &format!("Last updated: {}\n", updated);

        let region_table = Table::new(format!("COVID-19 Statistics for {}", config.region))
            .row("New Cases", thousands(a.new_cases))
            .row("Hospitalizations", thousands(a.hospital_beds.current_usage_covid))
            .row("Total Cases", thousands(a.cases))
            .row("Deaths", thousands(a.new_deaths))
            .row("Total Deaths", thousands(a.deaths))
            .row("Positivity Rate", posrate)
            .row(
                "Weekly Cases per 100k",
                per_100k(region.metrics.weekly_new_cases_per100k),
            )
            .row("First Dose", thousands(a.vaccinations_initiated))
            .row("First Dose %", percent(derived.first_dose_ratio))
            .row("Second Dose", thousands(a.vaccinations_completed))
            .row("Second Dose %", percent(derived.completed_ratio))
            .row("Updated", updated);

        let c = &country.actuals;
        let country_table = Table::new("COVID-19 Statistics for US".to_string())
            .row("New Cases", thousands(c.new_cases))
            .row("Total Cases", thousands(c.cases))
            .row("Deaths", thousands(c.new_deaths))
            .row("Total Deaths", thousands(c.deaths));

        info!("Tweet created.");
        Ok(Report {
            message,
            region_table,
            country_table,
        })
    }
}
