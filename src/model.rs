use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Largest horizon the dashboard lets a user request.
pub const MAX_HORIZON_DAYS: u32 = 60;

/// Rows averaged per forecast point.
pub const FORECAST_WINDOW: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub store_id: String,
    pub product_family: String,
    pub sales: f64,
}

/// Read-only source table, loaded once and shared with every query.
#[derive(Debug, Default)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stores(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.store_id.as_str()).collect();
        set.into_iter().map(str::to_owned).collect()
    }

    pub fn families(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.product_family.as_str())
            .collect();
        set.into_iter().map(str::to_owned).collect()
    }

    /// Earliest and latest dates in the table, `None` when empty.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `None` drops the store predicate entirely.
    pub store_id: Option<String>,
    pub product_family: String,
    pub forecast_horizon_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

pub type Series = Vec<SeriesPoint>;

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    /// Nothing matched the filters (includes an inverted date range).
    EmptySelection,
    /// History shorter than the averaging window, every forecast value is missing.
    InsufficientHistory { historical: Series, forecast: Series },
    Computed { historical: Series, forecast: Series },
}

impl ForecastOutcome {
    pub fn historical(&self) -> &[SeriesPoint] {
        match self {
            ForecastOutcome::EmptySelection => &[],
            ForecastOutcome::InsufficientHistory { historical, .. }
            | ForecastOutcome::Computed { historical, .. } => historical,
        }
    }

    pub fn forecast(&self) -> &[SeriesPoint] {
        match self {
            ForecastOutcome::EmptySelection => &[],
            ForecastOutcome::InsufficientHistory { forecast, .. }
            | ForecastOutcome::Computed { forecast, .. } => forecast,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ForecastOutcome::EmptySelection)
    }
}

/// Both series in the shape the clipboard export writes.
#[derive(Debug, Serialize)]
pub struct SeriesExport<'a> {
    pub product_family: &'a str,
    pub store_id: Option<&'a str>,
    pub historical: &'a [SeriesPoint],
    pub forecast: &'a [SeriesPoint],
}

pub struct SeriesSummary {
    pub points: usize,
    pub total: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub peak: f64,
    pub peak_date: NaiveDate,
}
