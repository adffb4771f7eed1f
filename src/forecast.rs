use chrono::Duration;
use tracing::debug;

use crate::model::{
    ForecastOutcome, QueryParams, SalesRecord, SalesTable, Series, SeriesPoint, FORECAST_WINDOW,
};
use crate::stats::rolling_mean;

/// Filters the table for `params` and projects a naive forecast from the result.
pub fn run(table: &SalesTable, params: &QueryParams) -> ForecastOutcome {
    if params.start_date > params.end_date {
        debug!(
            start = %params.start_date,
            end = %params.end_date,
            "inverted date range, returning empty selection"
        );
        return ForecastOutcome::EmptySelection;
    }

    let rows = filter_rows(table, params);
    if rows.is_empty() {
        debug!(family = %params.product_family, store = ?params.store_id, "no rows matched");
        return ForecastOutcome::EmptySelection;
    }

    let historical: Series = rows
        .iter()
        .map(|r| SeriesPoint { date: r.date, value: Some(r.sales) })
        .collect();
    let forecast = naive_forecast(&rows, params.forecast_horizon_days as usize);

    debug!(
        family = %params.product_family,
        store = ?params.store_id,
        history = historical.len(),
        forecast = forecast.len(),
        "forecast computed"
    );

    if rows.len() < FORECAST_WINDOW {
        ForecastOutcome::InsufficientHistory { historical, forecast }
    } else {
        ForecastOutcome::Computed { historical, forecast }
    }
}

/// Matching rows in ascending date order. Ties keep source order.
fn filter_rows<'a>(table: &'a SalesTable, params: &QueryParams) -> Vec<&'a SalesRecord> {
    let mut rows: Vec<&SalesRecord> = table
        .records()
        .iter()
        .filter(|r| r.date >= params.start_date && r.date <= params.end_date)
        .filter(|r| match &params.store_id {
            Some(store) => &r.store_id == store,
            None => true,
        })
        .filter(|r| r.product_family == params.product_family)
        .collect();

    rows.sort_by_key(|r| r.date);
    rows
}

fn naive_forecast(rows: &[&SalesRecord], horizon: usize) -> Series {
    let Some(last_date) = rows.iter().map(|r| r.date).max() else {
        return Vec::new();
    };

    let sales: Vec<f64> = rows.iter().map(|r| r.sales).collect();
    let averaged = rolling_mean(&sales, FORECAST_WINDOW);

    let take = horizon.min(rows.len());
    let start = rows.len() - take;
    let mut tail: Vec<_> = rows[start..]
        .iter()
        .zip(&averaged[start..])
        .map(|(r, v)| (r.date, *v))
        .collect();
    tail.sort_by_key(|(date, _)| *date);

    // The first forecast date repeats the last observed one so both lines meet.
    tail.into_iter()
        .enumerate()
        .map(|(offset, (_, value))| SeriesPoint {
            date: last_date + Duration::days(offset as i64),
            value,
        })
        .collect()
}
