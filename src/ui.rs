use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use eframe::egui;
use egui::{Color32, Context, FontFamily, FontId, Margin, RichText, Stroke, Vec2, Visuals};
use egui_extras::{Column, DatePickerButton, TableBuilder};
use egui_plot::{Legend, Line, Plot, PlotPoints};
use tracing::{info, warn};

use crate::forecast;
use crate::model::{
    ForecastOutcome, QueryParams, SalesTable, SeriesExport, SeriesPoint, SeriesSummary,
    MAX_HORIZON_DAYS,
};
use crate::stats::summarize;

const SALES_LINE: Color32 = Color32::from_rgb(38, 139, 210);
const FORECAST_LINE: Color32 = Color32::from_rgb(203, 75, 22);
const ACCENT: Color32 = Color32::from_rgb(181, 137, 0);
const MUTED: Color32 = Color32::from_rgb(147, 161, 161);

pub fn set_custom_style(ctx: &Context) {
    // Solarized dark, matching the chart colors
    let mut visuals = Visuals::dark();

    visuals.panel_fill = Color32::from_rgb(0, 43, 54);
    visuals.window_fill = Color32::from_rgb(7, 54, 66);
    visuals.extreme_bg_color = Color32::from_rgb(7, 54, 66);
    visuals.faint_bg_color = Color32::from_rgb(0, 50, 62);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(7, 54, 66);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, Color32::from_rgb(88, 110, 117));

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(20, 70, 82);
    visuals.widgets.hovered.bg_stroke = Stroke::new(2.0, Color32::from_rgb(42, 161, 152));

    visuals.widgets.active.bg_fill = Color32::from_rgb(38, 139, 210);
    visuals.widgets.active.bg_stroke = Stroke::new(2.0, Color32::from_rgb(238, 232, 213));

    visuals.selection.bg_fill = Color32::from_rgb(38, 139, 210);
    visuals.selection.stroke = Stroke::new(1.0, Color32::from_rgb(238, 232, 213));

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = Margin::same(12);
    style.spacing.button_padding = egui::vec2(12.0, 8.0);

    style.text_styles.insert(
        egui::TextStyle::Body,
        FontId::new(15.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Heading,
        FontId::new(22.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Button,
        FontId::new(15.0, FontFamily::Proportional),
    );

    ctx.set_style(style);
}

pub struct SalesApp {
    table: Arc<SalesTable>,
    bounds: Option<(NaiveDate, NaiveDate)>,
    stores: Vec<String>,
    families: Vec<String>,

    // Query widgets
    start_date: NaiveDate,
    end_date: NaiveDate,
    store: Option<String>,
    family: String,
    horizon: u32,

    // Last submission
    submitted: Option<QueryParams>,
    outcome: Option<ForecastOutcome>,
    summary: Option<SeriesSummary>,
}

impl SalesApp {
    pub fn new(table: Arc<SalesTable>) -> Self {
        let today = Utc::now().date_naive();
        let bounds = table.date_bounds();
        let (start_date, end_date) = bounds.unwrap_or((today, today));
        let stores = table.stores();
        let families = table.families();
        let family = families.first().cloned().unwrap_or_default();

        Self {
            table,
            bounds,
            stores,
            families,
            start_date,
            end_date,
            store: None,
            family,
            horizon: 30,
            submitted: None,
            outcome: None,
            summary: None,
        }
    }

    /// Widget snapshot. Picked dates are held inside the data's date range.
    fn query_params(&self) -> QueryParams {
        let (mut start_date, mut end_date) = (self.start_date, self.end_date);
        if let Some((min, max)) = self.bounds {
            start_date = start_date.clamp(min, max);
            end_date = end_date.clamp(min, max);
        }

        QueryParams {
            start_date,
            end_date,
            store_id: self.store.clone(),
            product_family: self.family.clone(),
            forecast_horizon_days: self.horizon.clamp(1, MAX_HORIZON_DAYS),
        }
    }

    /// Runs the pipeline for the current widget state, replacing any earlier result.
    fn submit(&mut self) {
        let params = self.query_params();
        let outcome = forecast::run(&self.table, &params);

        info!(
            family = %params.product_family,
            store = ?params.store_id,
            history = outcome.historical().len(),
            forecast = outcome.forecast().len(),
            "query submitted"
        );

        self.summary = summarize(outcome.historical());
        self.outcome = Some(outcome);
        self.submitted = Some(params);
    }

    fn export_json(&self) -> Option<String> {
        let (params, outcome) = (self.submitted.as_ref()?, self.outcome.as_ref()?);
        let export = SeriesExport {
            product_family: &params.product_family,
            store_id: params.store_id.as_deref(),
            historical: outcome.historical(),
            forecast: outcome.forecast(),
        };

        match serde_json::to_string_pretty(&export) {
            Ok(json) => Some(json),
            Err(err) => {
                warn!(%err, "failed to serialize series");
                None
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("📅 Date Range").color(ACCENT));
            ui.add(DatePickerButton::new(&mut self.start_date).id_salt("start_date"));
            ui.label("to");
            ui.add(DatePickerButton::new(&mut self.end_date).id_salt("end_date"));

            ui.separator();

            ui.label(RichText::new("🏪 Store").color(ACCENT));
            let store_text = self.store.clone().unwrap_or_else(|| "All stores".into());
            egui::ComboBox::from_id_salt("store")
                .selected_text(store_text)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.store, None, "All stores");
                    for store in &self.stores {
                        ui.selectable_value(&mut self.store, Some(store.clone()), store.as_str());
                    }
                });

            ui.separator();

            ui.label(RichText::new("🛒 Product Family").color(ACCENT));
            egui::ComboBox::from_id_salt("family")
                .selected_text(self.family.as_str())
                .width(200.0)
                .show_ui(ui, |ui| {
                    for family in &self.families {
                        ui.selectable_value(&mut self.family, family.clone(), family.as_str());
                    }
                });

            ui.separator();

            ui.label(RichText::new("🔮 Horizon").color(ACCENT));
            ui.add(
                egui::DragValue::new(&mut self.horizon)
                    .range(1..=MAX_HORIZON_DAYS)
                    .suffix(" days"),
            );

            ui.separator();

            if ui
                .add_sized(
                    Vec2::new(100.0, 32.0),
                    egui::Button::new(RichText::new("Submit").strong()),
                )
                .clicked()
            {
                self.submit();
            }
        });
    }

    fn summary_panel(&self, ui: &mut egui::Ui) {
        ui.heading(RichText::new("Summary").color(ACCENT));
        ui.separator();

        let Some(summary) = &self.summary else {
            ui.label(RichText::new("No sales in selection").color(MUTED));
            return;
        };

        egui::Grid::new("summary_grid").num_columns(2).show(ui, |ui| {
            ui.label("Rows");
            ui.label(summary.points.to_string());
            ui.end_row();
            ui.label("Total");
            ui.label(format_sales(summary.total));
            ui.end_row();
            ui.label("Mean");
            ui.label(format_sales(summary.mean));
            ui.end_row();
            ui.label("Std dev");
            ui.label(format_sales(summary.std_dev));
            ui.end_row();
            ui.label("Peak");
            ui.label(format!("{} on {}", format_sales(summary.peak), summary.peak_date));
            ui.end_row();
        });
    }

    fn forecast_table(ui: &mut egui::Ui, forecast: &[SeriesPoint]) {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(true)
            .column(Column::exact(110.0))
            .column(Column::remainder().at_least(100.0))
            .header(24.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Date");
                });
                header.col(|ui| {
                    ui.strong("Forecast");
                });
            })
            .body(|body| {
                body.rows(22.0, forecast.len(), |mut row| {
                    let point = forecast[row.index()];
                    row.col(|ui| {
                        ui.label(point.date.to_string());
                    });
                    row.col(|ui| match point.value {
                        Some(v) => {
                            ui.label(format_sales(v));
                        }
                        None => {
                            ui.label(RichText::new("n/a").color(MUTED));
                        }
                    });
                });
            });
    }
}

impl eframe::App for SalesApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.vertical_centered(|ui| {
                ui.heading(
                    RichText::new("Sales Forecasting For Grocery Store")
                        .color(Color32::from_rgb(238, 232, 213))
                        .strong()
                        .size(28.0),
                );
            });
            ui.add_space(4.0);
            ui.separator();

            if self.table.is_empty() {
                ui.label(RichText::new("The sales table is empty").color(MUTED));
            } else {
                self.controls(ui);
            }
            ui.add_space(2.0);
        });

        if self.outcome.is_some() {
            egui::SidePanel::right("details")
                .min_width(260.0)
                .max_width(360.0)
                .show(ctx, |ui| {
                    self.summary_panel(ui);
                    ui.add_space(10.0);

                    if ui.button("📋 Copy series as JSON").clicked() {
                        if let Some(json) = self.export_json() {
                            ui.ctx().copy_text(json);
                        }
                    }

                    ui.add_space(10.0);
                    ui.heading(RichText::new("Forecast").color(ACCENT));
                    ui.separator();
                    if let Some(outcome) = &self.outcome {
                        Self::forecast_table(ui, outcome.forecast());
                    }
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(outcome) = &self.outcome else {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new("Pick a date range and product family, then press Submit")
                            .size(18.0)
                            .color(MUTED),
                    );
                });
                return;
            };

            let title = match &self.submitted {
                Some(params) => format!("Sales of {} family", params.product_family),
                None => "Sales".to_string(),
            };
            ui.label(RichText::new(title).size(20.0).strong());

            match outcome {
                ForecastOutcome::EmptySelection => {
                    ui.label(RichText::new("No sales match this selection").color(MUTED));
                }
                ForecastOutcome::InsufficientHistory { .. } => {
                    ui.label(
                        RichText::new(
                            "Not enough history for a 7 day average, forecast values are unavailable",
                        )
                        .color(MUTED),
                    );
                }
                ForecastOutcome::Computed { .. } => {}
            }

            sales_plot(ui, outcome);
        });
    }
}

fn sales_plot(ui: &mut egui::Ui, outcome: &ForecastOutcome) {
    Plot::new("sales_plot")
        .legend(Legend::default())
        .show_grid(false)
        .x_axis_label("Date")
        .y_axis_label("Sales")
        .x_axis_formatter(|mark, _range| {
            NaiveDate::from_num_days_from_ce_opt(mark.value.round() as i32)
                .map(|d| d.to_string())
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new("Sales", plot_points(outcome.historical()))
                    .color(SALES_LINE)
                    .width(4.0),
            );
            plot_ui.line(
                Line::new("Forecast", plot_points(outcome.forecast()))
                    .color(FORECAST_LINE)
                    .width(3.0),
            );
        });
}

/// Missing values are left out of the line.
fn plot_points(series: &[SeriesPoint]) -> PlotPoints<'static> {
    series
        .iter()
        .filter_map(|p| p.value.map(|v| [p.date.num_days_from_ce() as f64, v]))
        .collect::<Vec<_>>()
        .into()
}

fn format_sales(value: f64) -> String {
    if value.abs() >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value.abs() >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SalesRecord;

    fn table() -> Arc<SalesTable> {
        let base = NaiveDate::from_ymd_opt(2017, 6, 1).unwrap();
        let mut records = Vec::new();
        for i in 0..10 {
            for (store, family) in [("3", "DAIRY"), ("7", "CLEANING")] {
                records.push(SalesRecord {
                    date: base + chrono::Duration::days(i),
                    store_id: store.to_string(),
                    product_family: family.to_string(),
                    sales: (i + 1) as f64,
                });
            }
        }
        Arc::new(SalesTable::new(records))
    }

    #[test]
    fn defaults_follow_the_table() {
        let app = SalesApp::new(table());
        assert_eq!(app.start_date, NaiveDate::from_ymd_opt(2017, 6, 1).unwrap());
        assert_eq!(app.end_date, NaiveDate::from_ymd_opt(2017, 6, 10).unwrap());
        assert_eq!(app.family, "CLEANING");
        assert_eq!(app.store, None);
        assert!(app.outcome.is_none());
    }

    #[test]
    fn submit_replaces_previous_outcome() {
        let mut app = SalesApp::new(table());
        app.horizon = 3;
        app.submit();
        assert_eq!(app.outcome.as_ref().unwrap().forecast().len(), 3);
        assert_eq!(app.summary.as_ref().unwrap().points, 10);

        app.family = "PRODUCE".to_string();
        app.submit();
        assert!(app.outcome.as_ref().unwrap().is_empty());
        assert!(app.summary.is_none());
    }

    #[test]
    fn horizon_is_clamped_before_running() {
        let mut app = SalesApp::new(table());
        app.horizon = 500;
        assert_eq!(app.query_params().forecast_horizon_days, MAX_HORIZON_DAYS);
        app.horizon = 0;
        assert_eq!(app.query_params().forecast_horizon_days, 1);
    }

    #[test]
    fn picked_dates_are_held_inside_the_data() {
        let mut app = SalesApp::new(table());
        app.start_date = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        app.end_date = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap();

        let params = app.query_params();
        assert_eq!(params.start_date, NaiveDate::from_ymd_opt(2017, 6, 1).unwrap());
        assert_eq!(params.end_date, NaiveDate::from_ymd_opt(2017, 6, 10).unwrap());

        app.start_date = NaiveDate::from_ymd_opt(2017, 6, 4).unwrap();
        app.end_date = NaiveDate::from_ymd_opt(2017, 6, 6).unwrap();
        let params = app.query_params();
        assert_eq!(params.start_date, app.start_date);
        assert_eq!(params.end_date, app.end_date);
    }

    #[test]
    fn insufficient_history_keeps_missing_forecast_points() {
        let mut app = SalesApp::new(table());
        app.end_date = NaiveDate::from_ymd_opt(2017, 6, 3).unwrap();
        app.horizon = 5;
        app.submit();

        let outcome = app.outcome.as_ref().unwrap();
        assert!(matches!(outcome, ForecastOutcome::InsufficientHistory { .. }));
        assert_eq!(outcome.forecast().len(), 3);
        assert!(outcome.forecast().iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn export_contains_both_series() {
        let mut app = SalesApp::new(table());
        assert!(app.export_json().is_none());

        app.store = Some("7".to_string());
        app.horizon = 2;
        app.submit();
        let json: serde_json::Value = serde_json::from_str(&app.export_json().unwrap()).unwrap();

        assert_eq!(json["product_family"], "CLEANING");
        assert_eq!(json["store_id"], "7");
        assert_eq!(json["historical"].as_array().unwrap().len(), 10);
        assert_eq!(json["forecast"].as_array().unwrap().len(), 2);
        assert_eq!(json["forecast"][0]["date"], "2017-06-10");
    }

    #[test]
    fn missing_values_are_not_plotted() {
        let date = NaiveDate::from_ymd_opt(2017, 6, 1).unwrap();
        let points = plot_points(&[
            SeriesPoint { date, value: None },
            SeriesPoint { date, value: Some(2.0) },
        ]);
        assert_eq!(points.points().len(), 1);
    }

    #[test]
    fn sales_are_abbreviated() {
        assert_eq!(format_sales(12.345), "12.35");
        assert_eq!(format_sales(2_500.0), "2.5K");
        assert_eq!(format_sales(3_250_000.0), "3.25M");
    }
}
