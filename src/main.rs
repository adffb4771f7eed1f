mod config;
mod forecast;
mod loader;
mod model;
mod stats;
mod ui;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use ui::SalesApp;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sales_forecast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let table = loader::load_table(&config.data, &config.table)
        .with_context(|| format!("failed to load sales data from {}", config.data.display()))?;
    let table = Arc::new(table);

    info!(
        rows = table.len(),
        stores = table.stores().len(),
        families = table.families().len(),
        "starting dashboard"
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Forecast",
        options,
        Box::new(move |cc| {
            ui::set_custom_style(&cc.egui_ctx);
            Ok(Box::new(SalesApp::new(table)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("dashboard exited with error: {err}"))
}
