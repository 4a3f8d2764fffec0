//! CO2 Explorer - CO2 Emissions & GDP Explorer
//!
//! Desktop viewer for per-region emissions and GDP, one year at a time.

use anyhow::{Context, Result};
use co2_explorer::config::AppConfig;
use co2_explorer::data::DataLoader;
use co2_explorer::gui::ExplorerApp;
use eframe::egui;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // Optional JSON config as the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_json_file(&path)
            .with_context(|| format!("reading config {}", path))?,
        None => AppConfig::default(),
    };
    info!("emissions source: {}", config.emissions_url);
    info!("regions source: {}", config.regions_url);

    let loader = DataLoader::from_config(&config).context("creating HTTP client")?;

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("CO2 Explorer"),
        ..Default::default()
    };

    eframe::run_native(
        "CO2 Explorer",
        options,
        Box::new(|cc| Ok(Box::new(ExplorerApp::new(cc, config, loader)))),
    )
    .map_err(|e| anyhow::anyhow!("{}", e))
}
