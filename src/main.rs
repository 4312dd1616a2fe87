mod app;
mod color;
mod config;
mod data;
mod report;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::DashboardApp;
use clap::Parser;
use config::DashboardConfig;
use eframe::egui;
use state::AppState;

#[derive(Parser)]
#[command(name = "franchise-dashboard")]
#[command(about = "Revenue, service and product report for a restaurant franchise", long_about = None)]
struct Cli {
    /// Transaction table to load (.csv, .parquet or .json)
    data: Option<PathBuf>,

    /// JSON file with dashboard settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of products kept in the product chart
    #[arg(long)]
    top: Option<usize>,
}

impl Cli {
    /// Defaults, then the config file, then command-line flags.
    fn resolve_config(&self) -> anyhow::Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::from_file(path)?,
            None => DashboardConfig::default(),
        };
        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(top) = self.top {
            config.top_products = top;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let mut state = AppState::new(config.clone());
    state
        .load_path(&config.data_path)
        .with_context(|| format!("cannot start without {}", config.data_path.display()))?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Franchise Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}
