mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use anyhow::Result;
use app::AirQualityApp;
use clap::Parser;
use config::Settings;
use data::loader::load_file;
use data::report::{build_report, DashboardReport};
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    let settings = Settings::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_level.as_str()),
    )
    .init();

    let mut state = AppState {
        top_n: settings.top,
        logo: settings.logo.clone(),
        ..AppState::default()
    };

    // A file named on the command line must load; without it there is
    // nothing to show.
    if let Some(path) = &settings.data {
        let table = load_file(path)?;
        if table.is_empty() {
            log::warn!("{} contains no readings", path.display());
        }
        let range = settings.initial_range(&table)?;

        if settings.summary {
            let report = match &range {
                Some(range) => build_report(&table, range, settings.top),
                None => DashboardReport::empty(settings.top),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        state.set_table(table, range);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Air Quality Dashboard",
        options,
        Box::new(move |cc| {
            // Install image loaders so the sidebar logo can be read from disk.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(AirQualityApp::new(state)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
